//! Game entities mirrored from the backend.
//!
//! The client never owns the lifecycle of these records: every struct here
//! is the latest copy the backend returned, deserialized as-is. Field names
//! match the backend JSON exactly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Money, MONTH_NAMES};

// ---------------------------------------------------------------------------
// Snapshot entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vineyard {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub name: String,
    pub varietal: String,
    pub region: String,
    #[serde(default = "default_size_acres")]
    pub size_acres: i32,
    #[serde(default = "default_age_of_vines")]
    pub age_of_vines: i32,
    #[serde(default = "default_soil_type")]
    pub soil_type: String,
    #[serde(default = "default_health")]
    pub health: i32,
    #[serde(default)]
    pub grapes_ready: bool,
    #[serde(default)]
    pub harvested_this_year: bool,
}

impl Vineyard {
    /// Grapes are ripe and this year's crop has not been picked yet.
    pub fn can_harvest(&self) -> bool {
        self.grapes_ready && !self.harvested_this_year
    }
}

fn default_size_acres() -> i32 {
    5
}

fn default_age_of_vines() -> i32 {
    5
}

fn default_soil_type() -> String {
    "mixed".to_string()
}

fn default_health() -> i32 {
    80
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineryVessel {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(rename = "type")]
    pub vessel_type: String,
    /// Liters.
    pub capacity: i32,
    #[serde(default)]
    pub in_use: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grape {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub varietal: String,
    pub vintage: i32,
    pub quantity_kg: f64,
    pub quality: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Must {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub varietal: String,
    pub vintage: i32,
    pub quantity_kg: f64,
    pub quality: i32,
    pub processing_method: String,
    pub destem_crush_method: String,
    #[serde(default)]
    pub fermented: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStage {
    Fermenting,
    Aging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineInProduction {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub varietal: String,
    pub vintage: i32,
    pub quantity_liters: f64,
    pub quality: i32,
    pub vessel_type: String,
    /// Position in `Winery::vessels` at the time the batch was started.
    pub vessel_index: usize,
    pub stage: ProductionStage,
    #[serde(default)]
    pub fermentation_progress: i32,
    #[serde(default)]
    pub aging_progress: i32,
    #[serde(default)]
    pub aging_duration: i32,
    #[serde(default)]
    pub maceration_actions_taken: i32,
}

impl WineInProduction {
    pub fn fermentation_complete(&self) -> bool {
        self.fermentation_progress >= 100
    }

    pub fn ready_to_bottle(&self) -> bool {
        self.stage == ProductionStage::Aging && self.aging_progress >= self.aging_duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winery {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default = "default_winery_name")]
    pub name: String,
    #[serde(default)]
    pub vessels: Vec<WineryVessel>,
    #[serde(default)]
    pub must_in_production: Vec<Must>,
    #[serde(default)]
    pub wines_fermenting: Vec<WineInProduction>,
    #[serde(default)]
    pub wines_aging: Vec<WineInProduction>,
}

fn default_winery_name() -> String {
    "Main Winery".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wine {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub name: String,
    pub vintage: i32,
    pub varietal: String,
    pub style: String,
    pub quality: i32,
    pub bottles: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default = "default_player_name")]
    pub name: String,
    pub money: Money,
    #[serde(default = "default_reputation")]
    pub reputation: i32,
    #[serde(default)]
    pub vineyards: Vec<Vineyard>,
    #[serde(default)]
    pub winery: Option<Winery>,
    #[serde(default)]
    pub grapes_inventory: Vec<Grape>,
    #[serde(default)]
    pub bottled_wines: Vec<Wine>,
}

fn default_player_name() -> String {
    "Winemaker".to_string()
}

fn default_reputation() -> i32 {
    50
}

impl Player {
    pub fn total_grapes_kg(&self) -> f64 {
        self.grapes_inventory.iter().map(|g| g.quantity_kg).sum()
    }

    /// Bottles across every wine still on hand.
    pub fn total_bottles(&self) -> i64 {
        self.bottled_wines
            .iter()
            .map(|w| i64::from(w.bottles.max(0)))
            .sum()
    }

    /// Wines that should be shown to the player (empty lots are hidden).
    pub fn wines_in_stock(&self) -> impl Iterator<Item = &Wine> {
        self.bottled_wines.iter().filter(|w| w.bottles > 0)
    }
}

/// Root snapshot returned by `GET /` and `POST /advance_month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub player: Player,
    pub current_year: i32,
    pub current_month_index: usize,
    #[serde(default)]
    pub months: Vec<String>,
}

impl GameState {
    pub fn current_month(&self) -> &str {
        self.months
            .get(self.current_month_index)
            .map(String::as_str)
            .or_else(|| MONTH_NAMES.get(self.current_month_index).copied())
            .unwrap_or("Unknown")
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionData {
    #[serde(default)]
    pub climate: Option<String>,
    #[serde(default)]
    pub soil_types: Vec<String>,
    pub grape_varietals: Vec<String>,
    pub base_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselTypeData {
    pub capacity: i32,
    pub cost: Money,
    /// Slash-separated uses, e.g. `fermentation/aging`.
    #[serde(rename = "type")]
    pub usage: String,
}

impl VesselTypeData {
    pub fn supports_fermentation(&self) -> bool {
        self.usage.contains("fermentation")
    }

    pub fn supports_aging(&self) -> bool {
        self.usage.contains("aging")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrapeCharacteristics {
    pub color: String,
    #[serde(default)]
    pub ripening_month: Option<i32>,
    #[serde(default)]
    pub base_quality: Option<i32>,
}

pub type Regions = IndexMap<String, RegionData>;
pub type VesselTypes = IndexMap<String, VesselTypeData>;
pub type GrapeCatalog = IndexMap<String, GrapeCharacteristics>;

/// Reference data the option lists are rendered from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub regions: Regions,
    pub vessel_types: VesselTypes,
    pub grape_characteristics: GrapeCatalog,
}
