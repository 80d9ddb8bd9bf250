//! Per-action selection state.
//!
//! Each form holds what the player picked plus an inline error string, and
//! turns the selection into a request body against the cached snapshot.
//! The backend addresses grapes, musts and production batches by their
//! position in its arrays; the id -> position translation lives here and
//! nowhere else, and an id missing from the cache is rejected rather than
//! guessed.

use crate::error::CoreError;
use crate::models::{GameState, Player, WineInProduction, Winery};
use crate::requests::{
    BottleWineRequest, BuyVesselRequest, BuyVineyardRequest, DestemCrushMethod, MacerationAction,
    MacerationRequest, ProcessGrapesRequest, SellWineRequest, SortChoice, StartAgingRequest,
    StartFermentationRequest, VineyardNameRequest,
};
use crate::store::GameStore;
use crate::types::{EntityId, Money};

/// Longest aging period the player may request, in months.
pub const MAX_AGING_MONTHS: u32 = 120;

pub trait Form {
    type Request;

    /// Clear the selection and the inline error.
    fn reset(&mut self);

    fn error(&self) -> Option<&str>;

    fn set_error(&mut self, message: Option<String>);

    /// Build the request body from the current selection.
    fn validate(&self, store: &GameStore) -> Result<Self::Request, CoreError>;

    fn open(&mut self) {
        self.reset();
    }

    fn close(&mut self) {
        self.reset();
    }
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

fn loaded(store: &GameStore) -> Result<&GameState, CoreError> {
    store
        .state()
        .ok_or_else(|| CoreError::Validation("Game state is not loaded".into()))
}

fn winery(player: &Player) -> Result<&Winery, CoreError> {
    player
        .winery
        .as_ref()
        .ok_or_else(|| CoreError::Validation("You do not own a winery".into()))
}

fn required<T: Clone>(value: &Option<T>, what: &str) -> Result<T, CoreError> {
    value
        .clone()
        .ok_or_else(|| CoreError::Validation(format!("Select {what}")))
}

fn required_text(value: &str, what: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("Enter {what}")));
    }
    Ok(trimmed.to_string())
}

/// Position of the entity with `id` in the cached array.
pub fn position_of<T>(
    items: &[T],
    id: EntityId,
    entity: &'static str,
    id_of: impl Fn(&T) -> Option<EntityId>,
) -> Result<usize, CoreError> {
    items
        .iter()
        .position(|item| id_of(item) == Some(id))
        .ok_or(CoreError::NotFound { entity, id })
}

fn batch_position(
    batches: &[WineInProduction],
    id: EntityId,
) -> Result<usize, CoreError> {
    position_of(batches, id, "Wine in production", |b| b.id)
}

fn vineyard_name(store: &GameStore, name: &Option<String>) -> Result<String, CoreError> {
    let name = required(name, "a vineyard")?;
    let state = loaded(store)?;
    if !state.player.vineyards.iter().any(|v| v.name == name) {
        return Err(CoreError::Validation(format!("You do not own a vineyard named {name}")));
    }
    Ok(name)
}

// ---------------------------------------------------------------------------
// Buy vineyard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuyVineyardForm {
    pub region: Option<String>,
    pub varietal: Option<String>,
    pub vineyard_name: String,
    pub error: Option<String>,
}

impl BuyVineyardForm {
    /// Pick a region/varietal pair from the reference data.
    pub fn select(
        &mut self,
        store: &GameStore,
        region: &str,
        varietal: &str,
    ) -> Result<(), CoreError> {
        let data = store
            .reference()
            .regions
            .get(region)
            .ok_or_else(|| CoreError::Validation(format!("Unknown region {region}")))?;
        if !data.grape_varietals.iter().any(|v| v == varietal) {
            return Err(CoreError::Validation(format!(
                "{varietal} is not grown in {region}"
            )));
        }
        self.region = Some(region.to_string());
        self.varietal = Some(varietal.to_string());
        Ok(())
    }

    /// Non-binding price shown before purchase: the region's base cost.
    /// The amount actually charged is decided by the backend.
    pub fn estimated_cost(&self, store: &GameStore) -> Option<Money> {
        let region = self.region.as_deref()?;
        store.reference().regions.get(region).map(|r| r.base_cost)
    }
}

impl Form for BuyVineyardForm {
    type Request = BuyVineyardRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<BuyVineyardRequest, CoreError> {
        let region = required(&self.region, "a vineyard type")?;
        let varietal = required(&self.varietal, "a vineyard type")?;
        let vineyard_name = required_text(&self.vineyard_name, "a name for your new vineyard")?;
        let state = loaded(store)?;
        if state.player.vineyards.iter().any(|v| v.name == vineyard_name) {
            return Err(CoreError::Validation(format!(
                "You already own a vineyard named {vineyard_name}"
            )));
        }
        Ok(BuyVineyardRequest {
            region,
            varietal,
            vineyard_name,
        })
    }
}

// ---------------------------------------------------------------------------
// Tend / harvest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TendVineyardForm {
    pub vineyard_name: Option<String>,
    pub error: Option<String>,
}

impl Form for TendVineyardForm {
    type Request = VineyardNameRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<VineyardNameRequest, CoreError> {
        Ok(VineyardNameRequest {
            vineyard_name: vineyard_name(store, &self.vineyard_name)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestGrapesForm {
    pub vineyard_name: Option<String>,
    pub error: Option<String>,
}

impl Form for HarvestGrapesForm {
    type Request = VineyardNameRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<VineyardNameRequest, CoreError> {
        let name = vineyard_name(store, &self.vineyard_name)?;
        let ready = loaded(store)?
            .player
            .vineyards
            .iter()
            .any(|v| v.name == name && v.can_harvest());
        if !ready {
            return Err(CoreError::Validation(format!(
                "{name} is not ready for harvest"
            )));
        }
        Ok(VineyardNameRequest {
            vineyard_name: name,
        })
    }
}

// ---------------------------------------------------------------------------
// Buy vessel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuyVesselForm {
    pub vessel_type: Option<String>,
    pub error: Option<String>,
}

impl BuyVesselForm {
    pub fn cost(&self, store: &GameStore) -> Option<Money> {
        let name = self.vessel_type.as_deref()?;
        store.reference().vessel_types.get(name).map(|v| v.cost)
    }
}

impl Form for BuyVesselForm {
    type Request = BuyVesselRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<BuyVesselRequest, CoreError> {
        let vessel_type_name = required(&self.vessel_type, "a vessel type")?;
        if !store
            .reference()
            .vessel_types
            .contains_key(&vessel_type_name)
        {
            return Err(CoreError::Validation(format!(
                "Unknown vessel type {vessel_type_name}"
            )));
        }
        Ok(BuyVesselRequest { vessel_type_name })
    }
}

// ---------------------------------------------------------------------------
// Process grapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessGrapesForm {
    pub grape_id: Option<EntityId>,
    pub sort_choice: Option<SortChoice>,
    pub destem_crush_method: Option<DestemCrushMethod>,
    pub error: Option<String>,
}

impl Form for ProcessGrapesForm {
    type Request = ProcessGrapesRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<ProcessGrapesRequest, CoreError> {
        let grape_id = required(&self.grape_id, "a grape lot")?;
        let sort_choice = required(&self.sort_choice, "whether to sort")?;
        let destem_crush_method = required(&self.destem_crush_method, "a destem/crush method")?;
        let player = &loaded(store)?.player;
        let grape_index = position_of(&player.grapes_inventory, grape_id, "Grape", |g| g.id)?;
        Ok(ProcessGrapesRequest {
            grape_index,
            sort_choice,
            destem_crush_method,
        })
    }
}

// ---------------------------------------------------------------------------
// Start fermentation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartFermentationForm {
    pub must_id: Option<EntityId>,
    pub vessel_index: Option<usize>,
    pub error: Option<String>,
}

impl Form for StartFermentationForm {
    type Request = StartFermentationRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<StartFermentationRequest, CoreError> {
        let must_id = required(&self.must_id, "a must")?;
        let vessel_index = required(&self.vessel_index, "a vessel")?;
        let winery = winery(&loaded(store)?.player)?;
        let must_index = position_of(&winery.must_in_production, must_id, "Must", |m| m.id)?;

        let vessel = winery
            .vessels
            .get(vessel_index)
            .ok_or_else(|| CoreError::Validation(format!("No vessel #{}", vessel_index + 1)))?;
        if vessel.in_use {
            return Err(CoreError::Validation(format!(
                "{} #{} is already in use",
                vessel.vessel_type,
                vessel_index + 1
            )));
        }
        if let Some(kind) = store.reference().vessel_types.get(&vessel.vessel_type) {
            if !kind.supports_fermentation() {
                return Err(CoreError::Validation(format!(
                    "{} cannot be used for fermentation",
                    vessel.vessel_type
                )));
            }
        }

        Ok(StartFermentationRequest {
            must_index,
            vessel_index,
        })
    }
}

// ---------------------------------------------------------------------------
// Maceration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacerationForm {
    /// Id of a batch in `wines_fermenting`.
    pub batch_id: Option<EntityId>,
    pub action: Option<MacerationAction>,
    pub error: Option<String>,
}

impl Form for MacerationForm {
    type Request = MacerationRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<MacerationRequest, CoreError> {
        let batch_id = required(&self.batch_id, "a fermenting batch")?;
        let action_type = required(&self.action, "a maceration action")?;
        let winery = winery(&loaded(store)?.player)?;
        let wine_prod_index = batch_position(&winery.wines_fermenting, batch_id)?;

        let batch = &winery.wines_fermenting[wine_prod_index];
        if let Some(grape) = store.reference().grape_characteristics.get(&batch.varietal) {
            if grape.color != "red" {
                return Err(CoreError::Validation(format!(
                    "Maceration only applies to red wines, {} is {}",
                    batch.varietal, grape.color
                )));
            }
        }

        Ok(MacerationRequest {
            wine_prod_index,
            action_type,
        })
    }
}

// ---------------------------------------------------------------------------
// Start aging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartAgingForm {
    /// Id of a batch in `wines_fermenting`.
    pub batch_id: Option<EntityId>,
    pub vessel_index: Option<usize>,
    pub aging_months: Option<u32>,
    pub error: Option<String>,
}

impl Form for StartAgingForm {
    type Request = StartAgingRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<StartAgingRequest, CoreError> {
        let batch_id = required(&self.batch_id, "a fermenting batch")?;
        let vessel_index = required(&self.vessel_index, "a vessel")?;
        let aging_duration = required(&self.aging_months, "an aging duration")?;
        if aging_duration == 0 || aging_duration > MAX_AGING_MONTHS {
            return Err(CoreError::Validation(format!(
                "Aging duration must be between 1 and {MAX_AGING_MONTHS} months"
            )));
        }

        let winery = winery(&loaded(store)?.player)?;
        let wine_prod_index = batch_position(&winery.wines_fermenting, batch_id)?;
        if !winery.wines_fermenting[wine_prod_index].fermentation_complete() {
            return Err(CoreError::Validation(
                "Fermentation has not finished yet".into(),
            ));
        }

        let vessel = winery
            .vessels
            .get(vessel_index)
            .ok_or_else(|| CoreError::Validation(format!("No vessel #{}", vessel_index + 1)))?;
        if vessel.in_use {
            return Err(CoreError::Validation(format!(
                "{} #{} is already in use",
                vessel.vessel_type,
                vessel_index + 1
            )));
        }

        Ok(StartAgingRequest {
            wine_prod_index,
            vessel_index,
            aging_duration,
        })
    }
}

// ---------------------------------------------------------------------------
// Bottle wine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BottleWineForm {
    /// Id of a batch in `wines_aging`.
    pub batch_id: Option<EntityId>,
    pub wine_name: String,
    pub error: Option<String>,
}

impl Form for BottleWineForm {
    type Request = BottleWineRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<BottleWineRequest, CoreError> {
        let batch_id = required(&self.batch_id, "an aging batch")?;
        let wine_name = required_text(&self.wine_name, "a name for the wine")?;
        let winery = winery(&loaded(store)?.player)?;
        let wine_prod_index = batch_position(&winery.wines_aging, batch_id)?;
        Ok(BottleWineRequest {
            wine_prod_index,
            wine_name,
        })
    }
}

// ---------------------------------------------------------------------------
// Sell wine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SellWineForm {
    pub wine_id: Option<EntityId>,
    pub bottles: u32,
    pub error: Option<String>,
}

impl Default for SellWineForm {
    fn default() -> Self {
        Self {
            wine_id: None,
            bottles: 1,
            error: None,
        }
    }
}

impl Form for SellWineForm {
    type Request = SellWineRequest;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn validate(&self, store: &GameStore) -> Result<SellWineRequest, CoreError> {
        let wine_id = required(&self.wine_id, "a wine")?;
        let player = &loaded(store)?.player;
        let wine = player
            .wines_in_stock()
            .find(|w| w.id == Some(wine_id))
            .ok_or(CoreError::NotFound {
                entity: "Wine",
                id: wine_id,
            })?;
        let available = u32::try_from(wine.bottles).unwrap_or(0);
        if self.bottles == 0 || self.bottles > available {
            return Err(CoreError::Validation(format!(
                "You can sell between 1 and {available} bottles of {}",
                wine.name
            )));
        }
        Ok(SellWineRequest {
            wine_id,
            bottles: self.bottles,
        })
    }
}

// ---------------------------------------------------------------------------
// FormSet
// ---------------------------------------------------------------------------

/// Selection state for every action the player can take.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSet {
    pub buy_vineyard: BuyVineyardForm,
    pub tend_vineyard: TendVineyardForm,
    pub harvest_grapes: HarvestGrapesForm,
    pub buy_vessel: BuyVesselForm,
    pub process_grapes: ProcessGrapesForm,
    pub start_fermentation: StartFermentationForm,
    pub maceration: MacerationForm,
    pub start_aging: StartAgingForm,
    pub bottle_wine: BottleWineForm,
    pub sell_wine: SellWineForm,
}

impl FormSet {
    pub fn reset_all(&mut self) {
        *self = Self::default();
    }
}
