//! Request and response bodies for the backend action endpoints.

use serde::{Deserialize, Serialize};

use crate::models::{GameState, Vineyard};
use crate::types::{EntityId, Money};

// ---------------------------------------------------------------------------
// Typed choices
// ---------------------------------------------------------------------------

/// Whether grapes are hand-sorted before processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortChoice {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestemCrushMethod {
    #[serde(rename = "Whole Cluster")]
    WholeCluster,
    #[serde(rename = "Partial Destem")]
    PartialDestem,
    #[serde(rename = "Destemmed/Crushed")]
    DestemmedCrushed,
}

impl DestemCrushMethod {
    pub const ALL: [DestemCrushMethod; 3] = [
        Self::WholeCluster,
        Self::PartialDestem,
        Self::DestemmedCrushed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::WholeCluster => "Whole Cluster",
            Self::PartialDestem => "Partial Destem",
            Self::DestemmedCrushed => "Destemmed/Crushed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacerationAction {
    PunchDown,
    PumpOver,
}

impl MacerationAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::PunchDown => "punch-down",
            Self::PumpOver => "pump-over",
        }
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyVineyardRequest {
    pub region: String,
    pub varietal: String,
    pub vineyard_name: String,
}

/// Body shared by `tend_vineyard` and `harvest_grapes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VineyardNameRequest {
    pub vineyard_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyVesselRequest {
    pub vessel_type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessGrapesRequest {
    pub grape_index: usize,
    pub sort_choice: SortChoice,
    pub destem_crush_method: DestemCrushMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartFermentationRequest {
    pub must_index: usize,
    pub vessel_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacerationRequest {
    pub wine_prod_index: usize,
    pub action_type: MacerationAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartAgingRequest {
    pub wine_prod_index: usize,
    pub vessel_index: usize,
    /// Months.
    pub aging_duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BottleWineRequest {
    pub wine_prod_index: usize,
    pub wine_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellWineRequest {
    pub wine_id: EntityId,
    pub bottles: u32,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Snapshot after a month has passed, with an optional narrative event
/// (weather, market news) to show the player.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceMonthResponse {
    #[serde(flatten)]
    pub state: GameState,
    #[serde(default)]
    pub event_message: Option<String>,
}

/// The backend either echoes the new vineyard with the player's balance or
/// returns the whole snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BuyVineyardResponse {
    Patch {
        new_vineyard: Vineyard,
        updated_money: Money,
    },
    Snapshot(GameState),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SellWineResponse {
    pub sold_wine_id: EntityId,
    pub bottles_remaining: i32,
    pub updated_money: Money,
}

/// Error payload of a non-2xx response. The backend uses `detail` for
/// validation failures and `message` from its generic exception handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// The human-readable message, if the body carried one.
    pub fn into_message(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s),
            Some(serde_json::Value::Null) | None => {}
            Some(other) => return Some(other.to_string()),
        }
        self.message.filter(|m| !m.is_empty())
    }
}
