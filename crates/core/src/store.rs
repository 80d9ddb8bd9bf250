//! The authoritative client-side state container.
//!
//! Every change to the cached snapshot goes through [`GameStore::apply`]
//! with an explicit [`Transition`]. A failed backend call produces no
//! transition, so the previously good snapshot is left exactly as it was.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::CoreError;
use crate::models::{GameState, Player, ReferenceData, Vineyard};
use crate::types::{EntityId, Money};

/// Shown on the login view after the backend rejects the stored token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Unauthorized. Please log in.";

// ---------------------------------------------------------------------------
// View / notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Loading,
    Game,
    /// Initial load failed; the main view cannot be rendered.
    LoadFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    /// Narrative message from the simulation, e.g. weather damage.
    Event,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Busy flag
// ---------------------------------------------------------------------------

/// Shared "an action is in flight" flag.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark an action as in flight. The flag is released when the guard is
    /// dropped, including when the owning future is cancelled.
    pub fn try_acquire(&self) -> Result<BusyGuard, CoreError> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CoreError::Busy)?;
        Ok(BusyGuard(Arc::clone(&self.0)))
    }
}

#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Transition {
    LoadStarted,
    /// Snapshot and reference data fetched together.
    InitialDataLoaded {
        state: GameState,
        reference: ReferenceData,
    },
    LoadFailed(String),
    LoginFailed(String),
    SnapshotReplaced(GameState),
    VineyardPurchased {
        vineyard: Vineyard,
        updated_money: Money,
    },
    WineSold {
        sold_wine_id: EntityId,
        bottles_remaining: i32,
        updated_money: Money,
    },
    /// The backend answered 401.
    SessionExpired,
    LoggedOut,
}

// ---------------------------------------------------------------------------
// GameStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GameStore {
    view: View,
    state: Option<GameState>,
    reference: ReferenceData,
    login_error: Option<String>,
    load_error: Option<String>,
    notices: Vec<Notice>,
    busy: BusyFlag,
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore {
    pub fn new() -> Self {
        Self {
            view: View::Login,
            state: None,
            reference: ReferenceData::default(),
            login_error: None,
            load_error: None,
            notices: Vec::new(),
            busy: BusyFlag::default(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub fn player(&self) -> Option<&Player> {
        self.state.as_ref().map(|s| &s.player)
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn login_error(&self) -> Option<&str> {
        self.login_error.as_deref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn busy(&self) -> &BusyFlag {
        &self.busy
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notices.push(Notice {
            kind,
            message: message.into(),
        });
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Apply a transition. Patch transitions need a cached snapshot; without
    /// one they fail and nothing changes.
    pub fn apply(&mut self, transition: Transition) -> Result<(), CoreError> {
        match transition {
            Transition::LoadStarted => {
                self.view = View::Loading;
                self.login_error = None;
                self.load_error = None;
            }
            Transition::InitialDataLoaded { state, reference } => {
                self.state = Some(state);
                self.reference = reference;
                self.load_error = None;
                self.view = View::Game;
            }
            Transition::LoadFailed(message) => {
                // Keep whatever was loaded before; only a client with
                // nothing to show falls through to the error page.
                self.view = if self.state.is_some() {
                    View::Game
                } else {
                    View::LoadFailed
                };
                self.load_error = Some(message);
            }
            Transition::LoginFailed(message) => {
                self.view = View::Login;
                self.login_error = Some(message);
            }
            Transition::SnapshotReplaced(state) => {
                self.state = Some(state);
                self.view = View::Game;
            }
            Transition::VineyardPurchased {
                vineyard,
                updated_money,
            } => {
                let player = self.player_mut("vineyard purchase")?;
                player.vineyards.push(vineyard);
                player.money = updated_money;
            }
            Transition::WineSold {
                sold_wine_id,
                bottles_remaining,
                updated_money,
            } => {
                let player = self.player_mut("wine sale")?;
                let position = player
                    .bottled_wines
                    .iter()
                    .position(|w| w.id == Some(sold_wine_id))
                    .ok_or(CoreError::NotFound {
                        entity: "Wine",
                        id: sold_wine_id,
                    })?;
                if bottles_remaining <= 0 {
                    player.bottled_wines.remove(position);
                } else {
                    player.bottled_wines[position].bottles = bottles_remaining;
                }
                player.money = updated_money;
            }
            Transition::SessionExpired => {
                self.clear_session();
                self.login_error = Some(SESSION_EXPIRED_MESSAGE.to_string());
            }
            Transition::LoggedOut => {
                self.clear_session();
                self.login_error = None;
            }
        }
        Ok(())
    }

    fn player_mut(&mut self, what: &str) -> Result<&mut Player, CoreError> {
        self.state
            .as_mut()
            .map(|s| &mut s.player)
            .ok_or_else(|| CoreError::Conflict(format!("no game state loaded for {what}")))
    }

    fn clear_session(&mut self) {
        self.state = None;
        self.reference = ReferenceData::default();
        self.load_error = None;
        self.view = View::Login;
    }
}
