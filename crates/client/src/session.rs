//! Player session: authentication, state fetching and action dispatch.
//!
//! [`GameSession`] owns the bearer token, the [`GameStore`] cache and the
//! per-action forms. Every action follows the same shape: validate the
//! form, take the busy flag, call the backend, apply one transition on
//! success, and record the outcome as a notice. A failed call applies no
//! transition, so the cached snapshot stays as it was. A 401 anywhere
//! drops the token and returns the player to the login view.

use std::sync::Arc;

use terroir_core::forms::{Form, FormSet};
use terroir_core::models::{GrapeCatalog, ReferenceData};
use terroir_core::requests::BuyVineyardResponse;
use terroir_core::store::{GameStore, NoticeKind, Transition};

use crate::api::TerroirApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

pub struct GameSession {
    api: TerroirApi,
    tokens: Arc<dyn TokenStore>,
    token: Option<String>,
    store: GameStore,
    /// Selection state, filled in by the UI before calling an action.
    pub forms: FormSet,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("api", &self.api)
            .field("logged_in", &self.token.is_some())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    pub fn new(api: TerroirApi, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            tokens,
            token: None,
            store: GameStore::new(),
            forms: FormSet::default(),
        }
    }

    /// Build a session from configuration, persisting the token on disk.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let api = TerroirApi::new(config)?;
        let tokens: Arc<dyn TokenStore> = match config
            .token_path
            .clone()
            .or_else(FileTokenStore::default_path)
        {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Using token file");
                Arc::new(FileTokenStore::new(path))
            }
            None => {
                tracing::warn!("No config directory available, login will not be remembered");
                Arc::new(MemoryTokenStore::new())
            }
        };
        Ok(Self::new(api, tokens))
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GameStore {
        &mut self.store
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Pick the region and varietal for the next vineyard purchase.
    pub fn select_vineyard(&mut self, region: &str, varietal: &str) -> ClientResult<()> {
        self.forms
            .buy_vineyard
            .select(&self.store, region, varietal)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Session / auth
    // -----------------------------------------------------------------------

    /// Resume a previous session from the stored token, if any. Without a
    /// token the store stays on the login view.
    pub async fn resume(&mut self) -> ClientResult<()> {
        let stored = match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored token");
                None
            }
        };
        let Some(token) = stored else {
            tracing::info!("No stored token, showing login");
            return Ok(());
        };

        let _busy = self.store.busy().try_acquire()?;
        self.token = Some(token.clone());
        self.load_initial_data(&token).await
    }

    /// `POST /token`, persist the token, then run the initial fetch. Any
    /// session already held is dropped first.
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<()> {
        let _busy = self.store.busy().try_acquire()?;
        if self.token.is_some() || self.store.state().is_some() {
            tracing::info!("Dropping current session before logging in again");
            self.logout();
        }
        self.store.apply(Transition::LoadStarted)?;

        let token = match self.api.login(username, password).await {
            Ok(response) => response.access_token,
            Err(e) => {
                tracing::warn!(username, error = %e, "Login failed");
                self.store.apply(Transition::LoginFailed(e.user_message()))?;
                return Err(e);
            }
        };

        if let Err(e) = self.tokens.save(&token) {
            // The session still works, it just won't survive a restart.
            tracing::warn!(error = %e, "Could not persist access token");
        }
        self.token = Some(token.clone());
        tracing::info!(username, "Logged in");

        self.load_initial_data(&token).await
    }

    /// Forget the token and all cached state. No backend call is made.
    pub fn logout(&mut self) {
        self.token = None;
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "Could not clear stored token");
        }
        self.forms.reset_all();
        // LoggedOut never fails.
        let _ = self.store.apply(Transition::LoggedOut);
        tracing::info!("Logged out");
    }

    fn expire_session(&mut self) {
        tracing::warn!("Session rejected by backend, returning to login");
        self.token = None;
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "Could not clear stored token");
        }
        self.forms.reset_all();
        let _ = self.store.apply(Transition::SessionExpired);
    }

    fn token(&self) -> ClientResult<String> {
        self.token.clone().ok_or(ClientError::NotLoggedIn)
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    /// Fetch the snapshot and all reference data concurrently and apply
    /// them together. Nothing is applied unless every request succeeds.
    async fn load_initial_data(&mut self, token: &str) -> ClientResult<()> {
        self.store.apply(Transition::LoadStarted)?;

        let api = &self.api;
        let (state, regions, vessel_types, grapes) = tokio::join!(
            api.game_state(token),
            api.regions(token),
            api.vessel_types(token),
            async {
                // Older backends do not serve grape characteristics.
                match api.grape_characteristics(token).await {
                    Err(ClientError::Api { status: 404, .. }) => Ok(GrapeCatalog::default()),
                    other => other,
                }
            },
        );

        match (state, regions, vessel_types, grapes) {
            (Ok(state), Ok(regions), Ok(vessel_types), Ok(grape_characteristics)) => {
                tracing::info!(
                    year = state.current_year,
                    month = state.current_month(),
                    regions = regions.len(),
                    vessel_types = vessel_types.len(),
                    "Initial game data loaded",
                );
                self.store.apply(Transition::InitialDataLoaded {
                    state,
                    reference: ReferenceData {
                        regions,
                        vessel_types,
                        grape_characteristics,
                    },
                })?;
                Ok(())
            }
            (state, regions, vessel_types, grapes) => {
                let errors: Vec<ClientError> = [
                    state.err(),
                    regions.err(),
                    vessel_types.err(),
                    grapes.err(),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(self.fail_initial_load(errors))
            }
        }
    }

    fn fail_initial_load(&mut self, mut errors: Vec<ClientError>) -> ClientError {
        if let Some(pos) = errors.iter().position(ClientError::is_unauthorized) {
            self.expire_session();
            return errors.swap_remove(pos);
        }

        let mut messages: Vec<String> = errors.iter().map(ClientError::user_message).collect();
        messages.dedup();
        let message = format!("Failed to fetch initial data: {}", messages.join("; "));
        tracing::error!(error = %message, "Initial load failed");
        let _ = self.store.apply(Transition::LoadFailed(message.clone()));

        let fallback = ClientError::Api {
            status: 0,
            detail: message,
        };
        errors.into_iter().next().unwrap_or(fallback)
    }

    /// Rerun the full initial fetch with the current token, e.g. after a
    /// failed load.
    pub async fn reload(&mut self) -> ClientResult<()> {
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;
        self.load_initial_data(&token).await
    }

    /// Refetch just the snapshot.
    pub async fn refresh(&mut self) -> ClientResult<()> {
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;
        let outcome = self.refetch_snapshot(&token).await;
        self.report(outcome, "Game state refreshed".into(), "Failed to refresh")
    }

    async fn refetch_snapshot(&mut self, token: &str) -> ClientResult<()> {
        let state = self.api.game_state(token).await?;
        self.store.apply(Transition::SnapshotReplaced(state))?;
        Ok(())
    }

    /// Refetch after an acknowledged action. The action has already taken
    /// effect, so a failed refetch gets its own notice and is not returned.
    async fn refetch_after_action(&mut self, token: &str) {
        match self.refetch_snapshot(token).await {
            Ok(()) => {}
            Err(e) if e.is_unauthorized() => self.expire_session(),
            Err(e) => {
                tracing::warn!(error = %e, "Refetch after action failed");
                self.store.notify(
                    NoticeKind::Error,
                    format!("Could not refresh game state: {}", e.user_message()),
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// `POST /advance_month`; replaces the snapshot and posts the month's
    /// event, if any, as its own notice.
    pub async fn advance_month(&mut self) -> ClientResult<()> {
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let mut event = None;
        let outcome = match self.api.advance_month(&token).await {
            Ok(response) => {
                event = response.event_message.filter(|m| !m.is_empty());
                self.store
                    .apply(Transition::SnapshotReplaced(response.state))
                    .map_err(ClientError::from)
            }
            Err(e) => Err(e),
        };

        self.report(
            outcome,
            "Advanced to the next month!".into(),
            "Failed to advance month",
        )?;
        if let Some(message) = event {
            tracing::info!(event = %message, "Game event");
            self.store.notify(NoticeKind::Event, message);
        }
        Ok(())
    }

    /// `POST /buy_vineyard` with the selection in `forms.buy_vineyard`.
    /// Appends the vineyard and applies `updated_money`, or replaces the
    /// snapshot when the backend returns a full one.
    pub async fn buy_vineyard(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.buy_vineyard, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = match self.api.buy_vineyard(&token, &request).await {
            Ok(BuyVineyardResponse::Patch {
                new_vineyard,
                updated_money,
            }) => self
                .store
                .apply(Transition::VineyardPurchased {
                    vineyard: new_vineyard,
                    updated_money,
                })
                .map_err(ClientError::from),
            Ok(BuyVineyardResponse::Snapshot(state)) => self
                .store
                .apply(Transition::SnapshotReplaced(state))
                .map_err(ClientError::from),
            Err(e) => Err(e),
        };

        settle_form(&mut self.forms.buy_vineyard, &outcome);
        self.report(
            outcome,
            format!("Vineyard '{}' purchased!", request.vineyard_name),
            "Failed to buy vineyard",
        )
    }

    /// `POST /tend_vineyard`, then refetch the snapshot.
    pub async fn tend_vineyard(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.tend_vineyard, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = self.api.tend_vineyard(&token, &request).await;

        settle_form(&mut self.forms.tend_vineyard, &outcome);
        self.report(
            outcome,
            format!("Tended {}!", request.vineyard_name),
            "Failed to tend vineyard",
        )?;
        self.refetch_after_action(&token).await;
        Ok(())
    }

    /// `POST /harvest_grapes`, then refetch the snapshot.
    pub async fn harvest_grapes(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.harvest_grapes, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = self.api.harvest_grapes(&token, &request).await;

        settle_form(&mut self.forms.harvest_grapes, &outcome);
        self.report(
            outcome,
            format!("Harvested grapes from {}!", request.vineyard_name),
            "Failed to harvest",
        )?;
        self.refetch_after_action(&token).await;
        Ok(())
    }

    /// `POST /buy_vessel`, then refetch the snapshot.
    pub async fn buy_vessel(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.buy_vessel, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = self.api.buy_vessel(&token, &request).await;

        settle_form(&mut self.forms.buy_vessel, &outcome);
        self.report(
            outcome,
            format!("Vessel '{}' purchased!", request.vessel_type_name),
            "Failed to buy vessel",
        )?;
        self.refetch_after_action(&token).await;
        Ok(())
    }

    /// `POST /process_grapes`, then refetch the snapshot.
    pub async fn process_grapes(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.process_grapes, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = self.api.process_grapes(&token, &request).await;

        settle_form(&mut self.forms.process_grapes, &outcome);
        self.report(
            outcome,
            "Grapes processed into must!".into(),
            "Failed to process grapes",
        )?;
        self.refetch_after_action(&token).await;
        Ok(())
    }

    /// `POST /start_fermentation`, then refetch the snapshot.
    pub async fn start_fermentation(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.start_fermentation, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = self.api.start_fermentation(&token, &request).await;

        settle_form(&mut self.forms.start_fermentation, &outcome);
        self.report(
            outcome,
            "Fermentation started!".into(),
            "Failed to start fermentation",
        )?;
        self.refetch_after_action(&token).await;
        Ok(())
    }

    /// `POST /perform_maceration_action` on a fermenting batch, then refetch.
    pub async fn perform_maceration_action(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.maceration, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = self.api.perform_maceration_action(&token, &request).await;

        settle_form(&mut self.forms.maceration, &outcome);
        self.report(
            outcome,
            format!("Performed {}!", request.action_type.label()),
            "Failed to perform maceration action",
        )?;
        self.refetch_after_action(&token).await;
        Ok(())
    }

    /// `POST /start_aging` for a finished fermentation, then refetch.
    pub async fn start_aging(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.start_aging, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = self.api.start_aging(&token, &request).await;

        settle_form(&mut self.forms.start_aging, &outcome);
        self.report(
            outcome,
            format!("Aging started for {} months!", request.aging_duration),
            "Failed to start aging",
        )?;
        self.refetch_after_action(&token).await;
        Ok(())
    }

    /// `POST /bottle_wine` for an aging batch, then refetch.
    pub async fn bottle_wine(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.bottle_wine, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = self.api.bottle_wine(&token, &request).await;

        settle_form(&mut self.forms.bottle_wine, &outcome);
        self.report(
            outcome,
            format!("Bottled '{}'!", request.wine_name),
            "Failed to bottle wine",
        )?;
        self.refetch_after_action(&token).await;
        Ok(())
    }

    /// `POST /sell_wine`; patches the bottle count and money in place.
    pub async fn sell_wine(&mut self) -> ClientResult<()> {
        let request = validate_form(&mut self.forms.sell_wine, &self.store)?;
        let token = self.token()?;
        let _busy = self.store.busy().try_acquire()?;

        let outcome = match self.api.sell_wine(&token, &request).await {
            Ok(response) => self
                .store
                .apply(Transition::WineSold {
                    sold_wine_id: response.sold_wine_id,
                    bottles_remaining: response.bottles_remaining,
                    updated_money: response.updated_money,
                })
                .map_err(ClientError::from),
            Err(e) => Err(e),
        };

        settle_form(&mut self.forms.sell_wine, &outcome);
        self.report(outcome, "Wine sold!".into(), "Failed to sell wine")
    }

    /// Record the outcome of an action as a notice. A 401 ends the session.
    fn report(
        &mut self,
        outcome: ClientResult<()>,
        success: String,
        failure: &str,
    ) -> ClientResult<()> {
        match outcome {
            Ok(()) => {
                tracing::info!(result = %success, "Action succeeded");
                self.store.notify(NoticeKind::Success, success);
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                self.expire_session();
                Err(e)
            }
            Err(e) => {
                tracing::warn!(action = failure, error = %e, "Action failed");
                self.store
                    .notify(NoticeKind::Error, format!("{failure}: {}", e.user_message()));
                Err(e)
            }
        }
    }
}

/// Validate a form, recording the error inline on failure.
fn validate_form<F: Form>(form: &mut F, store: &GameStore) -> ClientResult<F::Request> {
    match form.validate(store) {
        Ok(request) => {
            form.set_error(None);
            Ok(request)
        }
        Err(e) => {
            form.set_error(Some(e.to_string()));
            Err(e.into())
        }
    }
}

/// Reset the form after success, or show the error on it.
fn settle_form<F: Form>(form: &mut F, outcome: &ClientResult<()>) {
    match outcome {
        Ok(()) => form.reset(),
        Err(e) if e.is_unauthorized() => {}
        Err(e) => form.set_error(Some(e.user_message())),
    }
}
