//! Typed HTTP client for the game backend.
//!
//! One method per endpoint, using [`reqwest`]. Every authenticated call
//! carries `Authorization: Bearer <token>`. Non-2xx responses become
//! [`ClientError::Unauthorized`] (401) or [`ClientError::Api`] carrying the
//! backend's `detail` message.

use serde::de::DeserializeOwned;
use serde::Serialize;

use terroir_core::models::{GameState, GrapeCatalog, Regions, VesselTypes};
use terroir_core::requests::{
    AdvanceMonthResponse, BottleWineRequest, BuyVesselRequest, BuyVineyardRequest,
    BuyVineyardResponse, ErrorBody, MacerationRequest, ProcessGrapesRequest, SellWineRequest,
    SellWineResponse, StartAgingRequest, StartFermentationRequest, TokenResponse,
    VineyardNameRequest,
};
use terroir_core::store::SESSION_EXPIRED_MESSAGE;

use crate::config::ClientConfig;
use crate::error::{status_message, ClientError, ClientResult};

/// HTTP client for one game backend.
#[derive(Debug, Clone)]
pub struct TerroirApi {
    client: reqwest::Client,
    base_url: String,
}

impl TerroirApi {
    /// Build a client with the configured request timeout.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config.backend_url.clone()))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- session ----

    /// Exchange credentials for a bearer token (`POST /token`, form-encoded).
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<TokenResponse> {
        tracing::debug!(method = "POST", path = "/token", username, "Backend request");
        let response = self
            .client
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        Self::parse_response("/token", response).await
    }

    // ---- game state / reference data ----

    /// `GET /`: the player's full snapshot.
    pub async fn game_state(&self, token: &str) -> ClientResult<GameState> {
        self.get_json("/", token).await
    }

    /// `GET /game_data/regions`: purchasable regions keyed by name.
    pub async fn regions(&self, token: &str) -> ClientResult<Regions> {
        self.get_json("/game_data/regions", token).await
    }

    /// `GET /game_data/vessel_types`: vessel catalog keyed by type name.
    pub async fn vessel_types(&self, token: &str) -> ClientResult<VesselTypes> {
        self.get_json("/game_data/vessel_types", token).await
    }

    /// `GET /game_data/grape_characteristics`: colour and ripening data per
    /// varietal.
    pub async fn grape_characteristics(&self, token: &str) -> ClientResult<GrapeCatalog> {
        self.get_json("/game_data/grape_characteristics", token)
            .await
    }

    // ---- actions ----

    /// `POST /advance_month`: the new snapshot plus an optional event message.
    pub async fn advance_month(&self, token: &str) -> ClientResult<AdvanceMonthResponse> {
        let response = self.post("/advance_month", token).send().await?;
        Self::parse_response("/advance_month", response).await
    }

    /// `POST /buy_vineyard`: either the new vineyard with updated money, or
    /// a full snapshot.
    pub async fn buy_vineyard(
        &self,
        token: &str,
        body: &BuyVineyardRequest,
    ) -> ClientResult<BuyVineyardResponse> {
        self.post_json("/buy_vineyard", token, body).await
    }

    /// `POST /tend_vineyard`. The body is an acknowledgement only.
    pub async fn tend_vineyard(&self, token: &str, body: &VineyardNameRequest) -> ClientResult<()> {
        self.post_ack("/tend_vineyard", token, body).await
    }

    /// `POST /harvest_grapes`. The body is an acknowledgement only.
    pub async fn harvest_grapes(
        &self,
        token: &str,
        body: &VineyardNameRequest,
    ) -> ClientResult<()> {
        self.post_ack("/harvest_grapes", token, body).await
    }

    /// `POST /buy_vessel`. The body is an acknowledgement only.
    pub async fn buy_vessel(&self, token: &str, body: &BuyVesselRequest) -> ClientResult<()> {
        self.post_ack("/buy_vessel", token, body).await
    }

    /// `POST /process_grapes`: turn a grape lot into must.
    pub async fn process_grapes(
        &self,
        token: &str,
        body: &ProcessGrapesRequest,
    ) -> ClientResult<()> {
        self.post_ack("/process_grapes", token, body).await
    }

    /// `POST /start_fermentation`: move a must into a free vessel.
    pub async fn start_fermentation(
        &self,
        token: &str,
        body: &StartFermentationRequest,
    ) -> ClientResult<()> {
        self.post_ack("/start_fermentation", token, body).await
    }

    /// `POST /perform_maceration_action` on a fermenting batch.
    pub async fn perform_maceration_action(
        &self,
        token: &str,
        body: &MacerationRequest,
    ) -> ClientResult<()> {
        self.post_ack("/perform_maceration_action", token, body)
            .await
    }

    /// `POST /start_aging`: move a fermented batch into an aging vessel.
    pub async fn start_aging(&self, token: &str, body: &StartAgingRequest) -> ClientResult<()> {
        self.post_ack("/start_aging", token, body).await
    }

    /// `POST /bottle_wine`: bottle an aging batch under a name.
    pub async fn bottle_wine(&self, token: &str, body: &BottleWineRequest) -> ClientResult<()> {
        self.post_ack("/bottle_wine", token, body).await
    }

    /// `POST /sell_wine`: remaining bottles and updated money.
    pub async fn sell_wine(
        &self,
        token: &str,
        body: &SellWineRequest,
    ) -> ClientResult<SellWineResponse> {
        self.post_json("/sell_wine", token, body).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        tracing::debug!(method = "POST", path, "Backend request");
        self.client.post(self.url(path)).bearer_auth(token)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> ClientResult<T> {
        tracing::debug!(method = "GET", path, "Backend request");
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::parse_response(path, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self.post(path, token).json(body).send().await?;
        Self::parse_response(path, response).await
    }

    /// POST whose success body is only an acknowledgement.
    async fn post_ack<B: Serialize>(&self, path: &str, token: &str, body: &B) -> ClientResult<()> {
        let response = self.post(path, token).json(body).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Map a non-2xx response to an error carrying the backend's message.
    async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message);

        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!("Backend rejected the access token");
            return Err(ClientError::Unauthorized(
                detail.unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string()),
            ));
        }

        tracing::warn!(status = code, detail = ?detail, "Backend returned an error");
        Err(ClientError::Api {
            status: code,
            detail: detail.unwrap_or_else(|| status_message(code)),
        })
    }

    async fn parse_response<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }
}
