//! In-process mock of the game backend for session tests.
//!
//! The mock serves a small fixed world on `127.0.0.1:0`, accepts the
//! credentials `alice` / `secret` (token `abc123`), records every request
//! it sees, and lets a test override the response for any path.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use terroir_client::api::TerroirApi;
use terroir_client::token_store::{MemoryTokenStore, TokenStore};
use terroir_client::GameSession;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "abc123";

/// One request as the mock saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct MockState {
    game_state: Value,
    overrides: HashMap<String, (StatusCode, Value)>,
    stalled: HashSet<String>,
    requests: Vec<Recorded>,
}

#[derive(Clone)]
pub struct MockBackend {
    pub base_url: String,
    inner: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Start the mock on an ephemeral port.
    pub async fn start() -> Self {
        let inner = Arc::new(Mutex::new(MockState {
            game_state: sample_game_state(),
            ..MockState::default()
        }));

        let app = Router::new().fallback(handle).with_state(inner.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            inner,
        }
    }

    /// Answer `path` with `status` and `body` from now on.
    pub fn respond(&self, path: &str, status: StatusCode, body: Value) {
        self.inner
            .lock()
            .unwrap()
            .overrides
            .insert(path.to_string(), (status, body));
    }

    /// Never answer `path`, so the client's timeout fires.
    pub fn stall(&self, path: &str) {
        self.inner.lock().unwrap().stalled.insert(path.to_string());
    }

    pub fn set_game_state(&self, state: Value) {
        self.inner.lock().unwrap().game_state = state;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn api(&self) -> TerroirApi {
        TerroirApi::with_client(reqwest::Client::new(), self.base_url.clone())
    }

    /// A session with an empty in-memory token store.
    pub fn session(&self) -> (GameSession, Arc<MemoryTokenStore>) {
        self.session_with(self.api())
    }

    /// Like [`MockBackend::session`] but with a client that gives up after
    /// `timeout`.
    pub fn session_with_timeout(&self, timeout: Duration) -> (GameSession, Arc<MemoryTokenStore>) {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap();
        self.session_with(TerroirApi::with_client(client, self.base_url.clone()))
    }

    fn session_with(&self, api: TerroirApi) -> (GameSession, Arc<MemoryTokenStore>) {
        let tokens = Arc::new(MemoryTokenStore::new());
        let session = GameSession::new(api, tokens.clone() as Arc<dyn TokenStore>);
        (session, tokens)
    }

    /// A session that is already logged in with the initial data loaded.
    pub async fn logged_in_session(&self) -> (GameSession, Arc<MemoryTokenStore>) {
        let (mut session, tokens) = self.session();
        session.login(USERNAME, PASSWORD).await.unwrap();
        (session, tokens)
    }
}

async fn handle(
    State(inner): State<Arc<Mutex<MockState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = String::from_utf8_lossy(&body).into_owned();

    let stalled = {
        let mut state = inner.lock().unwrap();
        state.requests.push(Recorded {
            method: method.clone(),
            path: path.clone(),
            authorization: authorization.clone(),
            body: body.clone(),
        });
        state.stalled.contains(&path)
    };
    if stalled {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    let state = inner.lock().unwrap();

    if let Some((status, value)) = state.overrides.get(&path) {
        return (*status, Json(value.clone())).into_response();
    }

    if path == "/token" {
        let expected = format!("username={USERNAME}&password={PASSWORD}");
        return if body == expected {
            Json(json!({"access_token": TOKEN, "token_type": "bearer"})).into_response()
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Incorrect username or password"})),
            )
                .into_response()
        };
    }

    if authorization.as_deref() != Some(format!("Bearer {TOKEN}").as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Could not validate credentials"})),
        )
            .into_response();
    }

    match (method, path.as_str()) {
        (Method::GET, "/") => Json(state.game_state.clone()).into_response(),
        (Method::GET, "/game_data/regions") => Json(sample_regions()).into_response(),
        (Method::GET, "/game_data/vessel_types") => Json(sample_vessel_types()).into_response(),
        (Method::GET, "/game_data/grape_characteristics") => {
            Json(sample_grape_characteristics()).into_response()
        }
        (Method::POST, "/advance_month") => {
            let mut next = state.game_state.clone();
            next["current_month_index"] = json!(1);
            next["event_message"] = json!("A hailstorm damaged some vines.");
            Json(next).into_response()
        }
        (Method::POST, "/buy_vineyard") => {
            let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            Json(json!({
                "new_vineyard": {
                    "id": 7,
                    "name": request["vineyard_name"],
                    "varietal": request["varietal"],
                    "region": request["region"],
                    "size_acres": 5,
                    "age_of_vines": 10,
                    "soil_type": "Limestone",
                    "health": 100
                },
                "updated_money": 7500.0
            }))
            .into_response()
        }
        (Method::POST, "/sell_wine") => Json(json!({
            "sold_wine_id": 50,
            "bottles_remaining": 20,
            "updated_money": 10400.0
        }))
        .into_response(),
        (Method::POST, _) => Json(json!({"message": "ok"})).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"}))).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn sample_game_state() -> Value {
    json!({
        "id": 1,
        "player": {
            "id": 1,
            "name": "Alice",
            "money": 10000.0,
            "vineyards": [{
                "id": 3,
                "name": "Home Block",
                "varietal": "Chardonnay",
                "region": "Burgundy",
                "grapes_ready": true
            }],
            "winery": {
                "vessels": [
                    {"id": 1, "type": "Stainless Steel Tank", "capacity": 1000, "in_use": false},
                    {"id": 2, "type": "Oak Barrel", "capacity": 225, "in_use": false}
                ],
                "must_in_production": [{
                    "id": 20,
                    "varietal": "Chardonnay",
                    "vintage": 2024,
                    "quantity_kg": 500.0,
                    "quality": 70,
                    "processing_method": "sorted",
                    "destem_crush_method": "Destemmed/Crushed"
                }]
            },
            "grapes_inventory": [{
                "id": 10,
                "varietal": "Chardonnay",
                "vintage": 2024,
                "quantity_kg": 800.0,
                "quality": 72
            }],
            "bottled_wines": [{
                "id": 50,
                "name": "Estate Chardonnay",
                "vintage": 2023,
                "varietal": "Chardonnay",
                "style": "White",
                "quality": 80,
                "bottles": 24
            }]
        },
        "current_year": 2024,
        "current_month_index": 0,
        "months": [
            "January", "February", "March", "April", "May", "June",
            "July", "August", "September", "October", "November", "December"
        ]
    })
}

pub fn sample_regions() -> Value {
    json!({
        "Burgundy": {
            "climate": "Continental",
            "soil_types": ["Limestone", "Clay"],
            "grape_varietals": ["Pinot Noir", "Chardonnay"],
            "base_cost": 2500.0
        }
    })
}

pub fn sample_vessel_types() -> Value {
    json!({
        "Stainless Steel Tank": {"capacity": 1000, "cost": 5000.0, "type": "fermentation/aging"},
        "Oak Barrel": {"capacity": 225, "cost": 800.0, "type": "aging"}
    })
}

pub fn sample_grape_characteristics() -> Value {
    json!({
        "Pinot Noir": {"color": "red", "ripening_month": 8, "base_quality": 70},
        "Chardonnay": {"color": "white", "ripening_month": 8, "base_quality": 65}
    })
}
