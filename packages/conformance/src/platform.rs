//! In-process stand-in for the platform's `/api/sdk` HTTP API.
//!
//! Implements just enough of the platform for the server library to be
//! exercised over real TCP: bearer-key and game-id checks, per-user key-value
//! data, and the platform's `{ "error": ... }` failure body.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use kruzic_protocol::{
    ApiKeyValidation, DataQuery, ErrorResponse, ListQuery, SetUserDataRequest, UserDataResponse,
};
use serde_json::Value;

/// Credentials the mock platform accepts and the data it holds.
pub struct PlatformState {
    pub api_key: String,
    pub game_id: String,
    pub developer_id: String,
    data: RwLock<HashMap<(String, String), Value>>,
}

impl PlatformState {
    pub fn new(api_key: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            game_id: game_id.into(),
            developer_id: "dev_conformance".into(),
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Read a value directly, bypassing HTTP.
    pub fn get(&self, user_id: &str, key: &str) -> Option<Value> {
        self.data
            .read()
            .unwrap()
            .get(&(user_id.to_string(), key.to_string()))
            .cloned()
    }

    /// Seed a value directly, bypassing HTTP.
    pub fn put(&self, user_id: &str, key: &str, value: Value) {
        self.data
            .write()
            .unwrap()
            .insert((user_id.to_string(), key.to_string()), value);
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let bearer = format!("Bearer {}", self.api_key);
        if header("authorization") != Some(bearer.as_str()) {
            return Err(error(StatusCode::UNAUTHORIZED, "invalid API key"));
        }
        if header("x-game-id") != Some(self.game_id.as_str()) {
            return Err(error(StatusCode::FORBIDDEN, "API key does not belong to this game"));
        }
        Ok(())
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

type AppState = Arc<PlatformState>;

async fn auth(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    Json(ApiKeyValidation {
        valid: true,
        game_id: Some(state.game_id.clone()),
        developer_id: Some(state.developer_id.clone()),
        error: None,
    })
    .into_response()
}

async fn get_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<DataQuery>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    Json(UserDataResponse::ok(state.get(&q.user_id, &q.key))).into_response()
}

async fn set_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SetUserDataRequest>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    if body.key.is_empty() {
        return error(StatusCode::BAD_REQUEST, "key must not be empty");
    }
    state.put(&body.user_id, &body.key, body.value);
    Json(UserDataResponse::<Value>::ok(None)).into_response()
}

async fn delete_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<DataQuery>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    state.data.write().unwrap().remove(&(q.user_id, q.key));
    Json(UserDataResponse::<Value>::ok(None)).into_response()
}

async fn list_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<ListQuery>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    let keys: Vec<String> = state
        .data
        .read()
        .unwrap()
        .keys()
        .filter(|(user, _)| *user == q.user_id)
        .map(|(_, key)| key.clone())
        .collect();
    Json(UserDataResponse::ok(Some(keys))).into_response()
}

/// Build the `/api/sdk` router around `state`.
pub fn build_router(state: Arc<PlatformState>) -> Router {
    Router::new()
        .route("/api/sdk/auth", get(auth))
        .route(
            "/api/sdk/data",
            get(get_data).post(set_data).delete(delete_data),
        )
        .route("/api/sdk/data/list", get(list_data))
        .with_state(state)
}

/// Start an ephemeral in-process platform and return `(base_url, state)`.
///
/// The platform runs in a background `tokio` task bound to an OS-assigned
/// port on `127.0.0.1`. `base_url` is the origin (e.g. `http://127.0.0.1:51234`),
/// suitable for `ServerOptions::base_url`. The returned state gives tests
/// direct access to the stored data.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound.
pub async fn spawn_platform(
    api_key: &str,
    game_id: &str,
) -> (String, Arc<PlatformState>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let base_url = format!("http://{addr}");

    let state = Arc::new(PlatformState::new(api_key, game_id));
    let router = build_router(Arc::clone(&state));

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("mock platform error");
    });

    (base_url, state)
}
