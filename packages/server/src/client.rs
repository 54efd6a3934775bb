//! Authenticated client for the platform's `/api/sdk` endpoints.
//!
//! [`KruzicServer`] owns a cloneable [`reqwest::Client`] (which pools
//! connections internally) and the game's credentials. Every request carries
//! `Authorization: Bearer <api key>` and `X-Game-ID: <game id>`.
//!
//! Calls are never retried. A non-2xx answer becomes
//! [`ServerError::Api`] with the body's `error` message, or `HTTP <status>`
//! when the body is not the platform's JSON error shape.

use kruzic_protocol::{
    ApiKeyValidation, DataQuery, ErrorResponse, ListQuery, SetUserDataRequest, UserDataResponse,
};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ServerOptions;
use crate::error::ServerError;

/// Name of the header carrying the game id.
pub const GAME_ID_HEADER: &str = "X-Game-ID";

/// Backend handle for one game's platform credentials.
#[derive(Debug, Clone)]
pub struct KruzicServer {
    client: Client,
    options: ServerOptions,
    api_base: String,
}

impl KruzicServer {
    /// Create a server handle with a default HTTP client.
    pub fn new(options: ServerOptions) -> Self {
        Self::with_client(Client::new(), options)
    }

    /// Create a server handle around a pre-configured `reqwest::Client`
    /// (e.g. with a timeout).
    pub fn with_client(client: Client, options: ServerOptions) -> Self {
        let api_base = options.api_base();
        Self {
            client,
            options,
            api_base,
        }
    }

    /// Create a server handle from [`ServerOptions::from_env`].
    pub fn from_env() -> Result<Self, ServerError> {
        Ok(Self::new(ServerOptions::from_env()?))
    }

    pub fn game_id(&self) -> &str {
        &self.options.game_id
    }

    /// `{base_url}/api/sdk`.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{endpoint}", self.api_base))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .bearer_auth(&self.options.api_key)
            .header(GAME_ID_HEADER, &self.options.game_id)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ServerError> {
        let response = req.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "platform API response");

        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .ok()
                .map(|e| e.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(status = status.as_u16(), "platform API call failed: {message}");
            return Err(ServerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Check that the configured API key is accepted. `GET /auth`.
    pub async fn validate_key(&self) -> Result<ApiKeyValidation, ServerError> {
        self.send(self.request(Method::GET, "/auth")).await
    }

    /// Read a user's stored value. `GET /data?userId&key`.
    ///
    /// Returns `None` when the key is unset.
    pub async fn get_user_data(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<Value>, ServerError> {
        let query = DataQuery {
            user_id: user_id.into(),
            key: key.into(),
        };
        let result: UserDataResponse = self
            .send(self.request(Method::GET, "/data").query(&query))
            .await?;
        Ok(result.data.filter(|v| !v.is_null()))
    }

    /// Read a user's stored value and decode it into `T`.
    pub async fn get_user_data_as<T: DeserializeOwned>(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<T>, ServerError> {
        match self.get_user_data(user_id, key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store a value for a user. `POST /data`.
    pub async fn set_user_data<T: Serialize + ?Sized>(
        &self,
        user_id: &str,
        key: &str,
        value: &T,
    ) -> Result<(), ServerError> {
        let body = SetUserDataRequest {
            user_id: user_id.into(),
            key: key.into(),
            value: serde_json::to_value(value)?,
        };
        let _: UserDataResponse = self
            .send(self.request(Method::POST, "/data").json(&body))
            .await?;
        Ok(())
    }

    /// Delete a user's stored value. `DELETE /data?userId&key`.
    pub async fn delete_user_data(&self, user_id: &str, key: &str) -> Result<(), ServerError> {
        let query = DataQuery {
            user_id: user_id.into(),
            key: key.into(),
        };
        let _: UserDataResponse = self
            .send(self.request(Method::DELETE, "/data").query(&query))
            .await?;
        Ok(())
    }

    /// List a user's stored keys. `GET /data/list?userId`.
    pub async fn list_user_data(&self, user_id: &str) -> Result<Vec<String>, ServerError> {
        let query = ListQuery {
            user_id: user_id.into(),
        };
        let result: UserDataResponse<Vec<String>> = self
            .send(self.request(Method::GET, "/data/list").query(&query))
            .await?;
        Ok(result.data.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    type Data = Arc<Mutex<HashMap<(String, String), Value>>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer sk_test")
            && headers.get("x-game-id").and_then(|v| v.to_str().ok()) == Some("snake")
    }

    fn unauthorized() -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("invalid API key")),
        )
            .into_response()
    }

    async fn auth(headers: HeaderMap) -> Response {
        if !authorized(&headers) {
            return unauthorized();
        }
        Json(json!({ "valid": true, "gameId": "snake", "developerId": "dev_1" })).into_response()
    }

    async fn get_data(
        State(data): State<Data>,
        headers: HeaderMap,
        Query(q): Query<DataQuery>,
    ) -> Response {
        if !authorized(&headers) {
            return unauthorized();
        }
        let value = data.lock().unwrap().get(&(q.user_id, q.key)).cloned();
        Json(UserDataResponse::ok(value)).into_response()
    }

    async fn set_data(
        State(data): State<Data>,
        headers: HeaderMap,
        Json(body): Json<SetUserDataRequest>,
    ) -> Response {
        if !authorized(&headers) {
            return unauthorized();
        }
        data.lock()
            .unwrap()
            .insert((body.user_id, body.key), body.value);
        Json(UserDataResponse::<Value>::ok(None)).into_response()
    }

    async fn delete_data(
        State(data): State<Data>,
        headers: HeaderMap,
        Query(q): Query<DataQuery>,
    ) -> Response {
        if !authorized(&headers) {
            return unauthorized();
        }
        data.lock().unwrap().remove(&(q.user_id, q.key));
        Json(UserDataResponse::<Value>::ok(None)).into_response()
    }

    async fn list_data(
        State(data): State<Data>,
        headers: HeaderMap,
        Query(q): Query<ListQuery>,
    ) -> Response {
        if !authorized(&headers) {
            return unauthorized();
        }
        let keys: Vec<String> = data
            .lock()
            .unwrap()
            .keys()
            .filter(|(u, _)| *u == q.user_id)
            .map(|(_, k)| k.clone())
            .collect();
        Json(UserDataResponse::ok(Some(keys))).into_response()
    }

    /// Spawn a loopback axum server and return its origin (e.g. `http://127.0.0.1:PORT`).
    async fn spawn_mock_server(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn spawn_platform() -> String {
        let data: Data = Arc::default();
        let app = Router::new()
            .route("/api/sdk/auth", get(auth))
            .route(
                "/api/sdk/data",
                get(get_data).post(set_data).delete(delete_data),
            )
            .route("/api/sdk/data/list", get(list_data))
            .with_state(data);
        spawn_mock_server(app).await
    }

    fn server(base: &str, api_key: &str) -> KruzicServer {
        KruzicServer::new(ServerOptions::new(api_key, "snake").base_url(base))
    }

    #[tokio::test]
    async fn validate_key_sends_credentials() {
        let base = spawn_platform().await;
        let v = server(&base, "sk_test").validate_key().await.unwrap();
        assert!(v.valid);
        assert_eq!(v.developer_id.as_deref(), Some("dev_1"));
    }

    #[tokio::test]
    async fn rejected_key_surfaces_body_message() {
        let base = spawn_platform().await;
        let err = server(&base, "sk_wrong").validate_key().await.unwrap_err();
        assert_eq!(err.to_string(), "invalid API key");
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn data_round_trip() {
        let base = spawn_platform().await;
        let s = server(&base, "sk_test");

        assert_eq!(s.get_user_data("u1", "save").await.unwrap(), None);
        s.set_user_data("u1", "save", &json!({ "level": 4 })).await.unwrap();
        s.set_user_data("u1", "name & more", "x?y=z").await.unwrap();
        s.set_user_data("u2", "other", &1).await.unwrap();

        assert_eq!(
            s.get_user_data("u1", "save").await.unwrap(),
            Some(json!({ "level": 4 }))
        );
        assert_eq!(
            s.get_user_data("u1", "name & more").await.unwrap(),
            Some(json!("x?y=z"))
        );

        let mut keys = s.list_user_data("u1").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["name & more", "save"]);

        s.delete_user_data("u1", "save").await.unwrap();
        assert_eq!(s.list_user_data("u1").await.unwrap(), vec!["name & more"]);
    }

    #[tokio::test]
    async fn typed_read_decodes() {
        let base = spawn_platform().await;
        let s = server(&base, "sk_test");
        s.set_user_data("u1", "coins", &250u32).await.unwrap();
        let coins: Option<u32> = s.get_user_data_as("u1", "coins").await.unwrap();
        assert_eq!(coins, Some(250));
    }

    #[tokio::test]
    async fn unparsable_error_body_falls_back_to_status() {
        async fn broken() -> (StatusCode, &'static str) {
            (StatusCode::BAD_GATEWAY, "<html>upstream down</html>")
        }
        let base = spawn_mock_server(Router::new().route("/api/sdk/auth", get(broken))).await;
        let err = server(&base, "sk_test").validate_key().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[tokio::test]
    async fn missing_list_data_is_empty() {
        async fn empty() -> Json<Value> {
            Json(json!({ "success": true }))
        }
        let base = spawn_mock_server(Router::new().route("/api/sdk/data/list", get(empty))).await;
        assert!(server(&base, "sk_test").list_user_data("u1").await.unwrap().is_empty());
    }
}
