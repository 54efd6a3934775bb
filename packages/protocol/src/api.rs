//! Request and response bodies for the platform's `/api/sdk` HTTP API.
//!
//! Every call carries `Authorization: Bearer <api key>` and
//! `X-Game-ID: <game id>`; those headers are not modelled here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response body for `GET /api/sdk/auth`.
///
/// ```json
/// { "valid": true, "gameId": "space-race", "developerId": "dev_42" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyValidation {
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_id: Option<String>,

    /// Why the key was rejected, when `valid` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Generic envelope returned by every `/api/sdk/data` endpoint.
///
/// `data` is absent for writes and for reads of keys that were never set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDataResponse<T = Value> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> UserDataResponse<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Body of `POST /api/sdk/data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetUserDataRequest {
    pub user_id: String,
    pub key: String,
    pub value: Value,
}

/// Query string of `GET /api/sdk/data` and `DELETE /api/sdk/data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub user_id: String,
    pub key: String,
}

/// Query string of `GET /api/sdk/data/list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_parses_partial_body() {
        let v: ApiKeyValidation =
            serde_json::from_value(json!({ "valid": false, "error": "revoked" })).unwrap();
        assert!(!v.valid);
        assert_eq!(v.error.as_deref(), Some("revoked"));
        assert!(v.game_id.is_none());
    }

    #[test]
    fn data_response_without_data() {
        let r: UserDataResponse<Vec<String>> =
            serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(r.success);
        assert!(r.data.is_none());
    }

    #[test]
    fn set_request_uses_camel_case() {
        let body = SetUserDataRequest {
            user_id: "u1".into(),
            key: "score".into(),
            value: json!(10),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "userId": "u1", "key": "score", "value": 10 })
        );
    }
}
