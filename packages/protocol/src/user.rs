//! Identity records and per-operation payloads carried inside envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Public profile of the signed-in user.
///
/// ```json
/// { "id": "u_123", "name": "Ana", "image": null }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDetails {
    pub id: String,
    pub name: String,
    /// Avatar URL. Always present on the wire, `null` when the user has none.
    pub image: Option<String>,
}

impl UserDetails {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
        }
    }
}

/// Result data of `IS_USER_SIGNED_IN`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignedIn {
    pub signed_in: bool,
}

/// Result data of `GET_USER_ID`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserId {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Payload of `GET_USER_DATA` and `DELETE_USER_DATA`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataKey {
    pub key: String,
}

/// Payload of `SET_USER_DATA`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetDataPayload {
    pub key: String,
    pub value: Value,
}
