//! Cross-context envelopes exchanged between a game and its host.
//!
//! Every request a game makes is wrapped in a [`RequestEnvelope`] tagged with
//! a [`MessageType`] and a per-instance request id. The host answers with a
//! [`ResponseEnvelope`] carrying the same id. The transport underneath may
//! carry unrelated traffic, so receivers must be prepared to ignore anything
//! that does not decode as a response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator value carried in the `type` field of every response.
pub const RESPONSE_TYPE: &str = "RESPONSE";

/// The operation a request envelope asks the host to perform.
///
/// Serialises as a SCREAMING_SNAKE_CASE string (e.g. `"GET_USER_DATA"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// The game finished loading. Fire-and-forget; the host never answers.
    GameReady,
    /// Whether a user is signed in. Answered with [`crate::SignedIn`].
    IsUserSignedIn,
    /// The signed-in user's profile. Answered with [`crate::UserDetails`] or `null`.
    GetUserDetails,
    /// The signed-in user's id. Answered with [`crate::UserId`].
    GetUserId,
    /// Read one stored value. Payload: [`crate::DataKey`].
    GetUserData,
    /// Write one stored value. Payload: [`crate::SetDataPayload`].
    SetUserData,
    /// List the stored keys of the current user.
    ListUserData,
    /// Delete one stored value. Payload: [`crate::DataKey`].
    DeleteUserData,
}

impl MessageType {
    /// The wire-format tag (e.g. `"GET_USER_DATA"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::GameReady => "GAME_READY",
            MessageType::IsUserSignedIn => "IS_USER_SIGNED_IN",
            MessageType::GetUserDetails => "GET_USER_DETAILS",
            MessageType::GetUserId => "GET_USER_ID",
            MessageType::GetUserData => "GET_USER_DATA",
            MessageType::SetUserData => "SET_USER_DATA",
            MessageType::ListUserData => "LIST_USER_DATA",
            MessageType::DeleteUserData => "DELETE_USER_DATA",
        }
    }

    /// `false` only for [`MessageType::GameReady`], which the host never answers.
    pub fn expects_response(&self) -> bool {
        !matches!(self, MessageType::GameReady)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a [`MessageType`] from its wire-format tag.
impl std::str::FromStr for MessageType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GAME_READY" => Ok(MessageType::GameReady),
            "IS_USER_SIGNED_IN" => Ok(MessageType::IsUserSignedIn),
            "GET_USER_DETAILS" => Ok(MessageType::GetUserDetails),
            "GET_USER_ID" => Ok(MessageType::GetUserId),
            "GET_USER_DATA" => Ok(MessageType::GetUserData),
            "SET_USER_DATA" => Ok(MessageType::SetUserData),
            "LIST_USER_DATA" => Ok(MessageType::ListUserData),
            "DELETE_USER_DATA" => Ok(MessageType::DeleteUserData),
            _ => Err(format!("unknown message type {s:?}")),
        }
    }
}

/// A request sent from the game to its host.
///
/// ```json
/// { "type": "SET_USER_DATA", "requestId": 7, "payload": { "key": "level", "value": 3 } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// What the host is asked to do.
    #[serde(rename = "type")]
    pub kind: MessageType,

    /// Per-instance, strictly increasing correlation id.
    pub request_id: u64,

    /// Operation-specific arguments. Absent for operations without arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl RequestEnvelope {
    pub fn new(kind: MessageType, request_id: u64, payload: Option<Value>) -> Self {
        Self {
            kind,
            request_id,
            payload,
        }
    }
}

/// A host's answer to a [`RequestEnvelope`].
///
/// `type` is always [`RESPONSE_TYPE`]; decoding anything else is an error,
/// which lets receivers filter unrelated traffic by attempting a decode.
///
/// ```json
/// { "type": "RESPONSE", "requestId": 7, "success": false, "error": "quota exceeded" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type", rename = "RESPONSE")]
pub struct ResponseEnvelope {
    /// The id of the request this answers.
    pub request_id: u64,

    /// Whether the host completed the operation.
    pub success: bool,

    /// Result value on success. Absent means "no data", which is a valid result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Human-readable failure reason when `success` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// A successful response carrying `data`.
    pub fn ok(request_id: u64, data: Option<Value>) -> Self {
        Self {
            request_id,
            success: true,
            data,
            error: None,
        }
    }

    /// A failed response carrying `error`.
    pub fn err(request_id: u64, error: impl Into<String>) -> Self {
        Self {
            request_id,
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Decode an inbound event value, returning `None` for anything that is
    /// not a well-formed response envelope.
    pub fn from_event(value: &Value) -> Option<Self> {
        if value.get("type").and_then(Value::as_str) != Some(RESPONSE_TYPE) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serialises_with_camel_case_fields() {
        let env = RequestEnvelope::new(
            MessageType::GetUserData,
            3,
            Some(json!({ "key": "level" })),
        );
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(
            v,
            json!({ "type": "GET_USER_DATA", "requestId": 3, "payload": { "key": "level" } })
        );
    }

    #[test]
    fn request_without_payload_omits_field() {
        let env = RequestEnvelope::new(MessageType::GameReady, 1, None);
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v, json!({ "type": "GAME_READY", "requestId": 1 }));
    }

    #[test]
    fn response_tag_is_written() {
        let v = serde_json::to_value(ResponseEnvelope::ok(9, Some(json!(true)))).unwrap();
        assert_eq!(v["type"], "RESPONSE");
        assert_eq!(v["requestId"], 9);
        assert_eq!(v["success"], true);
        assert_eq!(v["data"], true);
    }

    #[test]
    fn from_event_rejects_other_discriminators() {
        let v = json!({ "type": "GAME_READY", "requestId": 1, "success": true });
        assert!(ResponseEnvelope::from_event(&v).is_none());
        assert!(ResponseEnvelope::from_event(&json!("hello")).is_none());
        assert!(ResponseEnvelope::from_event(&json!({ "requestId": 1 })).is_none());
    }

    #[test]
    fn from_event_rejects_malformed_responses() {
        let v = json!({ "type": "RESPONSE", "requestId": "one", "success": true });
        assert!(ResponseEnvelope::from_event(&v).is_none());
        let v = json!({ "type": "RESPONSE", "requestId": 1 });
        assert!(ResponseEnvelope::from_event(&v).is_none());
    }

    #[test]
    fn from_event_accepts_response_without_data() {
        let v = json!({ "type": "RESPONSE", "requestId": 4, "success": true });
        let resp = ResponseEnvelope::from_event(&v).unwrap();
        assert_eq!(resp, ResponseEnvelope::ok(4, None));
    }

    #[test]
    fn message_type_tags_match_display() {
        for kind in [
            MessageType::GameReady,
            MessageType::IsUserSignedIn,
            MessageType::GetUserDetails,
            MessageType::GetUserId,
            MessageType::GetUserData,
            MessageType::SetUserData,
            MessageType::ListUserData,
            MessageType::DeleteUserData,
        ] {
            let v = serde_json::to_value(kind).unwrap();
            assert_eq!(v, json!(kind.to_string()));
            assert_eq!(kind.as_str().parse::<MessageType>().unwrap(), kind);
        }
    }

    #[test]
    fn only_game_ready_is_fire_and_forget() {
        assert!(!MessageType::GameReady.expects_response());
        assert!(MessageType::ListUserData.expects_response());
    }
}
