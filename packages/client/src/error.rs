//! Errors surfaced to game code by client operations.

use kruzic_protocol::MessageType;

use crate::store::StoreError;
use crate::transport::TransportError;

/// A failed client operation.
///
/// Every variant is scoped to the single operation that produced it; none of
/// them leaves the client unusable.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No host transport is available and fallback mode is off.
    #[error("SDK must be used within Kružić iframe or WebView")]
    NotEmbedded,

    /// A request reached the dispatcher while the instance is in local
    /// fallback mode. Fallback operations are answered by the client itself.
    #[error("Use dev mode methods directly")]
    FallbackDispatch,

    /// The host did not answer within the request deadline.
    #[error("Request timeout: {0}")]
    Timeout(MessageType),

    /// The host answered with `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// The pending request was cleared by [`crate::KruzicClient::destroy`]
    /// before it completed.
    #[error("request {0} was abandoned by destroy()")]
    Abandoned(MessageType),

    /// Writing the envelope to the host failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request payload could not be serialised.
    #[error("failed to encode {kind} request: {source}")]
    Encode {
        kind: MessageType,
        #[source]
        source: serde_json::Error,
    },

    /// The host's result did not have the shape the operation expects.
    #[error("unexpected {kind} response data: {source}")]
    Decode {
        kind: MessageType,
        #[source]
        source: serde_json::Error,
    },

    /// The local fallback store failed.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_the_operation() {
        let e = ClientError::Timeout(MessageType::GetUserData);
        assert_eq!(e.to_string(), "Request timeout: GET_USER_DATA");
    }

    #[test]
    fn rejected_message_is_the_host_message() {
        let e = ClientError::Rejected("quota exceeded".into());
        assert_eq!(e.to_string(), "quota exceeded");
    }
}
