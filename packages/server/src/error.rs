//! Errors returned by [`crate::KruzicServer`] calls.

use crate::config::ConfigError;

/// A failed platform API call.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-2xx status. `message` is the body's
    /// `error` field, or `HTTP <status>` when the body has none.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A value could not be converted to or from JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The options could not be assembled.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ServerError {
    /// The HTTP status of an [`ServerError::Api`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServerError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
