//! Error body returned by the platform API for non-2xx responses.

use serde::{Deserialize, Serialize};

/// The JSON body of a failed `/api/sdk` call.
///
/// ```json
/// { "error": "invalid API key" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
