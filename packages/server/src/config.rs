//! Server library configuration, populated from code or environment variables.

/// Platform origin used when no base URL override is configured.
pub const DEFAULT_BASE_URL: &str = "https://www.kruzic.rs";

/// Errors raised while assembling [`ServerOptions`] from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Credentials and endpoint for a [`crate::KruzicServer`].
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `KRUZIC_API_KEY` | (required) | Secret key issued for the game |
/// | `KRUZIC_GAME_ID` | (required) | Game the key belongs to |
/// | `KRUZIC_BASE_URL` | `https://www.kruzic.rs` | Platform origin; `/api/sdk` is appended |
#[derive(Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub api_key: String,
    pub game_id: String,
    /// Platform origin without the `/api/sdk` suffix.
    pub base_url: Option<String>,
}

impl ServerOptions {
    pub fn new(api_key: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            game_id: game_id.into(),
            base_url: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Populate options from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            std::env::var("KRUZIC_API_KEY").map_err(|_| ConfigError::Missing("KRUZIC_API_KEY"))?;
        let game_id =
            std::env::var("KRUZIC_GAME_ID").map_err(|_| ConfigError::Missing("KRUZIC_GAME_ID"))?;
        Ok(Self {
            api_key,
            game_id,
            base_url: std::env::var("KRUZIC_BASE_URL").ok(),
        })
    }

    /// `{base_url}/api/sdk`, with any trailing slash on the base removed.
    pub fn api_base(&self) -> String {
        let base = self
            .base_url
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        format!("{}/api/sdk", base.trim_end_matches('/'))
    }
}

// The API key never appears in logs or panic messages.
impl std::fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerOptions")
            .field("api_key", &"<redacted>")
            .field("game_id", &self.game_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_defaults_to_platform() {
        let o = ServerOptions::new("k", "g");
        assert_eq!(o.api_base(), "https://www.kruzic.rs/api/sdk");
    }

    #[test]
    fn api_base_override_trims_slash() {
        let o = ServerOptions::new("k", "g").base_url("http://127.0.0.1:9000/");
        assert_eq!(o.api_base(), "http://127.0.0.1:9000/api/sdk");
    }

    #[test]
    fn debug_redacts_key() {
        let o = ServerOptions::new("sk_live_secret", "g");
        assert!(!format!("{o:?}").contains("sk_live_secret"));
    }
}
