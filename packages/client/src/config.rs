//! Client configuration, populated from code or environment variables.

/// Namespace used for fallback storage keys when no game id is configured.
pub const DEFAULT_GAME_ID: &str = "dev-game";

/// Options for constructing a [`crate::KruzicClient`].
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `KRUZIC_DEV_MODE` | on when not embedded | Force local fallback mode on (`1`/`true`) or off (`0`/`false`) |
/// | `KRUZIC_GAME_ID` | `dev-game` | Namespace for fallback storage keys |
/// | `KRUZIC_STORE` | (absent = in-memory) | Path to a SQLite file backing the fallback store |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Serve operations locally instead of through a host.
    ///
    /// `None` means "only when not embedded". An embedded instance always
    /// talks to its host, whatever this is set to.
    pub dev_mode: Option<bool>,

    /// Game identifier that namespaces fallback storage keys.
    pub game_id: Option<String>,

    /// Path to a SQLite database for the fallback store.
    /// `None` means the process-wide in-memory store.
    pub store_path: Option<String>,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate options from environment variables; unset variables keep
    /// their defaults.
    pub fn from_env() -> Self {
        Self {
            dev_mode: std::env::var("KRUZIC_DEV_MODE")
                .ok()
                .and_then(|v| parse_flag(&v)),
            game_id: std::env::var("KRUZIC_GAME_ID").ok(),
            store_path: std::env::var("KRUZIC_STORE").ok(),
        }
    }

    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = Some(enabled);
        self
    }

    pub fn game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn store_path(mut self, path: impl Into<String>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// The configured game id, or [`DEFAULT_GAME_ID`].
    pub fn namespace(&self) -> &str {
        self.game_id.as_deref().unwrap_or(DEFAULT_GAME_ID)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
