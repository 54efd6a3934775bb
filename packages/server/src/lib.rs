//! Backend half of the Kružić SDK.
//!
//! Game backends use [`KruzicServer`] to read and write per-user data on the
//! Kružić platform with the game's API key, typically for user ids obtained
//! from the game client's `get_user_id`.
//!
//! ```rust,ignore
//! use kruzic_server::{KruzicServer, ServerOptions};
//!
//! let server = KruzicServer::new(ServerOptions::new(api_key, "snake"));
//! assert!(server.validate_key().await?.valid);
//! server.set_user_data(&user_id, "best", &1200).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{KruzicServer, GAME_ID_HEADER};
pub use config::{ConfigError, ServerOptions, DEFAULT_BASE_URL};
pub use error::ServerError;

pub use kruzic_protocol::ApiKeyValidation;
