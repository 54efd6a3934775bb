//! Shared helpers for the Kružić conformance test suite.
//!
//! | Helper | Stands in for |
//! |--------|---------------|
//! | [`spawn_platform`] | The platform's `/api/sdk` HTTP API, on an ephemeral port |
//! | [`MockHost`] | The page or native app a game is embedded in |
//! | [`server_for`] | A backend's [`KruzicServer`] pointed at a spawned platform |
//!
//! A [`MockHost`] built with [`MockHost::relay`] forwards the game's data
//! operations through a [`KruzicServer`], so one test can drive a value from
//! the game client all the way to the platform and read it back from the
//! backend side.

pub mod host;
pub mod platform;

use std::time::Duration;

use kruzic_server::{KruzicServer, ServerOptions};

pub use host::{native_environment, nested_environment, MockHost};
pub use platform::{build_router, spawn_platform, PlatformState};

/// A server handle for `game_id` against a platform at `base_url`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
pub fn server_for(base_url: &str, api_key: &str, game_id: &str) -> KruzicServer {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("build HTTP client");
    KruzicServer::with_client(client, ServerOptions::new(api_key, game_id).base_url(base_url))
}
