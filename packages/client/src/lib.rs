//! Game-side half of the Kružić SDK.
//!
//! A game talks to its host (the Kružić page embedding it, or the native app
//! wrapping it in a WebView) by posting envelopes and waiting for correlated
//! responses. This crate turns that one-way, unordered message channel into
//! awaitable, timeout-bounded operations, and answers the same operations
//! locally when the game runs standalone during development.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`transport`] | Host environment probing and the [`Transport`] chosen from it |
//! | [`correlation`] | [`CorrelationTable`]: request id → pending completion |
//! | [`dispatcher`] | Envelope construction, write, and the request deadline |
//! | [`listener`] | Inbound event filtering and completion |
//! | [`client`] | [`KruzicClient`], the operation façade |
//! | [`store`] | Fallback key-value stores (memory, SQLite) |
//! | [`config`] | [`ClientOptions`] |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use kruzic_client::{ClientOptions, HostEnvironment, KruzicClient};
//!
//! // Standalone: no host, so operations are served locally.
//! let client = KruzicClient::new(ClientOptions::new().game_id("snake"), HostEnvironment::standalone());
//! client.ready();
//! client.set_data("best", &1200).await?;
//! assert_eq!(client.get_data("best").await?, Some(serde_json::json!(1200)));
//! ```

pub mod client;
pub mod config;
pub mod correlation;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod store;
pub mod transport;

pub use client::KruzicClient;
pub use config::ClientOptions;
pub use correlation::CorrelationTable;
pub use dispatcher::REQUEST_TIMEOUT;
pub use error::ClientError;
pub use store::{memory::MemoryStore, sqlite::SqliteStore, LocalStore, StoreError};
pub use transport::{
    HostEnvironment, InstanceIdentity, ListenerId, MessageEvents, MessageHandler, NativeBridge,
    ParentFrame, Transport, TransportError, TransportMode,
};

pub use kruzic_protocol::UserDetails;
