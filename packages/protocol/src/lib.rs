//! Wire types for the Kružić game SDK.
//!
//! This crate encodes both protocols the SDK speaks as Rust types:
//!
//! - the cross-context envelope protocol between a game and its host page or
//!   native WebView container ([`message`]), and
//! - the platform's authenticated `/api/sdk` HTTP API used by game backends
//!   ([`api`]).
//!
//! It has no I/O and no async runtime; the `kruzic-client` and
//! `kruzic-server` crates build on it.
//!
//! # Cross-context messages
//!
//! | Direction | Shape |
//! |-----------|-------|
//! | game → host | [`RequestEnvelope`] `{ type, requestId, payload? }` |
//! | host → game | [`ResponseEnvelope`] `{ type: "RESPONSE", requestId, success, data?, error? }` |
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | GET | `/api/sdk/auth` | → [`ApiKeyValidation`] |
//! | GET | `/api/sdk/data?userId&key` | → [`UserDataResponse`] |
//! | POST | `/api/sdk/data` | [`SetUserDataRequest`] → [`UserDataResponse`] |
//! | DELETE | `/api/sdk/data?userId&key` | → [`UserDataResponse`] |
//! | GET | `/api/sdk/data/list?userId` | → [`UserDataResponse`] of `Vec<String>` |

pub mod api;
pub mod error;
pub mod message;
pub mod user;

pub use api::{ApiKeyValidation, DataQuery, ListQuery, SetUserDataRequest, UserDataResponse};
pub use error::ErrorResponse;
pub use message::{MessageType, RequestEnvelope, ResponseEnvelope, RESPONSE_TYPE};
pub use user::{DataKey, SetDataPayload, SignedIn, UserDetails, UserId};
