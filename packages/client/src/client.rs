//! The public operation façade.
//!
//! Every operation has two behaviours chosen by the instance's transport:
//! in [`Transport::LocalFallback`] it is answered from a [`LocalStore`] and a
//! fixed development identity; otherwise it becomes a dispatched round trip.

use std::sync::{Arc, Mutex};

use kruzic_protocol::{DataKey, MessageType, SetDataPayload, SignedIn, UserDetails, UserId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::ClientOptions;
use crate::correlation::CorrelationTable;
use crate::dispatcher::Dispatcher;
use crate::error::ClientError;
use crate::listener::ListenerRegistration;
use crate::store::memory::MemoryStore;
use crate::store::sqlite::SqliteStore;
use crate::store::LocalStore;
use crate::transport::{HostEnvironment, InstanceIdentity, Transport, TransportMode};

/// User id reported in fallback mode.
pub const DEV_USER_ID: &str = "dev-user";

/// Display name reported in fallback mode.
pub const DEV_USER_NAME: &str = "Dev User";

const STORAGE_PREFIX: &str = "kruzic_";
const STORAGE_SEPARATOR: &str = "_dev_";

/// Game-side SDK handle.
///
/// Construct one per game surface. Round-trip operations must be awaited
/// inside a Tokio runtime.
pub struct KruzicClient {
    identity: InstanceIdentity,
    dispatcher: Dispatcher,
    table: Arc<CorrelationTable>,
    store: Arc<dyn LocalStore>,
    listener: Mutex<Option<ListenerRegistration>>,
}

impl KruzicClient {
    /// Build a client whose fallback store is the process-wide
    /// [`MemoryStore::shared`].
    pub fn new(options: ClientOptions, env: HostEnvironment) -> Self {
        Self::with_store(options, env, MemoryStore::shared())
    }

    /// Build a client from [`ClientOptions::from_env`], opening the SQLite
    /// fallback store when `KRUZIC_STORE` is set.
    pub fn from_env(env: HostEnvironment) -> Result<Self, ClientError> {
        let options = ClientOptions::from_env();
        let store: Arc<dyn LocalStore> = match &options.store_path {
            Some(path) => Arc::new(SqliteStore::open(path)?),
            None => MemoryStore::shared(),
        };
        Ok(Self::with_store(options, env, store))
    }

    /// Build a client with an explicit fallback store.
    pub fn with_store(
        options: ClientOptions,
        env: HostEnvironment,
        store: Arc<dyn LocalStore>,
    ) -> Self {
        let identity = InstanceIdentity::probe(&env, &options);
        let transport = Transport::select(&env, &identity);
        let table = Arc::new(CorrelationTable::new());

        let listener = if identity.embedded {
            match env.message_events() {
                Some(events) => Some(ListenerRegistration::register(
                    events,
                    Arc::downgrade(&table),
                )),
                None => {
                    warn!("embedded without a message-event source; responses cannot arrive");
                    None
                }
            }
        } else {
            None
        };

        match transport.mode() {
            TransportMode::LocalFallback => {
                info!("[Kružić SDK] Running in dev mode - using local storage");
            }
            TransportMode::NativeBridge => {
                info!("[Kružić SDK] Running in native WebView");
            }
            TransportMode::EmbeddedChannel | TransportMode::Detached => {}
        }

        Self {
            identity,
            dispatcher: Dispatcher::new(transport, Arc::clone(&table)),
            table,
            store,
            listener: Mutex::new(listener),
        }
    }

    pub fn identity(&self) -> &InstanceIdentity {
        &self.identity
    }

    pub fn mode(&self) -> TransportMode {
        self.dispatcher.transport().mode()
    }

    /// Number of round trips still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.table.len()
    }

    /// The last request id issued by this instance, `0` if none.
    pub fn last_request_id(&self) -> u64 {
        self.table.last_id()
    }

    fn is_local(&self) -> bool {
        matches!(self.dispatcher.transport(), Transport::LocalFallback)
    }

    fn storage_key(&self, key: &str) -> String {
        format!(
            "{STORAGE_PREFIX}{}{STORAGE_SEPARATOR}{key}",
            self.identity.namespace
        )
    }

    // --- Lifecycle -----------------------------------------------------------

    /// Tell the host the game has loaded. Fire-and-forget: the host never
    /// answers and nothing is tracked.
    pub fn ready(&self) {
        if !self.identity.embedded {
            if self.identity.fallback {
                info!("[Kružić SDK] Game ready (dev mode)");
            }
            return;
        }
        if let Err(e) = self.dispatcher.notify(MessageType::GameReady) {
            warn!("failed to signal ready: {e}");
        }
    }

    /// Deregister the inbound listener and forget every pending request.
    ///
    /// Call this only when nothing is outstanding. Pending requests are
    /// neither resolved nor rejected by the table; callers still awaiting one
    /// observe [`ClientError::Abandoned`] once its completion is dropped.
    pub fn destroy(&self) {
        let registration = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        drop(registration);
        let dropped = self.table.clear();
        if dropped > 0 {
            warn!("destroy() abandoned {dropped} pending request(s)");
        }
    }

    // --- Identity ------------------------------------------------------------

    /// Whether the current user is signed in. Always `true` in fallback mode.
    pub async fn is_signed_in(&self) -> Result<bool, ClientError> {
        if self.is_local() {
            return Ok(true);
        }
        let result: SignedIn = self.round_trip(MessageType::IsUserSignedIn, None).await?;
        Ok(result.signed_in)
    }

    /// The signed-in user's profile, if any.
    pub async fn get_user_details(&self) -> Result<Option<UserDetails>, ClientError> {
        if self.is_local() {
            return Ok(Some(UserDetails::new(DEV_USER_ID, DEV_USER_NAME)));
        }
        self.round_trip(MessageType::GetUserDetails, None).await
    }

    /// The signed-in user's id, for passing to a game backend.
    pub async fn get_user_id(&self) -> Result<Option<String>, ClientError> {
        if self.is_local() {
            return Ok(Some(DEV_USER_ID.to_string()));
        }
        let result: Option<UserId> = self.round_trip(MessageType::GetUserId, None).await?;
        Ok(result.and_then(|r| r.user_id))
    }

    // --- Storage -------------------------------------------------------------

    /// Read a stored value. `None` when the key is unset.
    ///
    /// In fallback mode a stored string that is not valid JSON is returned as
    /// a JSON string.
    pub async fn get_data(&self, key: &str) -> Result<Option<Value>, ClientError> {
        if self.is_local() {
            let raw = match self.store.get_item(&self.storage_key(key))? {
                Some(raw) if !raw.is_empty() => raw,
                _ => return Ok(None),
            };
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            return Ok(Some(value).filter(|v| !v.is_null()));
        }
        let payload = encode(MessageType::GetUserData, &DataKey { key: key.into() })?;
        let value = self
            .dispatcher
            .request(MessageType::GetUserData, Some(payload))
            .await?;
        Ok(Some(value).filter(|v| !v.is_null()))
    }

    /// Read a stored value and decode it into `T`.
    pub async fn get_data_as<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, ClientError> {
        match self.get_data(key).await? {
            Some(value) => decode(MessageType::GetUserData, value).map(Some),
            None => Ok(None),
        }
    }

    /// Store a value under `key`, replacing any previous one.
    pub async fn set_data<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), ClientError> {
        let value = encode(MessageType::SetUserData, value)?;
        if self.is_local() {
            self.store
                .set_item(&self.storage_key(key), &value.to_string())?;
            return Ok(());
        }
        let payload = encode(
            MessageType::SetUserData,
            &SetDataPayload {
                key: key.into(),
                value,
            },
        )?;
        self.dispatcher
            .request(MessageType::SetUserData, Some(payload))
            .await?;
        Ok(())
    }

    /// Delete the value stored under `key`. Deleting an unset key succeeds.
    pub async fn delete_data(&self, key: &str) -> Result<(), ClientError> {
        if self.is_local() {
            self.store.remove_item(&self.storage_key(key))?;
            return Ok(());
        }
        let payload = encode(MessageType::DeleteUserData, &DataKey { key: key.into() })?;
        self.dispatcher
            .request(MessageType::DeleteUserData, Some(payload))
            .await?;
        Ok(())
    }

    /// Every key the current user has stored, in unspecified order.
    pub async fn list_data(&self) -> Result<Vec<String>, ClientError> {
        if self.is_local() {
            let prefix = self.storage_key("");
            let keys = self.store.keys_with_prefix(&prefix)?;
            return Ok(keys
                .into_iter()
                .map(|k| k[prefix.len()..].to_string())
                .collect());
        }
        let keys: Option<Vec<String>> = self.round_trip(MessageType::ListUserData, None).await?;
        Ok(keys.unwrap_or_default())
    }

    async fn round_trip<T: DeserializeOwned>(
        &self,
        kind: MessageType,
        payload: Option<Value>,
    ) -> Result<T, ClientError> {
        let value = self.dispatcher.request(kind, payload).await?;
        decode(kind, value)
    }
}

impl Drop for KruzicClient {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn encode<T: Serialize + ?Sized>(kind: MessageType, value: &T) -> Result<Value, ClientError> {
    serde_json::to_value(value).map_err(|source| ClientError::Encode { kind, source })
}

fn decode<T: DeserializeOwned>(kind: MessageType, value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|source| ClientError::Decode { kind, source })
}
