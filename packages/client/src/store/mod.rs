//! Local key-value stores backing fallback mode.
//!
//! The [`LocalStore`] trait is the whole contract fallback mode needs from
//! persistence: a synchronous, string-keyed, string-valued map. Namespacing
//! by game id happens in the client; stores know nothing about it.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStore`] | Tests and throwaway dev sessions; [`MemoryStore::shared`] is process-wide |
//! | [`SqliteStore`] | Dev sessions whose data should survive a restart |
//!
//! [`MemoryStore`]: memory::MemoryStore
//! [`MemoryStore::shared`]: memory::MemoryStore::shared
//! [`SqliteStore`]: sqlite::SqliteStore

pub mod memory;
pub mod sqlite;

/// Errors that store operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store cannot be opened at the given location.
    #[error("failed to open store at {path}: {reason}")]
    Open { path: String, reason: String },

    /// An unexpected error in the underlying backend.
    #[error("internal store error: {0}")]
    Internal(String),
}

/// An opaque synchronous string-keyed store, shared by every client in the
/// process that is handed the same instance.
///
/// No transactional guarantee spans more than one key.
pub trait LocalStore: Send + Sync + 'static {
    /// Read a value. Returns `None` if the key was never set or was removed.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. No-op if the key does not exist.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// Every key currently stored, in unspecified order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Every key starting with `prefix`, in unspecified order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}
