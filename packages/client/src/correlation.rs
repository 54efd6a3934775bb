//! The correlation table: request id → pending completion.
//!
//! Three independent event sources touch the table: dispatch (insert),
//! inbound responses (complete), and deadline timers (expire). None of them
//! can assume it runs first, so every completion path is "remove the entry if
//! it is still there, then complete it". Whichever path removes the entry
//! wins; the others find nothing and do nothing. That is what guarantees a
//! pending request completes at most once.
//!
//! Ids come from a per-table counter that starts at 1 and only ever grows,
//! including for fire-and-forget envelopes that never get an entry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use kruzic_protocol::{MessageType, ResponseEnvelope};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::ClientError;

/// What a pending request eventually resolves to.
pub type Completion = Result<Value, ClientError>;

struct Pending {
    kind: MessageType,
    sender: oneshot::Sender<Completion>,
}

impl Pending {
    fn complete(self, id: u64, result: Completion) {
        debug!(
            request_id = id,
            kind = %self.kind,
            ok = result.is_ok(),
            "completing pending request"
        );
        // The receiver is gone when the caller stopped waiting; the entry is
        // still consumed.
        let _ = self.sender.send(result);
    }
}

struct Inner {
    last_id: u64,
    pending: HashMap<u64, Pending>,
}

/// Instance-owned map of outstanding requests.
pub struct CorrelationTable {
    inner: Mutex<Inner>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                last_id: 0,
                pending: HashMap::new(),
            }),
        }
    }

    // Critical sections never call out, so a poisoned lock still holds
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Allocate a fresh id without registering anything.
    pub fn next_id(&self) -> u64 {
        let mut inner = self.lock();
        inner.last_id += 1;
        inner.last_id
    }

    /// The most recently issued id, `0` if none was issued yet.
    pub fn last_id(&self) -> u64 {
        self.lock().last_id
    }

    /// Allocate a fresh id and register a pending request under it.
    pub fn register(&self, kind: MessageType) -> (u64, oneshot::Receiver<Completion>) {
        let (sender, receiver) = oneshot::channel();
        let mut inner = self.lock();
        inner.last_id += 1;
        let id = inner.last_id;
        inner.pending.insert(id, Pending { kind, sender });
        (id, receiver)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.lock().pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, id: u64) -> Option<Pending> {
        self.lock().pending.remove(&id)
    }

    /// Drop an entry without completing it. Returns `true` if it existed.
    pub fn discard(&self, id: u64) -> bool {
        self.take(id).is_some()
    }

    /// Complete the entry matching `response`, if there is one.
    ///
    /// `success: true` resolves with `data` (absent means `null`);
    /// `success: false` rejects with `error`, or `"Unknown error"`.
    pub fn complete(&self, response: ResponseEnvelope) -> bool {
        let Some(pending) = self.take(response.request_id) else {
            return false;
        };
        let result = if response.success {
            Ok(response.data.unwrap_or(Value::Null))
        } else {
            Err(ClientError::Rejected(
                response.error.unwrap_or_else(|| "Unknown error".into()),
            ))
        };
        pending.complete(response.request_id, result);
        true
    }

    /// Reject the entry with a timeout if it is still pending.
    pub fn expire(&self, id: u64) -> bool {
        let Some(pending) = self.take(id) else {
            return false;
        };
        let kind = pending.kind;
        pending.complete(id, Err(ClientError::Timeout(kind)));
        true
    }

    /// Drop every entry without completing any of them. Returns how many
    /// were dropped.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let n = inner.pending.len();
        inner.pending.clear();
        n
    }
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}
