//! Outbound dispatch: envelope construction, registration, write, deadline.

use std::sync::Arc;
use std::time::Duration;

use kruzic_protocol::{MessageType, RequestEnvelope};
use serde_json::Value;
use tracing::{debug, warn};

use crate::correlation::CorrelationTable;
use crate::error::ClientError;
use crate::transport::Transport;

/// How long a round trip may stay pending before it is rejected.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends envelopes over the instance's single transport and tracks the
/// replies in its [`CorrelationTable`].
pub struct Dispatcher {
    transport: Transport,
    table: Arc<CorrelationTable>,
}

impl Dispatcher {
    pub fn new(transport: Transport, table: Arc<CorrelationTable>) -> Self {
        Self { transport, table }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Send an envelope that the host never answers. Consumes an id but
    /// registers nothing.
    pub fn notify(&self, kind: MessageType) -> Result<u64, ClientError> {
        self.ensure_dispatchable()?;
        let id = self.table.next_id();
        self.transport.send(&RequestEnvelope::new(kind, id, None))?;
        debug!(request_id = id, %kind, "sent notification");
        Ok(id)
    }

    /// Send a request and wait for its correlated response or the deadline.
    ///
    /// Must be awaited inside a Tokio runtime: the deadline runs as a spawned
    /// timer task.
    pub async fn request(
        &self,
        kind: MessageType,
        payload: Option<Value>,
    ) -> Result<Value, ClientError> {
        self.ensure_dispatchable()?;

        let (id, receiver) = self.table.register(kind);
        let envelope = RequestEnvelope::new(kind, id, payload);
        if let Err(e) = self.transport.send(&envelope) {
            self.table.discard(id);
            warn!(request_id = id, %kind, "failed to send request: {e}");
            return Err(e);
        }
        debug!(request_id = id, %kind, "sent request");
        self.schedule_deadline(id);

        match receiver.await {
            Ok(completion) => completion,
            Err(_) => Err(ClientError::Abandoned(kind)),
        }
    }

    /// Fail fast when there is no host to talk to. Fallback operations never
    /// reach this point; the client answers them itself.
    fn ensure_dispatchable(&self) -> Result<(), ClientError> {
        match self.transport {
            Transport::Detached => Err(ClientError::NotEmbedded),
            Transport::LocalFallback => Err(ClientError::FallbackDispatch),
            Transport::NativeBridge(_) | Transport::EmbeddedChannel(_) => Ok(()),
        }
    }

    fn schedule_deadline(&self, id: u64) {
        let table = Arc::downgrade(&self.table);
        tokio::spawn(async move {
            tokio::time::sleep(REQUEST_TIMEOUT).await;
            let Some(table) = table.upgrade() else {
                return;
            };
            if table.expire(id) {
                warn!(request_id = id, "request timed out");
            }
        });
    }
}
