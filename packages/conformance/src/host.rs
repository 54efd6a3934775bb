//! In-process stand-in for the container a game is embedded in.
//!
//! [`MockHost`] plays both host roles: the parent document of a nested game
//! (structured values in, structured values out) and a native WebView bridge
//! (JSON text in, JSON text out). Responses are delivered from a spawned task,
//! never from inside `post_message`, so the client sees them asynchronously
//! the way a real host delivers message events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use kruzic_client::{
    HostEnvironment, ListenerId, MessageEvents, MessageHandler, NativeBridge, ParentFrame,
    TransportError,
};
use kruzic_protocol::{
    DataKey, MessageType, RequestEnvelope, ResponseEnvelope, SetDataPayload, UserDetails,
};
use kruzic_server::KruzicServer;
use serde_json::{json, Value};
use tracing::debug;

/// Where a host keeps the signed-in user's data.
enum Backend {
    /// A per-host map, for tests that only exercise the client.
    Memory(Mutex<HashMap<String, Value>>),
    /// Forwarded to the platform through the server library.
    Relay(KruzicServer),
}

/// How a request reached the host, and therefore how to answer it.
#[derive(Clone, Copy)]
enum Channel {
    Structured,
    Text,
}

pub struct MockHost {
    me: Weak<MockHost>,
    user: Option<UserDetails>,
    backend: Backend,
    handlers: Mutex<Vec<(ListenerId, MessageHandler)>>,
    next_listener: AtomicU64,
    requests: Mutex<Vec<RequestEnvelope>>,
    silent: AtomicBool,
}

impl MockHost {
    fn build(user: Option<UserDetails>, backend: Backend) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            user,
            backend,
            handlers: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            requests: Mutex::new(Vec::new()),
            silent: AtomicBool::new(false),
        })
    }

    /// A host with a signed-in user and in-memory data.
    pub fn signed_in(user: UserDetails) -> Arc<Self> {
        Self::build(Some(user), Backend::Memory(Mutex::new(HashMap::new())))
    }

    /// A host whose player is not signed in. Data operations are rejected.
    pub fn signed_out() -> Arc<Self> {
        Self::build(None, Backend::Memory(Mutex::new(HashMap::new())))
    }

    /// A host that stores the user's data on the platform via `server`.
    pub fn relay(user: UserDetails, server: KruzicServer) -> Arc<Self> {
        Self::build(Some(user), Backend::Relay(server))
    }

    /// Stop answering requests. They are still recorded.
    pub fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::SeqCst);
    }

    /// Every envelope received so far, in arrival order.
    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.requests.lock().unwrap().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }

    /// A value held by an in-memory host, bypassing the client.
    pub fn stored(&self, key: &str) -> Option<Value> {
        match &self.backend {
            Backend::Memory(data) => data.lock().unwrap().get(key).cloned(),
            Backend::Relay(_) => None,
        }
    }

    /// Dispatch `event` to every registered listener, as the host's window
    /// would for a message event.
    pub fn deliver(&self, event: &Value) {
        let handlers: Vec<MessageHandler> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    fn receive(&self, request: RequestEnvelope, channel: Channel) {
        debug!(kind = %request.kind, id = request.request_id, "host received request");
        self.requests.lock().unwrap().push(request.clone());

        if !request.kind.expects_response() || self.silent.load(Ordering::SeqCst) {
            return;
        }
        let Some(host) = self.me.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let response = host.answer(&request).await;
            let event = match channel {
                Channel::Structured => serde_json::to_value(&response).unwrap(),
                Channel::Text => Value::String(serde_json::to_string(&response).unwrap()),
            };
            host.deliver(&event);
        });
    }

    async fn answer(&self, request: &RequestEnvelope) -> ResponseEnvelope {
        let id = request.request_id;
        match request.kind {
            MessageType::IsUserSignedIn => {
                return ResponseEnvelope::ok(id, Some(json!({ "signedIn": self.user.is_some() })));
            }
            MessageType::GetUserDetails => {
                let details = self.user.as_ref().map(|u| serde_json::to_value(u).unwrap());
                return ResponseEnvelope::ok(id, details);
            }
            MessageType::GetUserId => {
                let user_id = self.user.as_ref().map(|u| u.id.clone());
                return ResponseEnvelope::ok(id, Some(json!({ "userId": user_id })));
            }
            _ => {}
        }

        let Some(user) = &self.user else {
            return ResponseEnvelope::err(id, "User not signed in");
        };
        match self.data_operation(&user.id, request).await {
            Ok(data) => ResponseEnvelope::ok(id, data),
            Err(message) => ResponseEnvelope::err(id, message),
        }
    }

    async fn data_operation(
        &self,
        user_id: &str,
        request: &RequestEnvelope,
    ) -> Result<Option<Value>, String> {
        let payload = request.payload.clone().unwrap_or(Value::Null);
        match request.kind {
            MessageType::GetUserData => {
                let DataKey { key } = parse(payload)?;
                match &self.backend {
                    Backend::Memory(data) => Ok(data.lock().unwrap().get(&key).cloned()),
                    Backend::Relay(server) => server
                        .get_user_data(user_id, &key)
                        .await
                        .map_err(|e| e.to_string()),
                }
            }
            MessageType::SetUserData => {
                let SetDataPayload { key, value } = parse(payload)?;
                match &self.backend {
                    Backend::Memory(data) => {
                        data.lock().unwrap().insert(key, value);
                    }
                    Backend::Relay(server) => server
                        .set_user_data(user_id, &key, &value)
                        .await
                        .map_err(|e| e.to_string())?,
                }
                Ok(None)
            }
            MessageType::DeleteUserData => {
                let DataKey { key } = parse(payload)?;
                match &self.backend {
                    Backend::Memory(data) => {
                        data.lock().unwrap().remove(&key);
                    }
                    Backend::Relay(server) => server
                        .delete_user_data(user_id, &key)
                        .await
                        .map_err(|e| e.to_string())?,
                }
                Ok(None)
            }
            MessageType::ListUserData => {
                let keys = match &self.backend {
                    Backend::Memory(data) => data.lock().unwrap().keys().cloned().collect(),
                    Backend::Relay(server) => server
                        .list_user_data(user_id)
                        .await
                        .map_err(|e| e.to_string())?,
                };
                Ok(Some(json!(keys)))
            }
            other => Err(format!("Unsupported message type: {other}")),
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, String> {
    serde_json::from_value(payload).map_err(|e| format!("Invalid payload: {e}"))
}

impl ParentFrame for MockHost {
    fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), TransportError> {
        if target_origin != "*" {
            return Err(TransportError(format!("unexpected origin {target_origin}")));
        }
        let request = serde_json::from_value(message.clone())
            .map_err(|e| TransportError(e.to_string()))?;
        self.receive(request, Channel::Structured);
        Ok(())
    }
}

impl NativeBridge for MockHost {
    fn post_message(&self, message: &str) -> Result<(), TransportError> {
        let request =
            serde_json::from_str(message).map_err(|e| TransportError(e.to_string()))?;
        self.receive(request, Channel::Text);
        Ok(())
    }
}

impl MessageEvents for MockHost {
    fn add_listener(&self, handler: MessageHandler) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.handlers.lock().unwrap().push((id, handler));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.handlers.lock().unwrap().retain(|(i, _)| *i != id);
    }
}

/// The environment of a game running in a nested document under `host`.
pub fn nested_environment(host: &Arc<MockHost>) -> HostEnvironment {
    HostEnvironment::standalone()
        .with_parent_frame(host.clone())
        .with_message_events(host.clone())
}

/// The environment of a game running in a native WebView under `host`.
pub fn native_environment(host: &Arc<MockHost>) -> HostEnvironment {
    HostEnvironment::standalone()
        .with_native_bridge(host.clone())
        .with_message_events(host.clone())
}
