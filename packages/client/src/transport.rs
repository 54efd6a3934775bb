//! Host environment probing and transport selection.
//!
//! A game either runs inside a nested document (an iframe-like embedded
//! channel that accepts structured values), inside a native WebView (a bridge
//! that accepts JSON strings), or standalone. The embedder describes what is
//! available with a [`HostEnvironment`]; [`Transport::select`] classifies it
//! once, at construction, and the choice never changes afterwards.
//!
//! | Probe result | Fallback | Transport |
//! |--------------|----------|-----------|
//! | native bridge present | any | [`Transport::NativeBridge`] |
//! | nested document only | any | [`Transport::EmbeddedChannel`] |
//! | neither | on | [`Transport::LocalFallback`] |
//! | neither | off | [`Transport::Detached`] |

use std::sync::Arc;

use kruzic_protocol::RequestEnvelope;
use serde_json::Value;

use crate::config::ClientOptions;
use crate::error::ClientError;

/// Target origin used for every embedded-channel post. The host restricts
/// delivery on its side.
pub const TARGET_ORIGIN: &str = "*";

// ---------------------------------------------------------------------------
// Host capabilities
// ---------------------------------------------------------------------------

/// A host primitive rejected an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport write failed: {0}")]
pub struct TransportError(pub String);

/// The enclosing document of a nested game surface.
pub trait ParentFrame: Send + Sync + 'static {
    /// Deliver a structured value to the parent document.
    fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), TransportError>;
}

/// The message bridge injected by a native WebView container.
pub trait NativeBridge: Send + Sync + 'static {
    /// Deliver a serialised message to the native side.
    fn post_message(&self, message: &str) -> Result<(), TransportError>;
}

/// Callback invoked once per inbound message event.
pub type MessageHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle returned by [`MessageEvents::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The inbound message-event source of the game's own window.
pub trait MessageEvents: Send + Sync + 'static {
    fn add_listener(&self, handler: MessageHandler) -> ListenerId;
    fn remove_listener(&self, id: ListenerId);
}

/// What the game's surroundings offer. Built by the embedder; probing it has
/// no side effects.
#[derive(Clone, Default)]
pub struct HostEnvironment {
    parent: Option<Arc<dyn ParentFrame>>,
    bridge: Option<Arc<dyn NativeBridge>>,
    events: Option<Arc<dyn MessageEvents>>,
}

impl HostEnvironment {
    /// A top-level surface with no host at all.
    pub fn standalone() -> Self {
        Self::default()
    }

    pub fn with_parent_frame(mut self, parent: Arc<dyn ParentFrame>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_native_bridge(mut self, bridge: Arc<dyn NativeBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_message_events(mut self, events: Arc<dyn MessageEvents>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn is_nested_document(&self) -> bool {
        self.parent.is_some()
    }

    pub fn is_native_bridge(&self) -> bool {
        self.bridge.is_some()
    }

    pub fn message_events(&self) -> Option<&Arc<dyn MessageEvents>> {
        self.events.as_ref()
    }
}

impl std::fmt::Debug for HostEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostEnvironment")
            .field("nested_document", &self.is_nested_document())
            .field("native_bridge", &self.is_native_bridge())
            .field("message_events", &self.events.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// InstanceIdentity
// ---------------------------------------------------------------------------

/// The classification computed once when a client is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    pub nested_document: bool,
    pub native_bridge: bool,
    /// `nested_document || native_bridge`.
    pub embedded: bool,
    /// Local fallback requested, explicitly or because the game is not embedded.
    pub fallback: bool,
    /// Game id that namespaces fallback storage keys.
    pub namespace: String,
}

impl InstanceIdentity {
    pub fn probe(env: &HostEnvironment, options: &ClientOptions) -> Self {
        let nested_document = env.is_nested_document();
        let native_bridge = env.is_native_bridge();
        let embedded = nested_document || native_bridge;
        Self {
            nested_document,
            native_bridge,
            embedded,
            fallback: options.dev_mode.unwrap_or(!embedded),
            namespace: options.namespace().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Which delivery path an instance uses, as a plain tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    LocalFallback,
    NativeBridge,
    EmbeddedChannel,
    Detached,
}

/// The single delivery path of a client instance.
#[derive(Clone)]
pub enum Transport {
    /// Operations are served from the local store; nothing is sent.
    LocalFallback,
    /// Envelopes are serialised to JSON and handed to the native bridge.
    NativeBridge(Arc<dyn NativeBridge>),
    /// Envelopes are posted as structured values to the parent document.
    EmbeddedChannel(Arc<dyn ParentFrame>),
    /// Not embedded and fallback disabled; every round trip fails.
    Detached,
}

impl Transport {
    /// Classify the environment. The native bridge wins when both probes
    /// succeed.
    pub fn select(env: &HostEnvironment, identity: &InstanceIdentity) -> Self {
        if let Some(bridge) = &env.bridge {
            Transport::NativeBridge(Arc::clone(bridge))
        } else if let Some(parent) = &env.parent {
            Transport::EmbeddedChannel(Arc::clone(parent))
        } else if identity.fallback {
            Transport::LocalFallback
        } else {
            Transport::Detached
        }
    }

    pub fn mode(&self) -> TransportMode {
        match self {
            Transport::LocalFallback => TransportMode::LocalFallback,
            Transport::NativeBridge(_) => TransportMode::NativeBridge,
            Transport::EmbeddedChannel(_) => TransportMode::EmbeddedChannel,
            Transport::Detached => TransportMode::Detached,
        }
    }

    /// `true` when envelopes can actually reach a host.
    pub fn is_embedded(&self) -> bool {
        matches!(
            self,
            Transport::NativeBridge(_) | Transport::EmbeddedChannel(_)
        )
    }

    /// Write one envelope to the host. Never writes more than once.
    pub fn send(&self, envelope: &RequestEnvelope) -> Result<(), ClientError> {
        match self {
            Transport::NativeBridge(bridge) => {
                let text = serde_json::to_string(envelope).map_err(|source| {
                    ClientError::Encode {
                        kind: envelope.kind,
                        source,
                    }
                })?;
                bridge.post_message(&text)?;
                Ok(())
            }
            Transport::EmbeddedChannel(parent) => {
                let value = serde_json::to_value(envelope).map_err(|source| {
                    ClientError::Encode {
                        kind: envelope.kind,
                        source,
                    }
                })?;
                parent.post_message(&value, TARGET_ORIGIN)?;
                Ok(())
            }
            Transport::LocalFallback => Err(ClientError::FallbackDispatch),
            Transport::Detached => Err(ClientError::NotEmbedded),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transport::{:?}", self.mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use kruzic_protocol::MessageType;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingParent(Mutex<Vec<(Value, String)>>);

    impl ParentFrame for RecordingParent {
        fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), TransportError> {
            self.0
                .lock()
                .unwrap()
                .push((message.clone(), target_origin.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingBridge(Mutex<Vec<String>>);

    impl NativeBridge for RecordingBridge {
        fn post_message(&self, message: &str) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn select(env: &HostEnvironment, options: &ClientOptions) -> (InstanceIdentity, Transport) {
        let identity = InstanceIdentity::probe(env, options);
        let transport = Transport::select(env, &identity);
        (identity, transport)
    }

    #[test]
    fn standalone_defaults_to_fallback() {
        let (identity, transport) = select(&HostEnvironment::standalone(), &ClientOptions::new());
        assert!(!identity.embedded);
        assert!(identity.fallback);
        assert_eq!(transport.mode(), TransportMode::LocalFallback);
    }

    #[test]
    fn standalone_without_fallback_is_detached() {
        let options = ClientOptions::new().dev_mode(false);
        let (_, transport) = select(&HostEnvironment::standalone(), &options);
        assert_eq!(transport.mode(), TransportMode::Detached);
        let env = RequestEnvelope::new(MessageType::GetUserId, 1, None);
        assert!(matches!(transport.send(&env), Err(ClientError::NotEmbedded)));
    }

    #[test]
    fn embedded_ignores_requested_fallback() {
        let env = HostEnvironment::standalone().with_parent_frame(Arc::new(RecordingParent::default()));
        let options = ClientOptions::new().dev_mode(true);
        let (identity, transport) = select(&env, &options);
        assert!(identity.embedded && identity.fallback);
        assert_eq!(transport.mode(), TransportMode::EmbeddedChannel);
    }

    #[test]
    fn native_bridge_wins_over_nested_document() {
        let env = HostEnvironment::standalone()
            .with_parent_frame(Arc::new(RecordingParent::default()))
            .with_native_bridge(Arc::new(RecordingBridge::default()));
        let (identity, transport) = select(&env, &ClientOptions::new());
        assert!(identity.nested_document && identity.native_bridge);
        assert!(!identity.fallback);
        assert_eq!(transport.mode(), TransportMode::NativeBridge);
    }

    #[test]
    fn embedded_channel_posts_structured_value_to_any_origin() {
        let parent = Arc::new(RecordingParent::default());
        let transport = Transport::EmbeddedChannel(parent.clone());
        let env = RequestEnvelope::new(MessageType::GetUserData, 5, Some(json!({ "key": "k" })));
        transport.send(&env).unwrap();

        let sent = parent.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0["requestId"], 5);
        assert_eq!(sent[0].1, "*");
    }

    #[test]
    fn native_bridge_posts_json_text() {
        let bridge = Arc::new(RecordingBridge::default());
        let transport = Transport::NativeBridge(bridge.clone());
        transport
            .send(&RequestEnvelope::new(MessageType::IsUserSignedIn, 2, None))
            .unwrap();

        let sent = bridge.0.lock().unwrap();
        let parsed: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(parsed, json!({ "type": "IS_USER_SIGNED_IN", "requestId": 2 }));
    }
}
