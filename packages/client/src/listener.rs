//! Inbound listener: turns host message events into table completions.
//!
//! The host's message channel is shared with whatever else the page or
//! container sends, so anything that is not a response envelope is dropped
//! without comment. Responses for ids the table no longer holds (timed out,
//! already answered, never issued) are dropped the same way; that is the
//! expected shape of a late reply, not a fault.

use std::sync::{Arc, Weak};

use kruzic_protocol::ResponseEnvelope;
use serde_json::Value;
use tracing::trace;

use crate::correlation::CorrelationTable;
use crate::transport::{ListenerId, MessageEvents, MessageHandler};

/// Decode one inbound event. Native bridges deliver JSON text, embedded
/// channels deliver structured values; both are accepted.
pub fn decode_event(event: &Value) -> Option<ResponseEnvelope> {
    match event {
        Value::String(text) => {
            let parsed: Value = serde_json::from_str(text).ok()?;
            ResponseEnvelope::from_event(&parsed)
        }
        other => ResponseEnvelope::from_event(other),
    }
}

/// Handle one inbound event against `table`. Returns `true` when it completed
/// a pending request.
pub fn handle_event(table: &CorrelationTable, event: &Value) -> bool {
    let Some(response) = decode_event(event) else {
        trace!("ignoring non-response message event");
        return false;
    };
    let id = response.request_id;
    let completed = table.complete(response);
    if !completed {
        trace!(request_id = id, "ignoring response for unknown request");
    }
    completed
}

/// A listener registered with the host's message-event source.
///
/// Deregisters itself when dropped. The handler only holds a weak reference
/// to the table, so a registration never keeps a torn-down client alive.
pub struct ListenerRegistration {
    events: Arc<dyn MessageEvents>,
    id: ListenerId,
}

impl ListenerRegistration {
    pub fn register(events: &Arc<dyn MessageEvents>, table: Weak<CorrelationTable>) -> Self {
        let handler: MessageHandler = Arc::new(move |event: &Value| {
            if let Some(table) = table.upgrade() {
                handle_event(&table, event);
            }
        });
        let id = events.add_listener(handler);
        Self {
            events: Arc::clone(events),
            id,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.events.remove_listener(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use kruzic_protocol::MessageType;
    use serde_json::json;

    #[derive(Default)]
    struct Events {
        handlers: Mutex<Vec<(ListenerId, MessageHandler)>>,
    }

    impl Events {
        fn emit(&self, event: Value) {
            let handlers: Vec<MessageHandler> =
                self.handlers.lock().unwrap().iter().map(|(_, h)| h.clone()).collect();
            for h in handlers {
                h(&event);
            }
        }
    }

    impl MessageEvents for Events {
        fn add_listener(&self, handler: MessageHandler) -> ListenerId {
            let mut handlers = self.handlers.lock().unwrap();
            let id = ListenerId(handlers.len() as u64 + 1);
            handlers.push((id, handler));
            id
        }

        fn remove_listener(&self, id: ListenerId) {
            self.handlers.lock().unwrap().retain(|(i, _)| *i != id);
        }
    }

    #[test]
    fn decodes_structured_and_text_events() {
        let v = json!({ "type": "RESPONSE", "requestId": 1, "success": true });
        assert!(decode_event(&v).is_some());
        assert!(decode_event(&Value::String(v.to_string())).is_some());
        assert!(decode_event(&json!("not json")).is_none());
        assert!(decode_event(&json!(17)).is_none());
    }

    #[tokio::test]
    async fn registered_listener_completes_requests() {
        let events = Arc::new(Events::default());
        let dyn_events: Arc<dyn MessageEvents> = events.clone();
        let table = Arc::new(CorrelationTable::new());
        let _reg = ListenerRegistration::register(&dyn_events, Arc::downgrade(&table));

        let (id, rx) = table.register(MessageType::GetUserId);
        events.emit(json!({ "type": "RESPONSE", "requestId": id, "success": true, "data": { "userId": "u1" } }));
        assert_eq!(rx.await.unwrap().unwrap(), json!({ "userId": "u1" }));
    }

    #[test]
    fn unrelated_traffic_leaves_table_untouched() {
        let table = CorrelationTable::new();
        let (id, _rx) = table.register(MessageType::GetUserId);
        assert!(!handle_event(&table, &json!({ "type": "GAME_READY", "requestId": id })));
        assert!(!handle_event(&table, &json!({ "type": "RESPONSE", "requestId": id + 1, "success": true })));
        assert!(!handle_event(&table, &json!({ "hello": "world" })));
        assert!(table.contains(id));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn dropping_registration_removes_listener() {
        let events = Arc::new(Events::default());
        let dyn_events: Arc<dyn MessageEvents> = events.clone();
        let table = Arc::new(CorrelationTable::new());
        let reg = ListenerRegistration::register(&dyn_events, Arc::downgrade(&table));
        assert_eq!(events.handlers.lock().unwrap().len(), 1);
        drop(reg);
        assert!(events.handlers.lock().unwrap().is_empty());
    }
}
