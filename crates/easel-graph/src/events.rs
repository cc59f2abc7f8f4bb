//! Event types for reporting node execution progress
//!
//! Events are sent from the node runner to the frontend (or any consumer)
//! to drive per-node run indicators and inline error states.

use serde::{Deserialize, Serialize};

/// Trait for sending engine events
///
/// Abstracts over the transport (UI channel, mpsc, etc.) so the engine can
/// be embedded in different hosts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g. channel closed)
    fn send(&self, event: EngineEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted around node execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    /// A node run was triggered and its inputs validated
    #[serde(rename_all = "camelCase")]
    RunStarted { node_id: String, invocation: u64 },

    /// A node run completed and its outputs were applied
    #[serde(rename_all = "camelCase")]
    RunCompleted { node_id: String, invocation: u64 },

    /// A node run failed; the node shows an inline error
    #[serde(rename_all = "camelCase")]
    RunFailed {
        node_id: String,
        invocation: u64,
        error: String,
    },

    /// A completion arrived after a newer run started (or the node was
    /// deleted) and was discarded
    #[serde(rename_all = "camelCase")]
    RunSuperseded { node_id: String, invocation: u64 },
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EngineEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for tests to verify emission order.
#[derive(Default)]
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<EngineEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All collected events
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().expect("event sink poisoned").clone()
    }

    /// Drop all collected events
    pub fn clear(&self) {
        self.events.lock().expect("event sink poisoned").clear();
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EngineEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError::channel_closed())?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink_collects() {
        let sink = VecEventSink::new();
        sink.send(EngineEvent::RunStarted {
            node_id: "gen-1".to_string(),
            invocation: 1,
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            EngineEvent::RunStarted { node_id, invocation } => {
                assert_eq!(node_id, "gen-1");
                assert_eq!(*invocation, 1);
            }
            _ => panic!("Expected RunStarted event"),
        }
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = EngineEvent::RunFailed {
            node_id: "gen-1".to_string(),
            invocation: 2,
            error: "no usable payload".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "runFailed");
        assert_eq!(json["nodeId"], "gen-1");
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        sink.send(EngineEvent::RunCompleted {
            node_id: "n".to_string(),
            invocation: 1,
        })
        .unwrap();
    }
}
