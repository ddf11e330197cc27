//! Observability events attached to endpoints.

use std::sync::Mutex;

/// Event reasons emitted by the controller.
pub mod reasons {
    pub const TOKEN_CREATED: &str = "TokenCreated";
    pub const TOKEN_SAVED: &str = "TokenSaved";
    pub const TOKEN_DELETED: &str = "TokenDeleted";
    pub const TOKEN_ORPHANED: &str = "TokenOrphaned";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Normal,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Name of the endpoint the event is about.
    pub object: String,
    pub event_type: EventType,
    pub reason: &'static str,
    pub message: String,
}

pub trait EventRecorder: Send + Sync {
    fn record(&self, event: Event);
}

/// Writes events to the tracing subscriber.
#[derive(Debug, Clone, Default)]
pub struct LogRecorder;

impl EventRecorder for LogRecorder {
    fn record(&self, event: Event) {
        match event.event_type {
            EventType::Normal => tracing::info!(
                endpoint = %event.object,
                reason = event.reason,
                "{}",
                event.message
            ),
            EventType::Warning => tracing::warn!(
                endpoint = %event.object,
                reason = event.reason,
                "{}",
                event.message
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<Event>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("event lock poisoned").clone()
    }

    pub fn reasons(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.reason).collect()
    }
}

impl EventRecorder for MemoryRecorder {
    fn record(&self, event: Event) {
        self.events.lock().expect("event lock poisoned").push(event);
    }
}
