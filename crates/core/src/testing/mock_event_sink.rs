//! In-memory event sink for testing.

use std::sync::Mutex;

use crate::audit::{EventEnvelope, EventLogError, EventSink, TicketEvent};

/// EventSink that keeps every envelope in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    envelopes: Mutex<Vec<EventEnvelope>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TicketEvent> {
        self.envelopes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|e| e.event.clone())
            .collect()
    }

    /// Event type tags in arrival order.
    pub fn event_types(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|e| e.event_type().to_string())
            .collect()
    }
}

impl EventSink for MemoryEventSink {
    fn append(&self, envelope: &EventEnvelope) -> Result<(), EventLogError> {
        self.envelopes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(envelope.clone());
        Ok(())
    }
}
