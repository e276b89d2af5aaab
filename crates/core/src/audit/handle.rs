use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::TicketEvent;

/// Envelope wrapping an event with its timestamp
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: TicketEvent,
}

/// Handle for emitting events
///
/// This is cheaply cloneable and can be shared across tasks.
/// Events are sent through an async channel to be written by the EventWriter.
#[derive(Clone)]
pub struct EventHandle {
    tx: mpsc::Sender<EventEnvelope>,
}

impl EventHandle {
    pub fn new(tx: mpsc::Sender<EventEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an event.
    ///
    /// If the channel is closed, the error is logged but the caller is not failed.
    pub async fn emit(&self, event: TicketEvent) {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if let Err(e) = self.tx.send(envelope).await {
            tracing::error!("Failed to emit event: {}", e);
        }
    }

    /// Try to emit an event without waiting for buffer space.
    ///
    /// Returns true if the event was queued.
    pub fn try_emit(&self, event: TicketEvent) -> bool {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to emit event: {}", e);
                false
            }
        }
    }

    /// Events queued but not yet taken by the writer.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}
