use thiserror::Error;

use super::EventEnvelope;

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink error: {0}")]
    Sink(String),
}

/// Destination for event log entries.
pub trait EventSink: Send + Sync {
    fn append(&self, envelope: &EventEnvelope) -> Result<(), EventLogError>;
}

/// Format an envelope as one `[<rfc3339>] [<type>] <message>` line, without newline.
pub fn format_line(envelope: &EventEnvelope) -> String {
    format!(
        "[{}] [{}] {}",
        envelope
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        envelope.event.event_type(),
        envelope.event.message()
    )
}
