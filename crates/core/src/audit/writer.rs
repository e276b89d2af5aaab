use std::sync::Arc;

use tokio::sync::mpsc;

use super::{EventEnvelope, EventHandle, EventSink};

/// Background task that receives events and hands them to the sink
pub struct EventWriter {
    rx: mpsc::Receiver<EventEnvelope>,
    sink: Arc<dyn EventSink>,
}

impl EventWriter {
    pub fn new(rx: mpsc::Receiver<EventEnvelope>, sink: Arc<dyn EventSink>) -> Self {
        Self { rx, sink }
    }

    /// Run the writer, consuming events until every handle is dropped.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::info!("Event writer started");

        while let Some(envelope) = self.rx.recv().await {
            if let Err(e) = self.sink.append(&envelope) {
                tracing::error!(
                    event_type = envelope.event.event_type(),
                    "Failed to write event: {}",
                    e
                );
            }
        }

        tracing::info!("Event writer shutting down");
    }
}

/// Create the event log pipeline
///
/// Returns:
/// - `EventHandle` - for emitting events (clone this to share across tasks)
/// - `EventWriter` - spawn this as a background task with `tokio::spawn(writer.run())`
pub fn create_event_log(
    sink: Arc<dyn EventSink>,
    buffer_size: usize,
) -> (EventHandle, EventWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (EventHandle::new(tx), EventWriter::new(rx, sink))
}
