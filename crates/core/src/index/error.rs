//! Error types for the ticket index.

use thiserror::Error;

/// Reason a mutator refused to apply its change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("channel {0} is already indexed")]
    DuplicateChannel(String),

    #[error("user {opener_id} already has ticket {channel_id}")]
    DuplicateOpener {
        opener_id: String,
        channel_id: String,
    },

    #[error("no ticket for channel {0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),
}

/// Errors from the index store and the mutation queue.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The mutator returned an error; nothing was written.
    #[error("mutation rejected: {0}")]
    Rejected(MutationError),

    /// The index writer task is gone.
    #[error("index queue is closed")]
    QueueClosed,
}

impl IndexError {
    /// The mutator's own error, if that is why the job failed.
    pub fn as_rejection(&self) -> Option<&MutationError> {
        match self {
            Self::Rejected(e) => Some(e),
            _ => None,
        }
    }
}
