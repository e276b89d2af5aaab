//! Per-ticket transcripts and message logs.

mod html;
mod store;
mod types;

pub use html::render_transcript;
pub use store::TranscriptStore;
pub use types::{CloseInfo, TranscriptMessage};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("transcript IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
