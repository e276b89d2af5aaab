use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::html::render_transcript;
use super::{CloseInfo, TranscriptError, TranscriptMessage};

const TRANSCRIPT_FILE: &str = "transcript.html";
const MESSAGE_LOG_FILE: &str = "messages.jsonl";

/// Files kept per ticket under `<data_dir>/tickets/<channel_id>/`.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    root: PathBuf,
}

impl TranscriptStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join("tickets"),
        }
    }

    pub fn ticket_dir(&self, channel_id: &str) -> PathBuf {
        self.root.join(channel_id)
    }

    pub fn transcript_path(&self, channel_id: &str) -> PathBuf {
        self.ticket_dir(channel_id).join(TRANSCRIPT_FILE)
    }

    pub fn message_log_path(&self, channel_id: &str) -> PathBuf {
        self.ticket_dir(channel_id).join(MESSAGE_LOG_FILE)
    }

    /// Render and write the transcript, replacing any previous one.
    pub async fn write_transcript(
        &self,
        channel_id: &str,
        messages: &[TranscriptMessage],
        close: Option<&CloseInfo>,
    ) -> Result<PathBuf, TranscriptError> {
        fs::create_dir_all(self.ticket_dir(channel_id)).await?;

        let path = self.transcript_path(channel_id);
        let html = render_transcript(channel_id, messages, close);
        fs::write(&path, html).await?;

        debug!(
            channel_id = %channel_id,
            messages = messages.len(),
            "Transcript written to {}",
            path.display()
        );
        Ok(path)
    }

    /// Append one JSON line to the ticket's message log.
    pub async fn append_message(
        &self,
        channel_id: &str,
        message: &TranscriptMessage,
    ) -> Result<(), TranscriptError> {
        fs::create_dir_all(self.ticket_dir(channel_id)).await?;

        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.message_log_path(channel_id))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Raw transcript bytes, for attaching to an archive notification.
    pub async fn read(&self, channel_id: &str) -> Result<Vec<u8>, TranscriptError> {
        Ok(fs::read(self.transcript_path(channel_id)).await?)
    }

    /// Every logged message for the ticket, oldest first.
    pub async fn read_message_log(
        &self,
        channel_id: &str,
    ) -> Result<Vec<TranscriptMessage>, TranscriptError> {
        let content = match fs::read_to_string(self.message_log_path(channel_id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(TranscriptError::from))
            .collect()
    }
}
