use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::ChannelMessage;

/// A message as kept in transcripts and in `messages.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    pub id: String,
    pub author_id: String,
    pub author_tag: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ChannelMessage> for TranscriptMessage {
    fn from(message: &ChannelMessage) -> Self {
        Self {
            id: message.id.clone(),
            author_id: message.author_id.clone(),
            author_tag: message.author_tag.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

/// Who closed the ticket, as claimed and as observed.
///
/// `stated_closer` is free text supplied with the close command and may
/// differ from the user who actually ran it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseInfo {
    pub stated_closer: Option<String>,
    pub actual_closer_id: Option<String>,
    pub actual_closer_tag: Option<String>,
}

impl CloseInfo {
    pub fn is_empty(&self) -> bool {
        self.stated_closer.is_none() && self.actual_closer_id.is_none()
    }
}
