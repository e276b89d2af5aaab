//! Types exchanged with the channel gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Permissions;

/// Custom id carried by the close button on the welcome message.
pub const CLOSE_BUTTON_ID: &str = "ticket_close";

/// Kind of a guild channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Announcement,
    Other,
}

impl ChannelKind {
    /// Map Discord's numeric channel type.
    pub fn from_discord(value: u8) -> Self {
        match value {
            0 => Self::Text,
            2 => Self::Voice,
            4 => Self::Category,
            5 => Self::Announcement,
            _ => Self::Other,
        }
    }
}

/// A guild channel as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<String>,
}

/// Whether an overwrite targets a role or a single member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteKind {
    Role,
    Member,
}

impl OverwriteKind {
    pub fn as_discord(self) -> u8 {
        match self {
            Self::Role => 0,
            Self::Member => 1,
        }
    }
}

/// A per-channel permission overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    pub target_id: String,
    pub kind: OverwriteKind,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl PermissionOverwrite {
    pub fn role(target_id: impl Into<String>, allow: Permissions, deny: Permissions) -> Self {
        Self {
            target_id: target_id.into(),
            kind: OverwriteKind::Role,
            allow,
            deny,
        }
    }

    pub fn member(target_id: impl Into<String>, allow: Permissions, deny: Permissions) -> Self {
        Self {
            target_id: target_id.into(),
            kind: OverwriteKind::Member,
            allow,
            deny,
        }
    }
}

/// Request to create a text channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChannelRequest {
    pub name: String,
    pub parent_id: Option<String>,
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Minimal rich embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

/// A file sent along with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A message to post in a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    /// Label of a close button; the button uses [`CLOSE_BUTTON_ID`].
    pub close_button: Option<String>,
    pub attachment: Option<Attachment>,
}

impl OutgoingMessage {
    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_close_button(mut self, label: impl Into<String>) -> Self {
        self.close_button = Some(label.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// A message read back from channel history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub id: String,
    pub author_id: String,
    pub author_tag: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_kind_from_discord() {
        assert_eq!(ChannelKind::from_discord(0), ChannelKind::Text);
        assert_eq!(ChannelKind::from_discord(2), ChannelKind::Voice);
        assert_eq!(ChannelKind::from_discord(4), ChannelKind::Category);
        assert_eq!(ChannelKind::from_discord(5), ChannelKind::Announcement);
        assert_eq!(ChannelKind::from_discord(15), ChannelKind::Other);
    }

    #[test]
    fn test_outgoing_message_builder() {
        let msg = OutgoingMessage::embed(Embed {
            title: "Ticket opened".to_string(),
            description: "hello".to_string(),
            color: 0xff0000,
            footer: None,
        })
        .with_content("<@1>")
        .with_close_button("Close");

        assert_eq!(msg.content.as_deref(), Some("<@1>"));
        assert_eq!(msg.close_button.as_deref(), Some("Close"));
        assert!(msg.attachment.is_none());
    }
}
