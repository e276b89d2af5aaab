//! Ticket index record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One open ticket.
///
/// Keys are camelCase so an index written by earlier deployments loads as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    /// Unique key.
    pub channel_id: String,
    pub opener_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    /// Ordered, duplicate free, always contains `opener_id`.
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome_message_id: Option<String>,
}

impl TicketRecord {
    /// A fresh record whose only member is the opener.
    pub fn new(
        channel_id: impl Into<String>,
        opener_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let opener_id = opener_id.into();
        Self {
            channel_id: channel_id.into(),
            members: vec![opener_id.clone()],
            opener_id,
            created_at: now,
            last_active_at: now,
            welcome_message_id: None,
        }
    }

    pub fn with_welcome_message(mut self, message_id: impl Into<String>) -> Self {
        self.welcome_message_id = Some(message_id.into());
        self
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    /// Adds `user_id` if absent. Returns whether the set changed.
    pub fn add_member(&mut self, user_id: &str) -> bool {
        if self.has_member(user_id) {
            return false;
        }
        self.members.push(user_id.to_string());
        true
    }

    /// Removes `user_id`; the opener is never removed. Returns whether the set changed.
    pub fn remove_member(&mut self, user_id: &str) -> bool {
        if user_id == self.opener_id {
            return false;
        }
        let before = self.members.len();
        self.members.retain(|m| m != user_id);
        self.members.len() != before
    }

    /// Advance `last_active_at`; never moves it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_active_at {
            self.last_active_at = now;
        }
    }

    /// Whether the ticket has been idle for at least `timeout`.
    pub fn is_idle(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        now - self.last_active_at >= timeout
    }
}
