use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::gateway::GatewayError;
use crate::index::{IndexError, MutationError};

/// A platform user as the lifecycle sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    /// Username; used in channel names and logs.
    pub name: String,
}

impl UserRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Why a lifecycle operation did not happen.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("rate limited for another {remaining_minutes} minute(s)")]
    RateLimited { remaining_minutes: u64 },

    #[error("a ticket creation is already in progress for this user")]
    AlreadyCreating,

    #[error("creation lock busy")]
    LockBusy,

    #[error("user already has ticket {channel_id}")]
    AlreadyOpen { channel_id: String },

    #[error("channel name already used by {channel_id}")]
    ChannelNameCollision { channel_id: String },

    #[error("channel {0} is not a ticket")]
    NotATicket(String),

    #[error("the opener cannot be removed from their own ticket")]
    CannotRemoveOpener,

    #[error("ticket {0} is already being closed")]
    AlreadyClosing(String),

    #[error("ticket {0} saw activity since it was found idle")]
    StillActive(String),

    #[error("chat platform error: {0}")]
    TransientCollaboratorFailure(#[from] GatewayError),

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

impl TicketError {
    /// Short reason suitable for the user who triggered the operation.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited { remaining_minutes } => format!(
                "You can open a new ticket in {} minute(s).",
                remaining_minutes
            ),
            Self::AlreadyCreating => {
                "You are already creating a ticket. Please wait a moment.".to_string()
            }
            Self::LockBusy => "Another ticket is being created. Please retry shortly.".to_string(),
            Self::AlreadyOpen { channel_id } => {
                format!("You already have an open ticket: <#{}>", channel_id)
            }
            Self::ChannelNameCollision { channel_id } => {
                format!("A channel with this name already exists: <#{}>", channel_id)
            }
            Self::NotATicket(_) => "This channel is not a ticket.".to_string(),
            Self::CannotRemoveOpener => {
                "The ticket opener cannot be removed from the ticket.".to_string()
            }
            Self::AlreadyClosing(_) => "This ticket is already being closed.".to_string(),
            Self::StillActive(_) => "This ticket is active again and was left open.".to_string(),
            Self::TransientCollaboratorFailure(_) => {
                "Discord did not respond as expected. Please try again.".to_string()
            }
            Self::PersistenceFailure(_) => {
                "Something went wrong while saving the ticket. Staff has been notified.".to_string()
            }
        }
    }

    /// Metric label for creation rejections.
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::AlreadyCreating => "already_creating",
            Self::LockBusy => "lock_busy",
            Self::AlreadyOpen { .. } => "already_open",
            Self::ChannelNameCollision { .. } => "name_collision",
            _ => "failed",
        }
    }
}

impl From<IndexError> for TicketError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::Rejected(MutationError::NotFound(channel_id)) => Self::NotATicket(channel_id),
            IndexError::Rejected(MutationError::DuplicateOpener { channel_id, .. }) => {
                Self::AlreadyOpen { channel_id }
            }
            other => Self::PersistenceFailure(other.to_string()),
        }
    }
}

/// What caused a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseTrigger {
    Manual,
    Inactivity,
}

impl CloseTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Inactivity => "inactivity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    /// Identity performing the close (the bot for automatic closes).
    pub executor: UserRef,
    pub reason: Option<String>,
    /// Self-reported closer name, e.g. from a close form.
    pub stated_closer: Option<String>,
    pub trigger: CloseTrigger,
    /// Close only if the ticket is still idle at close time.
    pub only_if_idle: Option<IdleCondition>,
}

/// Idleness a ticket must still show when its close actually starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleCondition {
    pub now: DateTime<Utc>,
    pub timeout: chrono::Duration,
}

impl CloseRequest {
    pub fn manual(executor: UserRef) -> Self {
        Self {
            executor,
            reason: None,
            stated_closer: None,
            trigger: CloseTrigger::Manual,
            only_if_idle: None,
        }
    }

    /// Automatic close of a ticket idle for at least `timeout` as of `now`.
    pub fn inactivity(
        executor: UserRef,
        reason: impl Into<String>,
        now: DateTime<Utc>,
        timeout: chrono::Duration,
    ) -> Self {
        Self {
            executor,
            reason: Some(reason.into()),
            stated_closer: None,
            trigger: CloseTrigger::Inactivity,
            only_if_idle: Some(IdleCondition { now, timeout }),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_stated_closer(mut self, closer: impl Into<String>) -> Self {
        self.stated_closer = Some(closer.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedTicket {
    pub channel_id: String,
    pub channel_name: String,
    pub welcome_message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedTicket {
    pub channel_id: String,
    pub opener_id: String,
    pub transcript_path: Option<PathBuf>,
    /// Best-effort steps that failed along the way.
    pub failed_steps: Vec<String>,
}

/// Everything the manager reads from configuration.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Guild id; doubles as the @everyone role id.
    pub guild_id: String,
    pub ticket_category_id: Option<String>,
    pub archive_target_id: Option<String>,
    pub rate_limit: Duration,
    pub welcome_message: String,
    pub closed_message: String,
    pub close_button_label: String,
    pub embed_color: u32,
    pub footer_text: String,
    /// Per-process id embedded in lock owner ids.
    pub instance_id: String,
}

impl LifecycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            guild_id: config.discord.guild_id.clone(),
            ticket_category_id: config.tickets.ticket_category_id.clone(),
            archive_target_id: config.tickets.archive_category_id.clone(),
            rate_limit: Duration::from_secs(config.tickets.rate_limit_minutes * 60),
            welcome_message: config.messages.ticket_welcome.clone(),
            closed_message: config.messages.ticket_closed.clone(),
            close_button_label: config.messages.close_button_label.clone(),
            embed_color: config.theme.color,
            footer_text: config.theme.footer_text.clone(),
            instance_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}
