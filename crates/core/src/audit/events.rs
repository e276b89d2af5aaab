use serde::{Deserialize, Serialize};

/// Event log entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Ticket lifecycle
    TicketOpened {
        channel_id: String,
        opener_id: String,
        opener_tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preset_id: Option<String>,
    },
    TicketClosed {
        channel_id: String,
        closed_by: String,
        closer_tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    TicketAutoClosed {
        channel_id: String,
        idle_hours: i64,
    },
    /// A best-effort close step failed; the close went on.
    ArchiveStepFailed {
        channel_id: String,
        step: String,
        error: String,
    },
    MemberAdded {
        channel_id: String,
        user_id: String,
        added_by: String,
    },
    MemberRemoved {
        channel_id: String,
        user_id: String,
        removed_by: String,
    },
    /// An index record pointed at a channel that no longer exists.
    StaleRecordPurged {
        channel_id: String,
        opener_id: String,
    },
    /// A channel was provisioned but its record could not be stored.
    OrphanChannel {
        channel_id: String,
        opener_id: String,
        error: String,
    },

    // Administration
    StaffRolesChanged {
        role_ids: Vec<String>,
    },
    PanelSaved {
        panel_id: String,
    },
    PanelRemoved {
        panel_id: String,
    },
}

impl TicketEvent {
    /// Get the event type as a string (for storage/filtering)
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TicketOpened { .. } => "ticket_opened",
            Self::TicketClosed { .. } => "ticket_closed",
            Self::TicketAutoClosed { .. } => "ticket_auto_closed",
            Self::ArchiveStepFailed { .. } => "archive_step_failed",
            Self::MemberAdded { .. } => "member_added",
            Self::MemberRemoved { .. } => "member_removed",
            Self::StaleRecordPurged { .. } => "stale_record_purged",
            Self::OrphanChannel { .. } => "orphan_channel",
            Self::StaffRolesChanged { .. } => "staff_roles_changed",
            Self::PanelSaved { .. } => "panel_saved",
            Self::PanelRemoved { .. } => "panel_removed",
        }
    }

    /// The ticket channel this event concerns, if any.
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::TicketOpened { channel_id, .. }
            | Self::TicketClosed { channel_id, .. }
            | Self::TicketAutoClosed { channel_id, .. }
            | Self::ArchiveStepFailed { channel_id, .. }
            | Self::MemberAdded { channel_id, .. }
            | Self::MemberRemoved { channel_id, .. }
            | Self::StaleRecordPurged { channel_id, .. }
            | Self::OrphanChannel { channel_id, .. } => Some(channel_id),
            _ => None,
        }
    }

    /// Human-readable one-line description.
    pub fn message(&self) -> String {
        match self {
            Self::ServiceStarted {
                version,
                config_hash,
            } => format!("Service {} started (config {})", version, config_hash),
            Self::ServiceStopped { reason } => format!("Service stopped: {}", reason),
            Self::TicketOpened {
                channel_id,
                opener_tag,
                preset_id,
                ..
            } => match preset_id {
                Some(preset) => format!(
                    "Ticket {} opened by {} from preset {}",
                    channel_id, opener_tag, preset
                ),
                None => format!("Ticket {} opened by {}", channel_id, opener_tag),
            },
            Self::TicketClosed {
                channel_id,
                closer_tag,
                reason,
                ..
            } => format!(
                "Ticket {} closed by {}. Reason: {}",
                channel_id,
                closer_tag,
                reason.as_deref().unwrap_or("n/a")
            ),
            Self::TicketAutoClosed {
                channel_id,
                idle_hours,
            } => format!(
                "Ticket {} closed automatically after {}h of inactivity",
                channel_id, idle_hours
            ),
            Self::ArchiveStepFailed {
                channel_id,
                step,
                error,
            } => format!("Ticket {}: step {} failed: {}", channel_id, step, error),
            Self::MemberAdded {
                channel_id,
                user_id,
                added_by,
            } => format!("Added {} to {} by {}", user_id, channel_id, added_by),
            Self::MemberRemoved {
                channel_id,
                user_id,
                removed_by,
            } => format!("Removed {} from {} by {}", user_id, channel_id, removed_by),
            Self::StaleRecordPurged {
                channel_id,
                opener_id,
            } => format!(
                "Dropped record for missing channel {} (opener {})",
                channel_id, opener_id
            ),
            Self::OrphanChannel {
                channel_id,
                opener_id,
                error,
            } => format!(
                "Channel {} for {} has no index record: {}",
                channel_id, opener_id, error
            ),
            Self::StaffRolesChanged { role_ids } => {
                format!("Staff roles set to [{}]", role_ids.join(", "))
            }
            Self::PanelSaved { panel_id } => format!("Panel {} saved", panel_id),
            Self::PanelRemoved { panel_id } => format!("Panel {} removed", panel_id),
        }
    }
}
