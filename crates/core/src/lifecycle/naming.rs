//! Ticket channel names.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::panel::TicketPreset;

pub const TICKET_PREFIX: &str = "ticket-";
pub const ARCHIVED_PREFIX: &str = "archived-";

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static NON_CHANNEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_-]").unwrap());

/// Slug for the ticket kind: the preset's kind (or label), else `general`.
pub fn preset_slug(preset: Option<&TicketPreset>) -> String {
    let source = preset
        .map(|p| {
            if p.kind().is_empty() {
                p.label.as_str()
            } else {
                p.kind()
            }
        })
        .unwrap_or("general")
        .to_lowercase();
    let slug = NON_SLUG.replace_all(&source, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "general".to_string()
    } else {
        slug.to_string()
    }
}

/// `ticket-<kind>-<username>`, lowercased, restricted to `[a-z0-9_-]`.
pub fn ticket_channel_name(preset: Option<&TicketPreset>, username: &str) -> String {
    let raw = format!("{}{}-{}", TICKET_PREFIX, preset_slug(preset), username).to_lowercase();
    NON_CHANNEL.replace_all(&raw, "").into_owned()
}

/// Name for an archived ticket; names without the ticket prefix are kept.
pub fn archived_channel_name(name: &str) -> Option<String> {
    name.strip_prefix(TICKET_PREFIX)
        .map(|rest| format!("{}{}", ARCHIVED_PREFIX, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(id: &str, label: &str) -> TicketPreset {
        TicketPreset {
            id: id.to_string(),
            label: label.to_string(),
            target_id: None,
            welcome_message: None,
        }
    }

    #[test]
    fn test_default_name() {
        assert_eq!(ticket_channel_name(None, "Alice"), "ticket-general-alice");
    }

    #[test]
    fn test_name_strips_disallowed_characters() {
        assert_eq!(
            ticket_channel_name(None, "Bob.Smith ✨"),
            "ticket-general-bobsmith"
        );
        assert_eq!(ticket_channel_name(None, "under_score"), "ticket-general-under_score");
    }

    #[test]
    fn test_preset_slug() {
        assert_eq!(preset_slug(Some(&preset("Bug Report", "x"))), "bug-report");
        assert_eq!(
            preset_slug(Some(&preset("select:topics:billing", "Billing"))),
            "billing"
        );
        assert_eq!(preset_slug(Some(&preset("select:topics:", "Sales Team"))), "sales-team");
        assert_eq!(preset_slug(Some(&preset("!!!", "x"))), "general");
    }

    #[test]
    fn test_archived_name() {
        assert_eq!(
            archived_channel_name("ticket-general-alice").as_deref(),
            Some("archived-general-alice")
        );
        assert_eq!(archived_channel_name("random"), None);
    }
}
