//! Staff capability checks.
//!
//! Callers normalize whatever member shape the platform hands them into
//! [`MemberCapabilities`]; every privilege decision goes through
//! [`AccessPolicy`].

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::gateway::Permissions;
use crate::index::TicketRecord;

/// What the platform tells us about a guild member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCapabilities {
    #[serde(default)]
    pub role_ids: Vec<String>,
    /// Resolved guild permissions, when the caller has them.
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

impl MemberCapabilities {
    pub fn with_roles<I, S>(role_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role_ids: role_ids.into_iter().map(Into::into).collect(),
            permissions: None,
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

/// Staff role configuration plus the rules built on it.
pub struct AccessPolicy {
    staff_role_ids: RwLock<Vec<String>>,
}

impl AccessPolicy {
    pub fn new(staff_role_ids: Vec<String>) -> Self {
        Self {
            staff_role_ids: RwLock::new(staff_role_ids),
        }
    }

    pub fn staff_roles(&self) -> Vec<String> {
        self.staff_role_ids
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the staff role set. Affects tickets created from now on.
    pub fn set_staff_roles(&self, role_ids: Vec<String>) {
        *self
            .staff_role_ids
            .write()
            .unwrap_or_else(|e| e.into_inner()) = role_ids;
    }

    pub fn has_staff_role(&self, role_ids: &[String]) -> bool {
        let staff = self.staff_role_ids.read().unwrap_or_else(|e| e.into_inner());
        role_ids.iter().any(|id| staff.contains(id))
    }

    /// Administrator or Manage Channels.
    pub fn has_elevated_permission(&self, permissions: Permissions) -> bool {
        permissions.intersects(Permissions::ADMINISTRATOR | Permissions::MANAGE_CHANNELS)
    }

    pub fn is_staff(&self, caps: &MemberCapabilities) -> bool {
        self.has_staff_role(&caps.role_ids)
            || caps
                .permissions
                .is_some_and(|p| self.has_elevated_permission(p))
    }

    /// Staff may close any ticket; everyone else only their own.
    pub fn can_close(&self, caps: &MemberCapabilities, user_id: &str, record: &TicketRecord) -> bool {
        record.opener_id == user_id || self.is_staff(caps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn policy() -> AccessPolicy {
        AccessPolicy::new(vec!["staff".to_string()])
    }

    #[test]
    fn test_staff_by_role() {
        let policy = policy();
        assert!(policy.is_staff(&MemberCapabilities::with_roles(["other", "staff"])));
        assert!(!policy.is_staff(&MemberCapabilities::with_roles(["other"])));
    }

    #[test]
    fn test_staff_by_permission() {
        let policy = policy();
        let admin = MemberCapabilities::default().with_permissions(Permissions::ADMINISTRATOR);
        let manager = MemberCapabilities::default().with_permissions(Permissions::MANAGE_CHANNELS);
        let member = MemberCapabilities::default()
            .with_permissions(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES);

        assert!(policy.is_staff(&admin));
        assert!(policy.is_staff(&manager));
        assert!(!policy.is_staff(&member));
    }

    #[test]
    fn test_set_staff_roles_replaces_set() {
        let policy = policy();
        policy.set_staff_roles(vec!["mods".to_string()]);

        assert_eq!(policy.staff_roles(), vec!["mods".to_string()]);
        assert!(!policy.has_staff_role(&["staff".to_string()]));
        assert!(policy.has_staff_role(&["mods".to_string()]));
    }

    #[test]
    fn test_can_close_opener_or_staff() {
        let policy = policy();
        let record = TicketRecord::new("c1", "opener", Utc::now());
        let nobody = MemberCapabilities::default();

        assert!(policy.can_close(&nobody, "opener", &record));
        assert!(!policy.can_close(&nobody, "stranger", &record));
        assert!(policy.can_close(
            &MemberCapabilities::with_roles(["staff"]),
            "stranger",
            &record
        ));
    }
}
