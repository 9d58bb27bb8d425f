//! Team members and their organization roles.

use crate::domain::{MemberId, OrgId, Pence, Rate, TimeMs};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a team member within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Telesales,
    Bdm,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Telesales => "telesales",
            Role::Bdm => "bdm",
        }
    }

    /// Parse a role from its storage string.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "telesales" => Some(Role::Telesales),
            "bdm" => Some(Role::Bdm),
            _ => None,
        }
    }

    /// Whether this role may change organization commission rules.
    pub fn can_edit_commission_rules(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Whether this role may manage team membership.
    pub fn can_manage_team(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A member of an organization's sales team.
///
/// `commission_rate` is an informational per-person figure; the telesales
/// split is a fixed 10% and the BDM payout uses the organization-wide rate,
/// so this field participates in neither calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: MemberId,
    pub organization_id: OrgId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub commission_rate: Rate,
    pub target_monthly: Option<Pence>,
    pub created_at: TimeMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_storage_roundtrip() {
        for role in [Role::Admin, Role::Manager, Role::Telesales, Role::Bdm] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("ceo"), None);
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::Bdm).unwrap();
        assert_eq!(json, "\"bdm\"");
    }

    #[test]
    fn test_commission_rule_permission_is_admin_only() {
        assert!(Role::Admin.can_edit_commission_rules());
        assert!(!Role::Manager.can_edit_commission_rules());
        assert!(!Role::Telesales.can_edit_commission_rules());
        assert!(!Role::Bdm.can_edit_commission_rules());
    }

    #[test]
    fn test_team_management_permission() {
        assert!(Role::Admin.can_manage_team());
        assert!(Role::Manager.can_manage_team());
        assert!(!Role::Telesales.can_manage_team());
        assert!(!Role::Bdm.can_manage_team());
    }
}
