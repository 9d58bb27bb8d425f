//! Deals and their pipeline lifecycle.

use crate::domain::{DealId, MemberId, OrgId, Pence, TimeMs};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline state of a deal, ordered from intake to settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    ToDo,
    Done,
    Signed,
    Installed,
    Invoiced,
    Paid,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::ToDo => "to_do",
            DealStatus::Done => "done",
            DealStatus::Signed => "signed",
            DealStatus::Installed => "installed",
            DealStatus::Invoiced => "invoiced",
            DealStatus::Paid => "paid",
        }
    }

    /// Parse a status from its storage string.
    pub fn parse(s: &str) -> Option<DealStatus> {
        match s {
            "to_do" => Some(DealStatus::ToDo),
            "done" => Some(DealStatus::Done),
            "signed" => Some(DealStatus::Signed),
            "installed" => Some(DealStatus::Installed),
            "invoiced" => Some(DealStatus::Invoiced),
            "paid" => Some(DealStatus::Paid),
            _ => None,
        }
    }

    /// Deals are deletable only before they have downstream financial
    /// consequences; from `signed` onward they are part of the commission
    /// audit trail.
    pub fn allows_deletion(&self) -> bool {
        matches!(self, DealStatus::ToDo | DealStatus::Done)
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The derived profit split of a deal.
///
/// Invariant: `telesales_commission + remaining_profit == initial_profit`.
/// The split is recomputed wholesale whenever any input changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealFinancials {
    pub deal_value: Pence,
    pub buy_in_cost: Pence,
    pub installation_cost: Pence,
    pub misc_costs: Pence,
    pub initial_profit: Pence,
    pub telesales_commission: Pence,
    pub remaining_profit: Pence,
}

/// A sales deal owned by an organization.
///
/// Pipeline timestamps are stamped on first arrival at the matching status;
/// `paid_at` alone may be overridden by an explicit payload value, because it
/// is the authoritative instant that buckets the deal into a commission
/// month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub organization_id: OrgId,
    pub deal_number: String,
    pub customer_name: String,
    #[serde(flatten)]
    pub financials: DealFinancials,
    pub telesales_agent_id: MemberId,
    pub bdm_id: MemberId,
    pub status: DealStatus,
    pub signed_at: Option<TimeMs>,
    pub installed_at: Option<TimeMs>,
    pub invoiced_at: Option<TimeMs>,
    pub paid_at: Option<TimeMs>,
    pub notes: Option<String>,
    pub created_by: Option<MemberId>,
    pub created_at: TimeMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_storage_roundtrip() {
        for status in [
            DealStatus::ToDo,
            DealStatus::Done,
            DealStatus::Signed,
            DealStatus::Installed,
            DealStatus::Invoiced,
            DealStatus::Paid,
        ] {
            assert_eq!(DealStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(DealStatus::parse("shipped"), None);
    }

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&DealStatus::ToDo).unwrap(),
            "\"to_do\""
        );
        assert_eq!(serde_json::to_string(&DealStatus::Paid).unwrap(), "\"paid\"");
    }

    #[test]
    fn test_pipeline_ordering() {
        assert!(DealStatus::ToDo < DealStatus::Done);
        assert!(DealStatus::Done < DealStatus::Signed);
        assert!(DealStatus::Invoiced < DealStatus::Paid);
    }

    #[test]
    fn test_deletion_gate() {
        assert!(DealStatus::ToDo.allows_deletion());
        assert!(DealStatus::Done.allows_deletion());
        assert!(!DealStatus::Signed.allows_deletion());
        assert!(!DealStatus::Installed.allows_deletion());
        assert!(!DealStatus::Invoiced.allows_deletion());
        assert!(!DealStatus::Paid.allows_deletion());
    }
}
