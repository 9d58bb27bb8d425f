//! The settled commission record, one per (organization, BDM, year, month).

use crate::domain::{MemberId, OrgId, Pence, TimeMs};
use serde::{Deserialize, Serialize};

/// A settled monthly BDM commission outcome.
///
/// Upserted by the deficit engine every time the period is recalculated; the
/// four-part key (organization, BDM, year, month) admits exactly one row.
/// `deficit_to_next` is the link consumed by the following month's
/// calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRecord {
    pub organization_id: OrgId,
    pub bdm_id: MemberId,
    pub month: u32,
    pub year: i32,
    /// Sum of remaining profit across the BDM's deals paid this month.
    pub monthly_profit: Pence,
    /// Deficit carried in from the previous month's record (0 if none).
    pub previous_deficit: Pence,
    /// `base_threshold + previous_deficit`.
    pub threshold_needed: Pence,
    /// Snapshot of the organization threshold at calculation time.
    pub base_threshold: Pence,
    pub threshold_met: bool,
    pub excess_over_threshold: Pence,
    pub bdm_commission: Pence,
    pub deficit_to_next: Pence,
    pub deals_count: i64,
    pub calculated_by: Option<MemberId>,
    pub calculated_at: TimeMs,
}
