//! The BDM deficit-threshold commission engine.
//!
//! Each month's outcome is a pure function of that month's pooled profit,
//! the organization settings, and the previous month's persisted record. A
//! missed threshold rolls the full shortfall forward as next month's extra
//! threshold; clearing the threshold by any margin wipes the accumulated
//! deficit entirely.

use crate::db::Repository;
use crate::domain::{
    CommissionRecord, MemberId, OrgId, Pence, Period, Rate, Role, TimeMs,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("organization {0} not found")]
    OrgNotFound(OrgId),
    #[error("BDM {bdm_id} not found in organization {organization_id}")]
    BdmNotFound {
        organization_id: OrgId,
        bdm_id: MemberId,
    },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Outcome of settling one month against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub threshold_needed: Pence,
    pub threshold_met: bool,
    pub excess_over_threshold: Pence,
    pub bdm_commission: Pence,
    pub deficit_to_next: Pence,
}

/// Settle a month's pooled profit against the accumulated threshold.
///
/// Met: commission is the rate-scaled excess and the deficit resets to zero
/// no matter how large the carried debt was; there is no partial clearing.
/// Missed: commission is zero and the full remaining gap, previous deficit
/// included, compounds forward uncapped.
pub fn settle(
    monthly_profit: Pence,
    base_threshold: Pence,
    previous_deficit: Pence,
    commission_rate: Rate,
) -> Settlement {
    let threshold_needed = base_threshold + previous_deficit;
    if monthly_profit >= threshold_needed {
        let excess = monthly_profit - threshold_needed;
        Settlement {
            threshold_needed,
            threshold_met: true,
            excess_over_threshold: excess,
            bdm_commission: excess.apply_rate(commission_rate),
            deficit_to_next: Pence::ZERO,
        }
    } else {
        Settlement {
            threshold_needed,
            threshold_met: false,
            excess_over_threshold: Pence::ZERO,
            bdm_commission: Pence::ZERO,
            deficit_to_next: threshold_needed - monthly_profit,
        }
    }
}

/// One BDM's commission outcome for a month, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCommissionResult {
    pub month: u32,
    pub year: i32,
    pub bdm_id: MemberId,
    pub monthly_profit: Pence,
    pub previous_deficit: Pence,
    pub threshold_needed: Pence,
    pub base_threshold: Pence,
    pub threshold_met: bool,
    pub excess_over_threshold: Pence,
    pub bdm_commission: Pence,
    pub deficit_to_next: Pence,
    pub deals_count: i64,
}

/// Repository-backed monthly commission calculator.
///
/// Stateless apart from the collaborator handle; safe to share and call
/// concurrently for different (org, BDM, period) keys.
#[derive(Clone)]
pub struct BdmCommissionEngine {
    repo: Arc<Repository>,
}

impl BdmCommissionEngine {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Compute a month's outcome without persisting anything.
    ///
    /// Settings are read fresh on every run. The previous period's deficit
    /// comes from whatever record is currently persisted for it (0 if none
    /// has been calculated yet); the engine never walks the chain backward,
    /// so callers wanting deficit correctness calculate months in order.
    ///
    /// # Errors
    /// Returns an error if the organization or BDM is missing, or any store
    /// read fails. Nothing is written in any failure case.
    pub async fn preview(
        &self,
        organization_id: OrgId,
        bdm_id: MemberId,
        period: Period,
    ) -> Result<MonthlyCommissionResult, CommissionError> {
        let settings = self
            .repo
            .get_commission_settings(organization_id)
            .await?
            .ok_or(CommissionError::OrgNotFound(organization_id))?;

        let bdm = self
            .repo
            .get_member(organization_id, bdm_id)
            .await?
            .filter(|m| m.role == Role::Bdm)
            .ok_or(CommissionError::BdmNotFound {
                organization_id,
                bdm_id,
            })?;

        let (monthly_profit, deals_count) = self
            .repo
            .sum_paid_remaining_profit(organization_id, bdm.id, period)
            .await?;

        let previous_deficit = self
            .repo
            .get_commission_record(organization_id, bdm_id, period.previous())
            .await?
            .map(|r| r.deficit_to_next)
            .unwrap_or(Pence::ZERO);

        let settlement = settle(
            monthly_profit,
            settings.bdm_threshold_amount,
            previous_deficit,
            settings.bdm_commission_rate,
        );

        debug!(
            %organization_id,
            %bdm_id,
            %period,
            monthly_profit = monthly_profit.as_i64(),
            threshold_needed = settlement.threshold_needed.as_i64(),
            threshold_met = settlement.threshold_met,
            "settled BDM month"
        );

        Ok(MonthlyCommissionResult {
            month: period.month,
            year: period.year,
            bdm_id,
            monthly_profit,
            previous_deficit,
            threshold_needed: settlement.threshold_needed,
            base_threshold: settings.bdm_threshold_amount,
            threshold_met: settlement.threshold_met,
            excess_over_threshold: settlement.excess_over_threshold,
            bdm_commission: settlement.bdm_commission,
            deficit_to_next: settlement.deficit_to_next,
            deals_count,
        })
    }

    /// Compute a month's outcome and upsert the settled record.
    ///
    /// The write is a single keyed upsert: re-running with unchanged deals
    /// and settings overwrites the row with identical values, and a storage
    /// failure anywhere leaves no partial record behind.
    pub async fn calculate(
        &self,
        organization_id: OrgId,
        bdm_id: MemberId,
        period: Period,
        calculated_by: Option<MemberId>,
    ) -> Result<MonthlyCommissionResult, CommissionError> {
        let result = self.preview(organization_id, bdm_id, period).await?;

        let record = CommissionRecord {
            organization_id,
            bdm_id,
            month: result.month,
            year: result.year,
            monthly_profit: result.monthly_profit,
            previous_deficit: result.previous_deficit,
            threshold_needed: result.threshold_needed,
            base_threshold: result.base_threshold,
            threshold_met: result.threshold_met,
            excess_over_threshold: result.excess_over_threshold,
            bdm_commission: result.bdm_commission,
            deficit_to_next: result.deficit_to_next,
            deals_count: result.deals_count,
            calculated_by,
            calculated_at: TimeMs::now(),
        };
        self.repo.upsert_commission_record(&record).await?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn rate(s: &str) -> Rate {
        use std::str::FromStr;
        Rate::try_new(Decimal::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn test_threshold_met_clears_any_deficit() {
        // threshold 350000, carried deficit 200000 -> needed 550000;
        // 600000 profit clears the lot and pays on the 50000 excess
        let s = settle(Pence(600_000), Pence(350_000), Pence(200_000), Rate::ONE);
        assert_eq!(s.threshold_needed, Pence(550_000));
        assert!(s.threshold_met);
        assert_eq!(s.excess_over_threshold, Pence(50_000));
        assert_eq!(s.bdm_commission, Pence(50_000));
        assert_eq!(s.deficit_to_next, Pence::ZERO);
    }

    #[test]
    fn test_clearing_by_one_penny_wipes_large_deficit() {
        let s = settle(Pence(1_000_001), Pence(350_000), Pence(650_001), Rate::ONE);
        assert!(s.threshold_met);
        assert_eq!(s.excess_over_threshold, Pence::ZERO);
        assert_eq!(s.bdm_commission, Pence::ZERO);
        assert_eq!(s.deficit_to_next, Pence::ZERO);
    }

    #[test]
    fn test_exact_threshold_counts_as_met() {
        let s = settle(Pence(350_000), Pence(350_000), Pence::ZERO, Rate::ONE);
        assert!(s.threshold_met);
        assert_eq!(s.excess_over_threshold, Pence::ZERO);
        assert_eq!(s.deficit_to_next, Pence::ZERO);
    }

    #[test]
    fn test_miss_carries_full_gap_forward() {
        let s = settle(Pence(100_000), Pence(350_000), Pence::ZERO, Rate::ONE);
        assert!(!s.threshold_met);
        assert_eq!(s.bdm_commission, Pence::ZERO);
        assert_eq!(s.excess_over_threshold, Pence::ZERO);
        assert_eq!(s.deficit_to_next, Pence(250_000));
    }

    #[test]
    fn test_deficit_compounds_with_no_activity() {
        // month 1: 100000 against 350000 -> deficit 250000
        let first = settle(Pence(100_000), Pence(350_000), Pence::ZERO, Rate::ONE);
        assert_eq!(first.deficit_to_next, Pence(250_000));
        // month 2: nothing paid -> deficit grows to the full 600000 needed
        let second = settle(Pence::ZERO, Pence(350_000), first.deficit_to_next, Rate::ONE);
        assert_eq!(second.threshold_needed, Pence(600_000));
        assert_eq!(second.deficit_to_next, Pence(600_000));
    }

    #[test]
    fn test_commission_rate_scales_excess() {
        let s = settle(Pence(400_000), Pence(350_000), Pence::ZERO, rate("0.5"));
        assert!(s.threshold_met);
        assert_eq!(s.excess_over_threshold, Pence(50_000));
        assert_eq!(s.bdm_commission, Pence(25_000));
    }

    #[test]
    fn test_commission_rounding_half_up() {
        // excess 15p at 10% -> 1.5p -> 2p
        let s = settle(Pence(350_015), Pence(350_000), Pence::ZERO, rate("0.1"));
        assert_eq!(s.excess_over_threshold, Pence(15));
        assert_eq!(s.bdm_commission, Pence(2));
    }

    #[test]
    fn test_zero_threshold_pays_from_first_penny() {
        let s = settle(Pence(123), Pence::ZERO, Pence::ZERO, Rate::ONE);
        assert!(s.threshold_met);
        assert_eq!(s.bdm_commission, Pence(123));
    }
}
