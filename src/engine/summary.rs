//! Organization-wide monthly commission report composition.

use crate::db::Repository;
use crate::domain::{MemberId, OrgId, Pence, Period};
use crate::engine::bdm::{BdmCommissionEngine, CommissionError, MonthlyCommissionResult};
use crate::engine::telesales::{TelesalesAggregator, TelesalesAgentSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The complete commission picture of an organization for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCommissionSummary {
    pub month: u32,
    pub year: i32,
    pub telesales: Vec<TelesalesAgentSummary>,
    pub bdms: Vec<MonthlyCommissionResult>,
    pub total_telesales_commission: Pence,
    pub total_bdm_commission: Pence,
    pub total_commissions: Pence,
}

/// Builds monthly summaries by composing the telesales aggregator and the
/// BDM engine.
#[derive(Clone)]
pub struct SummaryBuilder {
    repo: Arc<Repository>,
    telesales: TelesalesAggregator,
    bdm_engine: BdmCommissionEngine,
}

impl SummaryBuilder {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            telesales: TelesalesAggregator::new(repo.clone()),
            bdm_engine: BdmCommissionEngine::new(repo.clone()),
            repo,
        }
    }

    /// Assemble the summary for a month.
    ///
    /// Telesales totals are recomputed live. Every active BDM of the
    /// organization is settled through the deficit engine, including BDMs
    /// with no paid deals, whose carried deficit still compounds. Each
    /// settled record is persisted as a side effect of building the report.
    ///
    /// # Errors
    /// Returns an error if the organization is missing or any store
    /// operation fails; a failed BDM settlement aborts the whole summary.
    pub async fn build(
        &self,
        organization_id: OrgId,
        period: Period,
        triggered_by: Option<MemberId>,
    ) -> Result<MonthlyCommissionSummary, CommissionError> {
        // Existence check up front so an unknown org is a NotFound, not an
        // empty report.
        self.repo
            .get_commission_settings(organization_id)
            .await?
            .ok_or(CommissionError::OrgNotFound(organization_id))?;

        let telesales = self.telesales.aggregate(organization_id, period).await?;

        let bdm_members = self.repo.list_active_bdms(organization_id).await?;
        let mut bdms = Vec::with_capacity(bdm_members.len());
        for member in &bdm_members {
            let result = self
                .bdm_engine
                .calculate(organization_id, member.id, period, triggered_by)
                .await?;
            bdms.push(result);
        }

        let total_telesales_commission: Pence =
            telesales.iter().map(|t| t.total_commission).sum();
        let total_bdm_commission: Pence = bdms.iter().map(|b| b.bdm_commission).sum();

        Ok(MonthlyCommissionSummary {
            month: period.month,
            year: period.year,
            telesales,
            bdms,
            total_telesales_commission,
            total_bdm_commission,
            total_commissions: total_telesales_commission + total_bdm_commission,
        })
    }
}
