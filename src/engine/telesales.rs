//! Per-agent telesales commission aggregation.
//!
//! The telesales scheme has no cross-month memory: every call is a full
//! recomputation from the paid deals of the requested month, and nothing is
//! persisted.

use crate::db::{PaidDealCommissionRow, Repository};
use crate::domain::{MemberId, OrgId, Pence, Period};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One telesales agent's totals for a month.
///
/// Agents with no paid deals in the period do not appear at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelesalesAgentSummary {
    pub agent_id: MemberId,
    pub agent_name: String,
    pub deals_count: i64,
    pub total_profit: Pence,
    pub total_commission: Pence,
}

/// Group paid-deal rows by agent, summing stored per-deal figures.
///
/// Output is ordered by agent name then id so reports render stably.
pub fn summarize(rows: Vec<PaidDealCommissionRow>) -> Vec<TelesalesAgentSummary> {
    let mut by_agent: HashMap<MemberId, TelesalesAgentSummary> = HashMap::new();

    for row in rows {
        let entry = by_agent
            .entry(row.telesales_agent_id)
            .or_insert_with(|| TelesalesAgentSummary {
                agent_id: row.telesales_agent_id,
                agent_name: row.agent_name.clone(),
                deals_count: 0,
                total_profit: Pence::ZERO,
                total_commission: Pence::ZERO,
            });
        entry.deals_count += 1;
        entry.total_profit = entry.total_profit + row.initial_profit;
        entry.total_commission = entry.total_commission + row.telesales_commission;
    }

    let mut summaries: Vec<TelesalesAgentSummary> = by_agent.into_values().collect();
    summaries.sort_by(|a, b| {
        a.agent_name
            .cmp(&b.agent_name)
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    });
    summaries
}

/// Read-side aggregator over the deal store.
#[derive(Clone)]
pub struct TelesalesAggregator {
    repo: Arc<Repository>,
}

impl TelesalesAggregator {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Totals per agent for all deals of the organization paid in the
    /// period.
    ///
    /// # Errors
    /// Returns an error if the deal query fails.
    pub async fn aggregate(
        &self,
        organization_id: OrgId,
        period: Period,
    ) -> Result<Vec<TelesalesAgentSummary>, sqlx::Error> {
        let rows = self
            .repo
            .query_paid_deal_commissions(organization_id, period)
            .await?;
        Ok(summarize(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(agent: MemberId, name: &str, profit: i64, commission: i64) -> PaidDealCommissionRow {
        PaidDealCommissionRow {
            telesales_agent_id: agent,
            agent_name: name.to_string(),
            initial_profit: Pence(profit),
            telesales_commission: Pence(commission),
        }
    }

    #[test]
    fn test_groups_and_sums_per_agent() {
        let alice = MemberId::generate();
        let bob = MemberId::generate();
        let summaries = summarize(vec![
            row(alice, "Alice", 1000, 100),
            row(bob, "Bob", 500, 50),
            row(alice, "Alice", 2000, 200),
        ]);

        assert_eq!(summaries.len(), 2);
        let a = summaries.iter().find(|s| s.agent_id == alice).unwrap();
        assert_eq!(a.deals_count, 2);
        assert_eq!(a.total_profit, Pence(3000));
        assert_eq!(a.total_commission, Pence(300));
        let b = summaries.iter().find(|s| s.agent_id == bob).unwrap();
        assert_eq!(b.deals_count, 1);
        assert_eq!(b.total_profit, Pence(500));
    }

    #[test]
    fn test_empty_input_yields_no_rows() {
        assert!(summarize(vec![]).is_empty());
    }

    #[test]
    fn test_output_ordered_by_name() {
        let carol = MemberId::generate();
        let bob = MemberId::generate();
        let summaries = summarize(vec![
            row(carol, "Carol", 100, 10),
            row(bob, "Bob", 100, 10),
        ]);
        let names: Vec<&str> = summaries.iter().map(|s| s.agent_name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Carol"]);
    }
}
