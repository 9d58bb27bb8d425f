//! The commission calculation engines.
//!
//! Four pieces, leaves first: the per-deal profit split, the stateless
//! telesales aggregator, the month-chained BDM deficit engine, and the
//! summary builder that composes the other two per organization and month.

pub mod bdm;
pub mod profit;
pub mod summary;
pub mod telesales;

pub use bdm::{settle, BdmCommissionEngine, CommissionError, MonthlyCommissionResult, Settlement};
pub use profit::{compute_deal_financials, ProfitError};
pub use summary::{MonthlyCommissionSummary, SummaryBuilder};
pub use telesales::{summarize, TelesalesAggregator, TelesalesAgentSummary};
