pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    CommissionRecord, CommissionSettings, Deal, DealFinancials, DealId, DealStatus, MemberId,
    OrgId, Organization, Pence, Period, Rate, Role, TeamMember, TimeMs,
};
pub use engine::{
    BdmCommissionEngine, MonthlyCommissionResult, MonthlyCommissionSummary, SummaryBuilder,
    TelesalesAggregator, TelesalesAgentSummary,
};
pub use error::AppError;
