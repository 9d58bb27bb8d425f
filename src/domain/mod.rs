//! Domain types for the commission-tracking core.
//!
//! This module provides:
//! - Integer-pence money with the two half-up rounding boundaries
//! - Tenant-scoped identifiers and calendar periods
//! - Deal, team member, settings, and commission record entities

pub mod deal;
pub mod member;
pub mod money;
pub mod organization;
pub mod primitives;
pub mod record;
pub mod settings;

pub use deal::{Deal, DealFinancials, DealStatus};
pub use organization::Organization;
pub use member::{Role, TeamMember};
pub use money::{MoneyError, Pence, Rate};
pub use primitives::{DealId, MemberId, OrgId, Period, PeriodError, TimeMs};
pub use record::CommissionRecord;
pub use settings::{CommissionSettings, SettingsError, DEFAULT_BDM_THRESHOLD};
