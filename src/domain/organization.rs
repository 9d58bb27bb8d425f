//! The tenant entity.

use crate::domain::{CommissionSettings, OrgId, TimeMs};
use serde::{Deserialize, Serialize};

/// An organization: the ownership boundary for deals, team members, and
/// commission records. Nothing crosses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    #[serde(flatten)]
    pub settings: CommissionSettings,
    pub created_at: TimeMs,
}
