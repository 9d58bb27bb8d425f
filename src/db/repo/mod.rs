//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `deals.rs` - Deal persistence and paid-deal aggregation queries
//! - `records.rs` - Commission record point lookup and keyed upsert
//!
//! Organization and team-member operations live here. Every query is scoped
//! by organization id; there is no cross-tenant read path.

mod deals;
mod records;

use crate::domain::{
    CommissionSettings, MemberId, OrgId, Organization, Pence, Rate, Role, TeamMember, TimeMs,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

/// One paid deal's stored telesales figures, joined with the agent's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidDealCommissionRow {
    pub telesales_agent_id: MemberId,
    pub agent_name: String,
    pub initial_profit: Pence,
    pub telesales_commission: Pence,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

pub(crate) fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(value).map_err(|_| decode_err(format!("invalid uuid in {}", column)))
}

fn member_from_row(row: &SqliteRow) -> Result<TeamMember, sqlx::Error> {
    let role_str: String = row.get("role");
    let role = Role::parse(&role_str)
        .ok_or_else(|| decode_err(format!("unknown role in team_members: {}", role_str)))?;
    let rate_str: String = row.get("commission_rate");
    let commission_rate = Rate::from_str_canonical(&rate_str)
        .map_err(|e| decode_err(format!("invalid commission_rate in team_members: {}", e)))?;

    Ok(TeamMember {
        id: MemberId(parse_uuid(&row.get::<String, _>("id"), "team_members.id")?),
        organization_id: OrgId(parse_uuid(
            &row.get::<String, _>("organization_id"),
            "team_members.organization_id",
        )?),
        email: row.get("email"),
        name: row.get("name"),
        role,
        active: row.get::<i64, _>("active") != 0,
        commission_rate,
        target_monthly: row.get::<Option<i64>, _>("target_monthly").map(Pence),
        created_at: TimeMs::new(row.get::<i64, _>("created_at")),
    })
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap liveness probe for readiness checks.
    ///
    /// # Errors
    /// Returns an error if the pool cannot serve a query.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // Organization operations
    // =========================================================================

    /// Insert an organization with its commission settings.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_organization(&self, org: &Organization) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, bdm_threshold_amount, bdm_commission_rate, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(org.id.to_string())
        .bind(&org.name)
        .bind(org.settings.bdm_threshold_amount.as_i64())
        .bind(org.settings.bdm_commission_rate.to_canonical_string())
        .bind(org.created_at.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up an organization by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value does not decode.
    pub async fn get_organization(
        &self,
        organization_id: OrgId,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, bdm_threshold_amount, bdm_commission_rate, created_at
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(organization_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let rate_str: String = row.get("bdm_commission_rate");
            let rate = Rate::from_str_canonical(&rate_str).map_err(|e| {
                decode_err(format!("invalid bdm_commission_rate in organizations: {}", e))
            })?;
            Ok(Organization {
                id: OrgId(parse_uuid(&row.get::<String, _>("id"), "organizations.id")?),
                name: row.get("name"),
                settings: CommissionSettings {
                    bdm_threshold_amount: Pence(row.get::<i64, _>("bdm_threshold_amount")),
                    bdm_commission_rate: rate,
                },
                created_at: TimeMs::new(row.get::<i64, _>("created_at")),
            })
        })
        .transpose()
    }

    /// Read an organization's commission settings. `None` if the
    /// organization does not exist.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value does not decode.
    pub async fn get_commission_settings(
        &self,
        organization_id: OrgId,
    ) -> Result<Option<CommissionSettings>, sqlx::Error> {
        Ok(self
            .get_organization(organization_id)
            .await?
            .map(|org| org.settings))
    }

    /// Overwrite an organization's commission settings in one statement.
    ///
    /// Returns `false` if the organization does not exist.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update_commission_settings(
        &self,
        organization_id: OrgId,
        settings: &CommissionSettings,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET bdm_threshold_amount = ?, bdm_commission_rate = ?
            WHERE id = ?
            "#,
        )
        .bind(settings.bdm_threshold_amount.as_i64())
        .bind(settings.bdm_commission_rate.to_canonical_string())
        .bind(organization_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Team member operations
    // =========================================================================

    /// Insert a team member.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including the per-organization
    /// unique email constraint).
    pub async fn insert_member(&self, member: &TeamMember) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO team_members
                (id, organization_id, email, name, role, active, commission_rate, target_monthly, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(member.id.to_string())
        .bind(member.organization_id.to_string())
        .bind(&member.email)
        .bind(&member.name)
        .bind(member.role.as_str())
        .bind(member.active as i64)
        .bind(member.commission_rate.to_canonical_string())
        .bind(member.target_monthly.map(|p| p.as_i64()))
        .bind(member.created_at.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up a member within an organization. `None` if absent or owned by
    /// a different organization.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value does not decode.
    pub async fn get_member(
        &self,
        organization_id: OrgId,
        member_id: MemberId,
    ) -> Result<Option<TeamMember>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, organization_id, email, name, role, active, commission_rate, target_monthly, created_at
            FROM team_members
            WHERE organization_id = ? AND id = ?
            "#,
        )
        .bind(organization_id.to_string())
        .bind(member_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| member_from_row(&row)).transpose()
    }

    /// Whether a member with this email already exists in the organization.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn member_email_exists(
        &self,
        organization_id: OrgId,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM team_members WHERE organization_id = ? AND email = ?",
        )
        .bind(organization_id.to_string())
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 > 0)
    }

    /// All members of an organization, ordered by name.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value does not decode.
    pub async fn list_members(
        &self,
        organization_id: OrgId,
    ) -> Result<Vec<TeamMember>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, organization_id, email, name, role, active, commission_rate, target_monthly, created_at
            FROM team_members
            WHERE organization_id = ?
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(organization_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(member_from_row).collect()
    }

    /// Active BDM-role members of an organization, ordered by name.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value does not decode.
    pub async fn list_active_bdms(
        &self,
        organization_id: OrgId,
    ) -> Result<Vec<TeamMember>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, organization_id, email, name, role, active, commission_rate, target_monthly, created_at
            FROM team_members
            WHERE organization_id = ? AND role = 'bdm' AND active = 1
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(organization_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(member_from_row).collect()
    }
}
