//! Deal persistence and the paid-deal aggregation queries feeding the
//! commission engines.

use crate::domain::{
    Deal, DealFinancials, DealId, DealStatus, MemberId, OrgId, Pence, Period, TimeMs,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_err, parse_uuid, PaidDealCommissionRow, Repository};

fn deal_from_row(row: &SqliteRow) -> Result<Deal, sqlx::Error> {
    let status_str: String = row.get("status");
    let status = DealStatus::parse(&status_str)
        .ok_or_else(|| decode_err(format!("unknown status in deals: {}", status_str)))?;

    let created_by = row
        .get::<Option<String>, _>("created_by")
        .map(|s| parse_uuid(&s, "deals.created_by").map(MemberId))
        .transpose()?;

    Ok(Deal {
        id: DealId(parse_uuid(&row.get::<String, _>("id"), "deals.id")?),
        organization_id: OrgId(parse_uuid(
            &row.get::<String, _>("organization_id"),
            "deals.organization_id",
        )?),
        deal_number: row.get("deal_number"),
        customer_name: row.get("customer_name"),
        financials: DealFinancials {
            deal_value: Pence(row.get::<i64, _>("deal_value")),
            buy_in_cost: Pence(row.get::<i64, _>("buy_in_cost")),
            installation_cost: Pence(row.get::<i64, _>("installation_cost")),
            misc_costs: Pence(row.get::<i64, _>("misc_costs")),
            initial_profit: Pence(row.get::<i64, _>("initial_profit")),
            telesales_commission: Pence(row.get::<i64, _>("telesales_commission")),
            remaining_profit: Pence(row.get::<i64, _>("remaining_profit")),
        },
        telesales_agent_id: MemberId(parse_uuid(
            &row.get::<String, _>("telesales_agent_id"),
            "deals.telesales_agent_id",
        )?),
        bdm_id: MemberId(parse_uuid(&row.get::<String, _>("bdm_id"), "deals.bdm_id")?),
        status,
        signed_at: row.get::<Option<i64>, _>("signed_at").map(TimeMs::new),
        installed_at: row.get::<Option<i64>, _>("installed_at").map(TimeMs::new),
        invoiced_at: row.get::<Option<i64>, _>("invoiced_at").map(TimeMs::new),
        paid_at: row.get::<Option<i64>, _>("paid_at").map(TimeMs::new),
        notes: row.get("notes"),
        created_by,
        created_at: TimeMs::new(row.get::<i64, _>("created_at")),
    })
}

const DEAL_COLUMNS: &str = r#"
    id, organization_id, deal_number, customer_name,
    deal_value, buy_in_cost, installation_cost, misc_costs,
    initial_profit, telesales_commission, remaining_profit,
    telesales_agent_id, bdm_id, status,
    signed_at, installed_at, invoiced_at, paid_at,
    notes, created_by, created_at
"#;

impl Repository {
    /// Insert a deal, assigning the next sequential deal number of its
    /// organization inside the same transaction.
    ///
    /// Returns the stored deal including the assigned number.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn insert_deal(&self, deal: &Deal) -> Result<Deal, sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        // MAX over the existing numbers rather than COUNT, so deleting an
        // early deal cannot make a later insert collide.
        let (highest,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(CAST(SUBSTR(deal_number, 6) AS INTEGER)), 0) \
             FROM deals WHERE organization_id = ?",
        )
        .bind(deal.organization_id.to_string())
        .fetch_one(&mut *tx)
        .await?;
        let deal_number = format!("DEAL-{:04}", highest + 1);

        sqlx::query(
            r#"
            INSERT INTO deals
                (id, organization_id, deal_number, customer_name,
                 deal_value, buy_in_cost, installation_cost, misc_costs,
                 initial_profit, telesales_commission, remaining_profit,
                 telesales_agent_id, bdm_id, status,
                 signed_at, installed_at, invoiced_at, paid_at,
                 notes, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(deal.id.to_string())
        .bind(deal.organization_id.to_string())
        .bind(&deal_number)
        .bind(&deal.customer_name)
        .bind(deal.financials.deal_value.as_i64())
        .bind(deal.financials.buy_in_cost.as_i64())
        .bind(deal.financials.installation_cost.as_i64())
        .bind(deal.financials.misc_costs.as_i64())
        .bind(deal.financials.initial_profit.as_i64())
        .bind(deal.financials.telesales_commission.as_i64())
        .bind(deal.financials.remaining_profit.as_i64())
        .bind(deal.telesales_agent_id.to_string())
        .bind(deal.bdm_id.to_string())
        .bind(deal.status.as_str())
        .bind(deal.signed_at.map(|t| t.as_ms()))
        .bind(deal.installed_at.map(|t| t.as_ms()))
        .bind(deal.invoiced_at.map(|t| t.as_ms()))
        .bind(deal.paid_at.map(|t| t.as_ms()))
        .bind(deal.notes.as_deref())
        .bind(deal.created_by.map(|m| m.to_string()))
        .bind(deal.created_at.as_ms())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Deal {
            deal_number,
            ..deal.clone()
        })
    }

    /// Look up a deal within an organization. `None` if absent or owned by a
    /// different organization.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value does not decode.
    pub async fn get_deal(
        &self,
        organization_id: OrgId,
        deal_id: DealId,
    ) -> Result<Option<Deal>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM deals WHERE organization_id = ? AND id = ?",
            DEAL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(organization_id.to_string())
            .bind(deal_id.to_string())
            .fetch_optional(self.pool())
            .await?;

        row.map(|row| deal_from_row(&row)).transpose()
    }

    /// All deals of an organization, newest first, optionally filtered by
    /// status.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value does not decode.
    pub async fn list_deals(
        &self,
        organization_id: OrgId,
        status: Option<DealStatus>,
    ) -> Result<Vec<Deal>, sqlx::Error> {
        let rows = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM deals WHERE organization_id = ? AND status = ? \
                     ORDER BY created_at DESC, id ASC",
                    DEAL_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(organization_id.to_string())
                    .bind(status.as_str())
                    .fetch_all(self.pool())
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM deals WHERE organization_id = ? \
                     ORDER BY created_at DESC, id ASC",
                    DEAL_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(organization_id.to_string())
                    .fetch_all(self.pool())
                    .await?
            }
        };

        rows.iter().map(deal_from_row).collect()
    }

    /// Overwrite a deal's mutable fields in a single statement.
    ///
    /// The derived financials are written together with their inputs, so a
    /// reader never observes a half-applied recomputation. Returns `false`
    /// if the deal does not exist in the organization.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update_deal(&self, deal: &Deal) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE deals SET
                customer_name = ?,
                deal_value = ?, buy_in_cost = ?, installation_cost = ?, misc_costs = ?,
                initial_profit = ?, telesales_commission = ?, remaining_profit = ?,
                telesales_agent_id = ?, bdm_id = ?, status = ?,
                signed_at = ?, installed_at = ?, invoiced_at = ?, paid_at = ?,
                notes = ?
            WHERE organization_id = ? AND id = ?
            "#,
        )
        .bind(&deal.customer_name)
        .bind(deal.financials.deal_value.as_i64())
        .bind(deal.financials.buy_in_cost.as_i64())
        .bind(deal.financials.installation_cost.as_i64())
        .bind(deal.financials.misc_costs.as_i64())
        .bind(deal.financials.initial_profit.as_i64())
        .bind(deal.financials.telesales_commission.as_i64())
        .bind(deal.financials.remaining_profit.as_i64())
        .bind(deal.telesales_agent_id.to_string())
        .bind(deal.bdm_id.to_string())
        .bind(deal.status.as_str())
        .bind(deal.signed_at.map(|t| t.as_ms()))
        .bind(deal.installed_at.map(|t| t.as_ms()))
        .bind(deal.invoiced_at.map(|t| t.as_ms()))
        .bind(deal.paid_at.map(|t| t.as_ms()))
        .bind(deal.notes.as_deref())
        .bind(deal.organization_id.to_string())
        .bind(deal.id.to_string())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a deal. Returns `false` if nothing matched.
    ///
    /// The status gate (deletable only before `signed`) is enforced by the
    /// caller; this is the raw row removal.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete_deal(
        &self,
        organization_id: OrgId,
        deal_id: DealId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM deals WHERE organization_id = ? AND id = ?")
            .bind(organization_id.to_string())
            .bind(deal_id.to_string())
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sum of `remaining_profit` and deal count for one BDM's paid deals in
    /// a period.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn sum_paid_remaining_profit(
        &self,
        organization_id: OrgId,
        bdm_id: MemberId,
        period: Period,
    ) -> Result<(Pence, i64), sqlx::Error> {
        let (sum, count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(remaining_profit), 0), COUNT(*)
            FROM deals
            WHERE organization_id = ? AND bdm_id = ? AND status = 'paid'
              AND paid_at >= ? AND paid_at <= ?
            "#,
        )
        .bind(organization_id.to_string())
        .bind(bdm_id.to_string())
        .bind(period.start_ms().as_ms())
        .bind(period.end_ms().as_ms())
        .fetch_one(self.pool())
        .await?;

        Ok((Pence(sum), count))
    }

    /// Stored telesales figures of every deal of the organization paid in a
    /// period, with the agent's current name.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value does not decode.
    pub async fn query_paid_deal_commissions(
        &self,
        organization_id: OrgId,
        period: Period,
    ) -> Result<Vec<PaidDealCommissionRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT d.telesales_agent_id, m.name AS agent_name,
                   d.initial_profit, d.telesales_commission
            FROM deals d
            JOIN team_members m ON m.id = d.telesales_agent_id
            WHERE d.organization_id = ? AND d.status = 'paid'
              AND d.paid_at >= ? AND d.paid_at <= ?
            "#,
        )
        .bind(organization_id.to_string())
        .bind(period.start_ms().as_ms())
        .bind(period.end_ms().as_ms())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(PaidDealCommissionRow {
                    telesales_agent_id: MemberId(parse_uuid(
                        &row.get::<String, _>("telesales_agent_id"),
                        "deals.telesales_agent_id",
                    )?),
                    agent_name: row.get("agent_name"),
                    initial_profit: Pence(row.get::<i64, _>("initial_profit")),
                    telesales_commission: Pence(row.get::<i64, _>("telesales_commission")),
                })
            })
            .collect()
    }
}
