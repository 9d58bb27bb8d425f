//! Commission record point lookup and the keyed upsert the BDM engine
//! settles through.

use crate::domain::{CommissionRecord, MemberId, OrgId, Pence, Period, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{parse_uuid, Repository};

fn record_from_row(row: &SqliteRow) -> Result<CommissionRecord, sqlx::Error> {
    let calculated_by = row
        .get::<Option<String>, _>("calculated_by")
        .map(|s| parse_uuid(&s, "commission_records.calculated_by").map(MemberId))
        .transpose()?;

    Ok(CommissionRecord {
        organization_id: OrgId(parse_uuid(
            &row.get::<String, _>("organization_id"),
            "commission_records.organization_id",
        )?),
        bdm_id: MemberId(parse_uuid(
            &row.get::<String, _>("bdm_id"),
            "commission_records.bdm_id",
        )?),
        month: row.get::<i64, _>("month") as u32,
        year: row.get::<i64, _>("year") as i32,
        monthly_profit: Pence(row.get::<i64, _>("monthly_profit")),
        previous_deficit: Pence(row.get::<i64, _>("previous_deficit")),
        threshold_needed: Pence(row.get::<i64, _>("threshold_needed")),
        base_threshold: Pence(row.get::<i64, _>("base_threshold")),
        threshold_met: row.get::<i64, _>("threshold_met") != 0,
        excess_over_threshold: Pence(row.get::<i64, _>("excess_over_threshold")),
        bdm_commission: Pence(row.get::<i64, _>("bdm_commission")),
        deficit_to_next: Pence(row.get::<i64, _>("deficit_to_next")),
        deals_count: row.get::<i64, _>("deals_count"),
        calculated_by,
        calculated_at: TimeMs::new(row.get::<i64, _>("calculated_at")),
    })
}

impl Repository {
    /// Point lookup of the settled record for (org, BDM, period). `None` if
    /// that period has never been calculated.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value does not decode.
    pub async fn get_commission_record(
        &self,
        organization_id: OrgId,
        bdm_id: MemberId,
        period: Period,
    ) -> Result<Option<CommissionRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT organization_id, bdm_id, year, month,
                   monthly_profit, previous_deficit, threshold_needed, base_threshold,
                   threshold_met, excess_over_threshold, bdm_commission, deficit_to_next,
                   deals_count, calculated_by, calculated_at
            FROM commission_records
            WHERE organization_id = ? AND bdm_id = ? AND year = ? AND month = ?
            "#,
        )
        .bind(organization_id.to_string())
        .bind(bdm_id.to_string())
        .bind(period.year)
        .bind(period.month)
        .fetch_optional(self.pool())
        .await?;

        row.map(|row| record_from_row(&row)).transpose()
    }

    /// Write a settled record, overwriting any prior settlement of the same
    /// (org, BDM, year, month) key in a single atomic statement.
    ///
    /// # Errors
    /// Returns an error if the upsert fails; no partial row is ever left
    /// behind.
    pub async fn upsert_commission_record(
        &self,
        record: &CommissionRecord,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO commission_records
                (organization_id, bdm_id, year, month,
                 monthly_profit, previous_deficit, threshold_needed, base_threshold,
                 threshold_met, excess_over_threshold, bdm_commission, deficit_to_next,
                 deals_count, calculated_by, calculated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(organization_id, bdm_id, year, month) DO UPDATE SET
                monthly_profit = excluded.monthly_profit,
                previous_deficit = excluded.previous_deficit,
                threshold_needed = excluded.threshold_needed,
                base_threshold = excluded.base_threshold,
                threshold_met = excluded.threshold_met,
                excess_over_threshold = excluded.excess_over_threshold,
                bdm_commission = excluded.bdm_commission,
                deficit_to_next = excluded.deficit_to_next,
                deals_count = excluded.deals_count,
                calculated_by = excluded.calculated_by,
                calculated_at = excluded.calculated_at
            "#,
        )
        .bind(record.organization_id.to_string())
        .bind(record.bdm_id.to_string())
        .bind(record.year)
        .bind(record.month)
        .bind(record.monthly_profit.as_i64())
        .bind(record.previous_deficit.as_i64())
        .bind(record.threshold_needed.as_i64())
        .bind(record.base_threshold.as_i64())
        .bind(record.threshold_met as i64)
        .bind(record.excess_over_threshold.as_i64())
        .bind(record.bdm_commission.as_i64())
        .bind(record.deficit_to_next.as_i64())
        .bind(record.deals_count)
        .bind(record.calculated_by.map(|m| m.to_string()))
        .bind(record.calculated_at.as_ms())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Number of settled records for one BDM. Used to assert that re-runs
    /// overwrite rather than accumulate.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn count_commission_records(
        &self,
        organization_id: OrgId,
        bdm_id: MemberId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM commission_records WHERE organization_id = ? AND bdm_id = ?",
        )
        .bind(organization_id.to_string())
        .bind(bdm_id.to_string())
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }
}
