use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{actor_id, AppState};
use crate::domain::{OrgId, Period};
use crate::engine::MonthlyCommissionSummary;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSummaryQuery {
    pub month: u32,
    pub year: i32,
}

/// Build the month's commission report.
///
/// Viewing re-settles every active BDM for the period, so each request
/// refreshes the persisted records from the current deal set.
pub async fn get_commission_summary(
    Path(org_id): Path<Uuid>,
    Query(params): Query<CommissionSummaryQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MonthlyCommissionSummary>, AppError> {
    let period = Period::new(params.month, params.year)?;
    let triggered_by = actor_id(&headers)?;

    let summary = state
        .summary_builder
        .build(OrgId(org_id), period, triggered_by)
        .await?;

    Ok(Json(summary))
}
