use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{require_actor, require_role, AppState};
use crate::domain::{CommissionSettings, OrgId, Pence, Rate, Role};
use crate::error::AppError;

pub async fn get_commission_rules(
    Path(org_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<CommissionSettings>, AppError> {
    let settings = state
        .repo
        .get_commission_settings(OrgId(org_id))
        .await?
        .ok_or_else(|| AppError::NotFound("organization not found".to_string()))?;

    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommissionRulesBody {
    /// New threshold in pence.
    pub bdm_threshold_amount: Option<i64>,
    /// New rate as a decimal fraction in `[0, 1]`.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub bdm_commission_rate: Option<Decimal>,
}

/// Admin-only. The change is not retroactive by itself: already-settled
/// records keep their snapshots, and the new values apply to whichever
/// period is recalculated next.
pub async fn update_commission_rules(
    Path(org_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateCommissionRulesBody>,
) -> Result<Json<CommissionSettings>, AppError> {
    let org_id = OrgId(org_id);
    let actor = require_actor(&state, org_id, &headers).await?;
    require_role(&actor, &[Role::Admin])?;

    let current = state
        .repo
        .get_commission_settings(org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("organization not found".to_string()))?;

    let threshold = body
        .bdm_threshold_amount
        .map(Pence)
        .unwrap_or(current.bdm_threshold_amount);
    let rate = match body.bdm_commission_rate {
        Some(value) => Rate::try_new(value)?,
        None => current.bdm_commission_rate,
    };
    let settings = CommissionSettings::new(threshold, rate)?;

    let updated = state
        .repo
        .update_commission_settings(org_id, &settings)
        .await?;
    if !updated {
        return Err(AppError::NotFound("organization not found".to_string()));
    }

    Ok(Json(settings))
}
