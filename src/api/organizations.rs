use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::{
    CommissionSettings, OrgId, Organization, Pence, Rate, TimeMs,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationBody {
    pub name: String,
    /// Override of the default £3,500 threshold, in pence.
    pub bdm_threshold_amount: Option<i64>,
    /// Override of the default 100% rate, as a decimal fraction.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub bdm_commission_rate: Option<Decimal>,
}

pub async fn create_organization(
    State(state): State<AppState>,
    Json(body): Json<CreateOrganizationBody>,
) -> Result<(StatusCode, Json<Organization>), AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "organization name must not be empty".to_string(),
        ));
    }

    let defaults = CommissionSettings::default();
    let threshold = body
        .bdm_threshold_amount
        .map(Pence)
        .unwrap_or(defaults.bdm_threshold_amount);
    let rate = match body.bdm_commission_rate {
        Some(value) => Rate::try_new(value)?,
        None => defaults.bdm_commission_rate,
    };
    let settings = CommissionSettings::new(threshold, rate)?;

    let org = Organization {
        id: OrgId::generate(),
        name: name.to_string(),
        settings,
        created_at: TimeMs::now(),
    };
    state.repo.insert_organization(&org).await?;

    Ok((StatusCode::CREATED, Json(org)))
}

pub async fn get_organization(
    Path(org_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Organization>, AppError> {
    let org = state
        .repo
        .get_organization(OrgId(org_id))
        .await?
        .ok_or_else(|| AppError::NotFound("organization not found".to_string()))?;

    Ok(Json(org))
}
