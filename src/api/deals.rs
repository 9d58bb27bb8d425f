use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{actor_id, AppState};
use crate::domain::{
    Deal, DealId, DealStatus, MemberId, OrgId, Pence, Period, Role, TimeMs,
};
use crate::engine::compute_deal_financials;
use crate::error::AppError;

async fn require_org(state: &AppState, org_id: OrgId) -> Result<(), AppError> {
    state
        .repo
        .get_organization(org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("organization not found".to_string()))?;
    Ok(())
}

/// Check the deal's people references: both must be members of the same
/// organization, and the BDM slot must hold a BDM-role member.
async fn validate_assignment(
    state: &AppState,
    org_id: OrgId,
    telesales_agent_id: MemberId,
    bdm_id: MemberId,
) -> Result<(), AppError> {
    state
        .repo
        .get_member(org_id, telesales_agent_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("telesales agent not found in organization".to_string())
        })?;

    let bdm = state
        .repo
        .get_member(org_id, bdm_id)
        .await?
        .ok_or_else(|| AppError::NotFound("BDM not found in organization".to_string()))?;
    if bdm.role != Role::Bdm {
        return Err(AppError::Validation(
            "bdmId must reference a BDM-role member".to_string(),
        ));
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealBody {
    pub customer_name: String,
    /// Pounds, up to two decimal places.
    #[serde(with = "rust_decimal::serde::float")]
    pub deal_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_in_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub installation_cost: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub misc_costs: Option<Decimal>,
    pub telesales_agent_id: Uuid,
    pub bdm_id: Uuid,
    pub notes: Option<String>,
}

pub async fn create_deal(
    Path(org_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateDealBody>,
) -> Result<(StatusCode, Json<Deal>), AppError> {
    let org_id = OrgId(org_id);
    require_org(&state, org_id).await?;
    let created_by = actor_id(&headers)?;

    let customer_name = body.customer_name.trim();
    if customer_name.is_empty() {
        return Err(AppError::Validation(
            "customer name must not be empty".to_string(),
        ));
    }

    let telesales_agent_id = MemberId(body.telesales_agent_id);
    let bdm_id = MemberId(body.bdm_id);
    validate_assignment(&state, org_id, telesales_agent_id, bdm_id).await?;

    let financials = compute_deal_financials(
        Pence::from_pounds(body.deal_value)?,
        Pence::from_pounds(body.buy_in_cost)?,
        Pence::from_pounds(body.installation_cost)?,
        Pence::from_pounds(body.misc_costs.unwrap_or(Decimal::ZERO))?,
    )?;

    let deal = Deal {
        id: DealId::generate(),
        organization_id: org_id,
        // Assigned by the repository inside the insert transaction.
        deal_number: String::new(),
        customer_name: customer_name.to_string(),
        financials,
        telesales_agent_id,
        bdm_id,
        status: DealStatus::ToDo,
        signed_at: None,
        installed_at: None,
        invoiced_at: None,
        paid_at: None,
        notes: body.notes,
        created_by,
        created_at: TimeMs::now(),
    };
    let deal = state.repo.insert_deal(&deal).await?;

    Ok((StatusCode::CREATED, Json(deal)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDealsQuery {
    pub status: Option<String>,
}

pub async fn list_deals(
    Path(org_id): Path<Uuid>,
    Query(params): Query<ListDealsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Deal>>, AppError> {
    let org_id = OrgId(org_id);
    require_org(&state, org_id).await?;

    let status = params
        .status
        .as_deref()
        .map(|s| {
            DealStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown status: {}", s)))
        })
        .transpose()?;

    let deals = state.repo.list_deals(org_id, status).await?;
    Ok(Json(deals))
}

pub async fn get_deal(
    Path((org_id, deal_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> Result<Json<Deal>, AppError> {
    let deal = state
        .repo
        .get_deal(OrgId(org_id), DealId(deal_id))
        .await?
        .ok_or_else(|| AppError::NotFound("deal not found".to_string()))?;

    Ok(Json(deal))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDealBody {
    pub customer_name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub deal_value: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub buy_in_cost: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub installation_cost: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub misc_costs: Option<Decimal>,
    pub telesales_agent_id: Option<Uuid>,
    pub bdm_id: Option<Uuid>,
    pub status: Option<DealStatus>,
    /// Explicit override of the paid instant (ms since epoch), honored on
    /// the transition into `paid`. Without it the transition time is used.
    pub paid_at: Option<i64>,
    pub notes: Option<String>,
}

pub async fn update_deal(
    Path((org_id, deal_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateDealBody>,
) -> Result<Json<Deal>, AppError> {
    let org_id = OrgId(org_id);
    let actor = actor_id(&headers)?;

    let mut deal = state
        .repo
        .get_deal(org_id, DealId(deal_id))
        .await?
        .ok_or_else(|| AppError::NotFound("deal not found".to_string()))?;

    if let Some(customer_name) = body.customer_name {
        let customer_name = customer_name.trim().to_string();
        if customer_name.is_empty() {
            return Err(AppError::Validation(
                "customer name must not be empty".to_string(),
            ));
        }
        deal.customer_name = customer_name;
    }

    // Any financial edit recomputes the whole split from the merged inputs;
    // the derived fields are never patched individually.
    let financial_edit = body.deal_value.is_some()
        || body.buy_in_cost.is_some()
        || body.installation_cost.is_some()
        || body.misc_costs.is_some();
    if financial_edit {
        let merge = |new: Option<Decimal>, current: Pence| -> Result<Pence, AppError> {
            match new {
                Some(pounds) => Ok(Pence::from_pounds(pounds)?),
                None => Ok(current),
            }
        };
        deal.financials = compute_deal_financials(
            merge(body.deal_value, deal.financials.deal_value)?,
            merge(body.buy_in_cost, deal.financials.buy_in_cost)?,
            merge(body.installation_cost, deal.financials.installation_cost)?,
            merge(body.misc_costs, deal.financials.misc_costs)?,
        )?;
    }

    if let Some(telesales_agent_id) = body.telesales_agent_id {
        deal.telesales_agent_id = MemberId(telesales_agent_id);
    }
    if let Some(bdm_id) = body.bdm_id {
        deal.bdm_id = MemberId(bdm_id);
    }
    if body.telesales_agent_id.is_some() || body.bdm_id.is_some() {
        validate_assignment(&state, org_id, deal.telesales_agent_id, deal.bdm_id).await?;
    }

    if let Some(notes) = body.notes {
        deal.notes = Some(notes);
    }

    let mut became_paid = false;
    if let Some(status) = body.status {
        if status != deal.status {
            let now = TimeMs::now();
            deal.status = status;
            match status {
                // Pipeline timestamps keep their first-arrival value on
                // re-entry.
                DealStatus::Signed => deal.signed_at = deal.signed_at.or(Some(now)),
                DealStatus::Installed => deal.installed_at = deal.installed_at.or(Some(now)),
                DealStatus::Invoiced => deal.invoiced_at = deal.invoiced_at.or(Some(now)),
                DealStatus::Paid => {
                    deal.paid_at = body
                        .paid_at
                        .map(TimeMs::new)
                        .or(deal.paid_at)
                        .or(Some(now));
                    became_paid = true;
                }
                DealStatus::ToDo | DealStatus::Done => {}
            }
        }
    }

    let updated = state.repo.update_deal(&deal).await?;
    if !updated {
        return Err(AppError::NotFound("deal not found".to_string()));
    }

    if became_paid {
        let paid_at = deal
            .paid_at
            .ok_or_else(|| AppError::Internal("paid deal without paid timestamp".to_string()))?;
        let period = Period::containing(paid_at).ok_or_else(|| {
            AppError::Validation("paidAt is outside the supported date range".to_string())
        })?;
        // The settlement is awaited so a recalculation failure surfaces to
        // the caller instead of vanishing; retrying the request is safe.
        state
            .bdm_engine
            .calculate(org_id, deal.bdm_id, period, actor)
            .await?;
    }

    Ok(Json(deal))
}

pub async fn delete_deal(
    Path((org_id, deal_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let org_id = OrgId(org_id);
    let deal_id = DealId(deal_id);

    let deal = state
        .repo
        .get_deal(org_id, deal_id)
        .await?
        .ok_or_else(|| AppError::NotFound("deal not found".to_string()))?;

    if !deal.status.allows_deletion() {
        return Err(AppError::Validation(format!(
            "a {} deal cannot be deleted",
            deal.status
        )));
    }

    state.repo.delete_deal(org_id, deal_id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}
