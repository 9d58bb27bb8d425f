use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{require_actor, require_role, AppState};
use crate::domain::{MemberId, OrgId, Pence, Rate, Role, TeamMember, TimeMs};
use crate::error::AppError;

pub async fn list_members(
    Path(org_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeamMember>>, AppError> {
    let org_id = OrgId(org_id);
    state
        .repo
        .get_organization(org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("organization not found".to_string()))?;

    let members = state.repo.list_members(org_id).await?;
    Ok(Json(members))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberBody {
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Informational per-person rate; not used by the commission engines.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub commission_rate: Option<Decimal>,
    /// Personal monthly target in pence, if the organization tracks one.
    pub target_monthly: Option<i64>,
}

pub async fn create_member(
    Path(org_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateMemberBody>,
) -> Result<(StatusCode, Json<TeamMember>), AppError> {
    let org_id = OrgId(org_id);
    let actor = require_actor(&state, org_id, &headers).await?;
    require_role(&actor, &[Role::Admin, Role::Manager])?;

    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("invalid email address".to_string()));
    }
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    if state.repo.member_email_exists(org_id, &email).await? {
        return Err(AppError::Validation(
            "a team member with this email already exists".to_string(),
        ));
    }

    let commission_rate = match body.commission_rate {
        Some(value) => Rate::try_new(value)?,
        // Matches the historical default handed to new hires.
        None => Rate::from_str_canonical("0.1")?,
    };

    let member = TeamMember {
        id: MemberId::generate(),
        organization_id: org_id,
        email,
        name: name.to_string(),
        role: body.role,
        active: true,
        commission_rate,
        target_monthly: body.target_monthly.map(Pence),
        created_at: TimeMs::now(),
    };
    state.repo.insert_member(&member).await?;

    Ok((StatusCode::CREATED, Json(member)))
}
