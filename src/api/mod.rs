pub mod commission_rules;
pub mod deals;
pub mod health;
pub mod organizations;
pub mod reports;
pub mod team;

use crate::db::Repository;
use crate::domain::{MemberId, OrgId, Role, TeamMember};
use crate::engine::{BdmCommissionEngine, SummaryBuilder};
use crate::error::AppError;
use axum::http::HeaderMap;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub bdm_engine: BdmCommissionEngine,
    pub summary_builder: SummaryBuilder,
}

impl AppState {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            bdm_engine: BdmCommissionEngine::new(repo.clone()),
            summary_builder: SummaryBuilder::new(repo.clone()),
            repo,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/organizations", post(organizations::create_organization))
        .route(
            "/v1/organizations/:org_id",
            get(organizations::get_organization),
        )
        .route(
            "/v1/organizations/:org_id/team",
            get(team::list_members).post(team::create_member),
        )
        .route(
            "/v1/organizations/:org_id/deals",
            get(deals::list_deals).post(deals::create_deal),
        )
        .route(
            "/v1/organizations/:org_id/deals/:deal_id",
            get(deals::get_deal)
                .patch(deals::update_deal)
                .delete(deals::delete_deal),
        )
        .route(
            "/v1/organizations/:org_id/commission-rules",
            get(commission_rules::get_commission_rules)
                .patch(commission_rules::update_commission_rules),
        )
        .route(
            "/v1/organizations/:org_id/reports/commissions",
            get(reports::get_commission_summary),
        )
        .layer(cors)
        .with_state(state)
}

/// Parse the optional `x-actor-id` header into a member id.
///
/// The identity layer proper is out of scope; callers attribute their
/// actions through this header.
pub(crate) fn actor_id(headers: &HeaderMap) -> Result<Option<MemberId>, AppError> {
    let Some(value) = headers.get("x-actor-id") else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Validation("invalid x-actor-id header".to_string()))?;
    Uuid::parse_str(value)
        .map(|id| Some(MemberId(id)))
        .map_err(|_| AppError::Validation("invalid x-actor-id header".to_string()))
}

/// Resolve the acting member, requiring both the header and membership of
/// the target organization.
pub(crate) async fn require_actor(
    state: &AppState,
    organization_id: OrgId,
    headers: &HeaderMap,
) -> Result<TeamMember, AppError> {
    let actor = actor_id(headers)?.ok_or_else(|| {
        AppError::Permission("x-actor-id header is required for this operation".to_string())
    })?;
    state
        .repo
        .get_member(organization_id, actor)
        .await?
        .ok_or_else(|| {
            AppError::Permission("actor is not a member of this organization".to_string())
        })
}

/// Require the actor to hold one of the given roles.
pub(crate) fn require_role(actor: &TeamMember, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(AppError::Permission(format!(
            "role {} may not perform this operation",
            actor.role
        )))
    }
}
