use axum::http::StatusCode;
use dealdesk::api::{self, AppState};
use dealdesk::db::init_db;
use dealdesk::domain::{
    CommissionSettings, Deal, DealFinancials, DealId, DealStatus, MemberId, OrgId, Organization,
    Pence, Period, Rate, Role, TeamMember, TimeMs,
};
use dealdesk::Repository;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use uuid::Uuid;

struct TestApp {
    app: axum::Router,
    state: AppState,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");

    let repo = Arc::new(Repository::new(pool));
    let state = AppState::new(repo);
    let app = api::create_router(state.clone());

    TestApp {
        app,
        state,
        _temp: temp_dir,
    }
}

async fn seed_org(state: &AppState) -> OrgId {
    let org = Organization {
        id: OrgId::generate(),
        name: "Acme Telecom".to_string(),
        settings: CommissionSettings::default(),
        created_at: TimeMs::new(0),
    };
    state.repo.insert_organization(&org).await.unwrap();
    org.id
}

async fn seed_member(state: &AppState, org: OrgId, name: &str, role: Role) -> MemberId {
    let member = TeamMember {
        id: MemberId::generate(),
        organization_id: org,
        email: format!("{}@example.com", name.to_lowercase()),
        name: name.to_string(),
        role,
        active: true,
        commission_rate: Rate::from_str_canonical("0.1").unwrap(),
        target_monthly: None,
        created_at: TimeMs::new(0),
    };
    state.repo.insert_member(&member).await.unwrap();
    member.id
}

/// Insert a paid deal with the given stored split figures.
async fn seed_paid_deal(
    state: &AppState,
    org: OrgId,
    agent: MemberId,
    bdm: MemberId,
    initial: i64,
    telesales: i64,
    paid_at: TimeMs,
) {
    let deal = Deal {
        id: DealId::generate(),
        organization_id: org,
        deal_number: String::new(),
        customer_name: "Test Customer".to_string(),
        financials: DealFinancials {
            deal_value: Pence(initial),
            buy_in_cost: Pence::ZERO,
            installation_cost: Pence::ZERO,
            misc_costs: Pence::ZERO,
            initial_profit: Pence(initial),
            telesales_commission: Pence(telesales),
            remaining_profit: Pence(initial - telesales),
        },
        telesales_agent_id: agent,
        bdm_id: bdm,
        status: DealStatus::Paid,
        signed_at: None,
        installed_at: None,
        invoiced_at: None,
        paid_at: Some(paid_at),
        notes: None,
        created_by: None,
        created_at: TimeMs::new(0),
    };
    state.repo.insert_deal(&deal).await.unwrap();
}

async fn get_summary(
    app: axum::Router,
    org: OrgId,
    month: u32,
    year: i32,
) -> (StatusCode, serde_json::Value) {
    let uri = format!(
        "/v1/organizations/{}/reports/commissions?month={}&year={}",
        org, month, year
    );
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_summary_composes_both_schemes() {
    let t = setup_test_app().await;
    let org = seed_org(&t.state).await;
    let alice = seed_member(&t.state, org, "Alice", Role::Telesales).await;
    let carol = seed_member(&t.state, org, "Carol", Role::Telesales).await;
    let bob = seed_member(&t.state, org, "Bob", Role::Bdm).await;

    let march = Period::new(3, 2024).unwrap();
    let paid_at = TimeMs::new(march.start_ms().as_ms() + 86_400_000);
    // Bob's pool: 360,000 + 90,000 = 450,000 -> 100,000 over the threshold
    seed_paid_deal(&t.state, org, alice, bob, 400_000, 40_000, paid_at).await;
    seed_paid_deal(&t.state, org, carol, bob, 100_000, 10_000, paid_at).await;

    let (status, body) = get_summary(t.app.clone(), org, 3, 2024).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);

    assert_eq!(body["month"], 3);
    assert_eq!(body["year"], 2024);

    let telesales = body["telesales"].as_array().unwrap();
    assert_eq!(telesales.len(), 2);
    // Ordered by name: Alice before Carol
    assert_eq!(telesales[0]["agentName"], "Alice");
    assert_eq!(telesales[0]["dealsCount"], 1);
    assert_eq!(telesales[0]["totalProfit"], 400_000);
    assert_eq!(telesales[0]["totalCommission"], 40_000);
    assert_eq!(telesales[1]["agentName"], "Carol");

    let bdms = body["bdms"].as_array().unwrap();
    assert_eq!(bdms.len(), 1);
    assert_eq!(bdms[0]["monthlyProfit"], 450_000);
    assert_eq!(bdms[0]["thresholdMet"], true);
    assert_eq!(bdms[0]["bdmCommission"], 100_000);
    assert_eq!(bdms[0]["dealsCount"], 2);

    assert_eq!(body["totalTelesalesCommission"], 50_000);
    assert_eq!(body["totalBdmCommission"], 100_000);
    assert_eq!(body["totalCommissions"], 150_000);
}

#[tokio::test]
async fn test_zero_activity_agents_omitted_but_bdms_included() {
    let t = setup_test_app().await;
    let org = seed_org(&t.state).await;
    let alice = seed_member(&t.state, org, "Alice", Role::Telesales).await;
    // Dave never sells anything this month
    seed_member(&t.state, org, "Dave", Role::Telesales).await;
    let bob = seed_member(&t.state, org, "Bob", Role::Bdm).await;
    // Erin is a BDM with no deals; her deficit state still matters
    seed_member(&t.state, org, "Erin", Role::Bdm).await;

    let march = Period::new(3, 2024).unwrap();
    let paid_at = TimeMs::new(march.start_ms().as_ms() + 86_400_000);
    seed_paid_deal(&t.state, org, alice, bob, 100_000, 10_000, paid_at).await;

    let (_, body) = get_summary(t.app.clone(), org, 3, 2024).await;

    let telesales = body["telesales"].as_array().unwrap();
    assert_eq!(telesales.len(), 1, "idle agents must not appear");
    assert_eq!(telesales[0]["agentName"], "Alice");

    let bdms = body["bdms"].as_array().unwrap();
    assert_eq!(bdms.len(), 2, "idle BDMs must appear");
    let erin = bdms
        .iter()
        .find(|b| b["monthlyProfit"] == 0)
        .expect("Erin's zero month present");
    assert_eq!(erin["thresholdMet"], false);
    assert_eq!(erin["deficitToNext"], 350_000);
}

#[tokio::test]
async fn test_summary_persists_bdm_records() {
    let t = setup_test_app().await;
    let org = seed_org(&t.state).await;
    let alice = seed_member(&t.state, org, "Alice", Role::Telesales).await;
    let bob = seed_member(&t.state, org, "Bob", Role::Bdm).await;

    let march = Period::new(3, 2024).unwrap();
    let paid_at = TimeMs::new(march.start_ms().as_ms() + 86_400_000);
    seed_paid_deal(&t.state, org, alice, bob, 400_000, 40_000, paid_at).await;

    assert!(t
        .state
        .repo
        .get_commission_record(org, bob, march)
        .await
        .unwrap()
        .is_none());

    get_summary(t.app.clone(), org, 3, 2024).await;

    let record = t
        .state
        .repo
        .get_commission_record(org, bob, march)
        .await
        .unwrap()
        .expect("viewing the report settles the month");
    assert_eq!(record.monthly_profit, Pence(360_000));
}

#[tokio::test]
async fn test_inactive_bdm_excluded_from_summary() {
    let t = setup_test_app().await;
    let org = seed_org(&t.state).await;
    seed_member(&t.state, org, "Bob", Role::Bdm).await;

    let retired = TeamMember {
        id: MemberId::generate(),
        organization_id: org,
        email: "retired@example.com".to_string(),
        name: "Retired".to_string(),
        role: Role::Bdm,
        active: false,
        commission_rate: Rate::from_str_canonical("0.1").unwrap(),
        target_monthly: None,
        created_at: TimeMs::new(0),
    };
    t.state.repo.insert_member(&retired).await.unwrap();

    let (_, body) = get_summary(t.app.clone(), org, 3, 2024).await;
    assert_eq!(body["bdms"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_org_is_not_found() {
    let t = setup_test_app().await;
    let (status, _) = get_summary(t.app.clone(), OrgId(Uuid::new_v4()), 3, 2024).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_month_rejected() {
    let t = setup_test_app().await;
    let org = seed_org(&t.state).await;
    let (status, _) = get_summary(t.app.clone(), org, 13, 2024).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_summaries_do_not_cross_organizations() {
    let t = setup_test_app().await;
    let org_a = seed_org(&t.state).await;
    let org_b = seed_org(&t.state).await;
    let alice = seed_member(&t.state, org_a, "Alice", Role::Telesales).await;
    let bob = seed_member(&t.state, org_a, "Bob", Role::Bdm).await;
    seed_member(&t.state, org_b, "Carol", Role::Telesales).await;
    seed_member(&t.state, org_b, "Dave", Role::Bdm).await;

    let march = Period::new(3, 2024).unwrap();
    let paid_at = TimeMs::new(march.start_ms().as_ms() + 86_400_000);
    seed_paid_deal(&t.state, org_a, alice, bob, 400_000, 40_000, paid_at).await;

    let (_, body) = get_summary(t.app.clone(), org_b, 3, 2024).await;
    assert!(body["telesales"].as_array().unwrap().is_empty());
    assert_eq!(body["totalCommissions"], 0);
    let bdms = body["bdms"].as_array().unwrap();
    assert_eq!(bdms.len(), 1);
    assert_eq!(bdms[0]["monthlyProfit"], 0);
}
