//! End-to-end API tests with a stubbed vision model.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use atelier_api::middleware::auth::{issue_token, SessionClaims};
use atelier_api::{build_router, ApiConfig, ApiState};
use atelier_billing::{LedgerStore, TrialStart};
use atelier_core::{
    Analysis, FundingSource, ManualClock, Plan, Role, StoreError, User,
};
use atelier_critique::{
    Advice, Coordinate, CritiqueError, CritiqueReport, MasterInfo, MasterVerdict,
    PerformanceType, ScoreEntry, Scoring, VisionModel,
};
use atelier_store::Database;

const SECRET: &str = "test-secret";

fn t0() -> DateTime<Utc> {
    // A Friday; the following Monday starts a new ISO week.
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn canned_report() -> CritiqueReport {
    let entry = |score| ScoreEntry {
        score,
        reason: "依模組定義評估".into(),
    };
    CritiqueReport {
        step1_declaration: "本次評分基準說明：以水彩與通用基礎為準".into(),
        step2_performance: PerformanceType {
            representation: "Semi-realistic".into(),
            driver: "Block".into(),
            atmosphere: "Soft".into(),
        },
        step3_techniques: vec!["Wet-on-wet".into(), "Edge Control".into(), "Glazing".into()],
        step4_advice: vec![Advice {
            coordinate: Coordinate {
                x: 10.0,
                y: 20.0,
                w: 30.0,
                h: 30.0,
            },
            technique: "Wet-on-wet".into(),
            direction: "在天空區域先鋪水再上色".into(),
        }],
        step5_scoring: Scoring {
            media_mastery: entry(4),
            structure_proportion: entry(3),
            style_consistency: entry(4),
            visual_completeness: entry(4),
        },
        total_score: 75,
    }
}

struct StubModel;

#[async_trait]
impl VisionModel for StubModel {
    async fn critique(
        &self,
        _system_prompt: &str,
        _image_url: &str,
    ) -> Result<CritiqueReport, CritiqueError> {
        Ok(canned_report())
    }

    async fn validate_master(
        &self,
        name: &str,
        _medium: Option<&str>,
    ) -> Result<MasterVerdict, CritiqueError> {
        if name == "John Doe" {
            return Ok(MasterVerdict {
                is_valid: false,
                reason: "查無此人".into(),
                master_info: None,
            });
        }
        Ok(MasterVerdict {
            is_valid: true,
            reason: "國際拍賣市場有穩定紀錄".into(),
            master_info: Some(MasterInfo {
                name: name.into(),
                desc: "果斷筆觸與光影處理".into(),
                tag: "光影".into(),
            }),
        })
    }
}

/// Ledger that fails every deduction transaction but leaves reads and
/// trial starts to the real store.
struct FailingLedger {
    db: Arc<Database>,
}

impl LedgerStore for FailingLedger {
    fn load_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.db.load_user(id)
    }

    fn start_trial(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        grant: u32,
    ) -> Result<TrialStart, StoreError> {
        self.db.start_trial(id, at, grant)
    }

    fn commit_usage(
        &self,
        _user_id: Uuid,
        _source: Option<FundingSource>,
        _analysis: Analysis,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("injected failure".into()))
    }
}

struct Harness {
    server: TestServer,
    db: Arc<Database>,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    harness_with(|state| state)
}

fn harness_with(customize: impl FnOnce(ApiState) -> ApiState) -> Harness {
    let db = Arc::new(Database::new());
    let clock = Arc::new(ManualClock::at(t0()));
    let state = ApiState::with_clock(
        db.clone(),
        Arc::new(StubModel),
        ApiConfig::for_tests(SECRET),
        clock.clone(),
    );
    let server = TestServer::new(build_router(customize(state))).unwrap();
    Harness { server, db, clock }
}

fn seed_user(db: &Database, plan: Plan, credits: u32, subscription_credits: u32) -> User {
    let mut user = User::register(format!("{}@example.com", Uuid::new_v4()), "Tester", t0());
    user.plan = plan;
    user.credits = credits;
    user.subscription_credits = subscription_credits;
    db.insert_user(user).unwrap()
}

fn bearer(user: &User) -> (axum::http::HeaderName, axum::http::HeaderValue) {
    let claims = SessionClaims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        // Token expiry is checked against the real clock, not the
        // harness clock.
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    let token = issue_token(&claims, SECRET);
    (AUTHORIZATION, format!("Bearer {token}").parse().unwrap())
}

fn critique_body() -> serde_json::Value {
    json!({
        "image": "data:image/png;base64,xxxx",
        "media_id": "watercolor",
        "style_id": "general",
        "scenario_id": "free_practice"
    })
}

#[tokio::test]
async fn health_is_up() {
    let h = harness();
    let response = h.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["status"], "healthy");
}

#[tokio::test]
async fn fresh_free_account_gets_trial_and_is_billed() {
    let h = harness();
    let user = seed_user(&h.db, Plan::Free, 0, 0);
    let (name, value) = bearer(&user);

    let response = h
        .server
        .post("/api/v1/critiques")
        .add_header(name, value)
        .json(&critique_body())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["total_score"], 75);

    // Trial started at "now" with a 7-unit grant, one of which paid for
    // this critique.
    let row = h.db.get_user(user.id).unwrap();
    assert_eq!(row.trial_started_at, Some(t0()));
    assert_eq!(row.subscription_credits, 6);
    assert_eq!(row.credits, 0);

    let analyses = h.db.analyses_for_user(user.id);
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0].funded_by, Some(FundingSource::Subscription));
    assert_eq!(analyses[0].score, 75);
}

#[tokio::test]
async fn credit_summary_tracks_trial_lifecycle() {
    let h = harness();
    let user = seed_user(&h.db, Plan::Free, 0, 0);
    let (name, value) = bearer(&user);

    // Before any use: trial-eligible, nothing allocated.
    let response = h
        .server
        .get("/api/v1/me/credits")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["can_start_trial"], true);
    assert_eq!(body["data"]["is_trial_expired"], false);

    // First critique initializes the trial.
    h.server
        .post("/api/v1/critiques")
        .add_header(name.clone(), value.clone())
        .json(&critique_body())
        .await
        .assert_status_ok();

    let response = h
        .server
        .get("/api/v1/me/credits")
        .add_header(name.clone(), value.clone())
        .await;
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"]["subscription_credits"], 6);
    assert_eq!(body["data"]["total"], 6);
    assert_eq!(body["data"]["can_start_trial"], false);

    // Eight days later the window has lapsed.
    h.clock.advance(Duration::days(8));
    let response = h
        .server
        .get("/api/v1/me/credits")
        .add_header(name.clone(), value.clone())
        .await;
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["is_trial_expired"], true);

    let response = h
        .server
        .post("/api/v1/critiques")
        .add_header(name, value)
        .json(&critique_body())
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<serde_json::Value>()["error"]["code"],
        "TRIAL_EXPIRED"
    );
}

#[tokio::test]
async fn pro_account_spends_purchased_credits() {
    let h = harness();
    let user = seed_user(&h.db, Plan::Pro, 2, 0);
    let (name, value) = bearer(&user);

    h.server
        .post("/api/v1/critiques")
        .add_header(name, value)
        .json(&critique_body())
        .await
        .assert_status_ok();

    let row = h.db.get_user(user.id).unwrap();
    assert_eq!(row.credits, 1);
    let analyses = h.db.analyses_for_user(user.id);
    assert_eq!(analyses[0].funded_by, Some(FundingSource::Purchased));
}

#[tokio::test]
async fn exhausted_paid_account_is_denied() {
    let h = harness();
    let user = seed_user(&h.db, Plan::Plus, 0, 0);
    let (name, value) = bearer(&user);

    let response = h
        .server
        .post("/api/v1/critiques")
        .add_header(name, value)
        .json(&critique_body())
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<serde_json::Value>()["error"]["code"],
        "NO_CREDITS"
    );
}

#[tokio::test]
async fn anonymous_critique_skips_the_ledger() {
    let h = harness();
    let response = h.server.post("/api/v1/critiques").json(&critique_body()).await;
    response.assert_status_ok();
    assert!(h.db.all_analyses().is_empty());
}

#[tokio::test]
async fn deduction_failure_is_swallowed() {
    // The failing ledger shares the harness database for reads.
    let h = harness_with(|state| {
        let shared = state.db.clone();
        state.with_ledger(Arc::new(FailingLedger { db: shared }))
    });
    let user = seed_user(&h.db, Plan::Pro, 3, 0);
    let (name, value) = bearer(&user);

    // The critique is still delivered...
    let response = h
        .server
        .post("/api/v1/critiques")
        .add_header(name, value)
        .json(&critique_body())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["total_score"], 75);

    // ...and neither half of the failed transaction landed.
    let row = h.db.get_user(user.id).unwrap();
    assert_eq!(row.credits, 3);
    assert!(h.db.analyses_for_user(user.id).is_empty());
}

#[tokio::test]
async fn missing_image_is_rejected() {
    let h = harness();
    let response = h
        .server
        .post("/api/v1/critiques")
        .json(&json!({"image": ""}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tickets_flow_through_the_desk() {
    let h = harness();
    let user = seed_user(&h.db, Plan::Free, 0, 0);
    let (name, value) = bearer(&user);

    let response = h
        .server
        .post("/api/v1/tickets")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "subject": "點數未入帳",
            "content": "購買後點數沒有增加",
            "category": "credits_issue"
        }))
        .await;
    response.assert_status_ok();
    let ticket_id = response.json::<serde_json::Value>()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = h
        .server
        .get("/api/v1/tickets")
        .add_header(name, value)
        .await;
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], ticket_id.as_str());
    assert_eq!(body["data"][0]["status"], "open");

    // Unauthenticated ticket creation is rejected.
    h.server
        .post("/api/v1/tickets")
        .json(&json!({"subject": "s", "content": "c", "category": "other"}))
        .await
        .assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_surface_is_guarded_and_works() {
    let h = harness();
    let user = seed_user(&h.db, Plan::Plus, 1, 0);
    let mut admin = User::register("admin@example.com", "Admin", t0());
    admin.role = Role::Admin;
    let admin = h.db.insert_user(admin).unwrap();

    let (user_h, user_v) = bearer(&user);
    let (admin_h, admin_v) = bearer(&admin);

    // Non-admin is rejected.
    h.server
        .get("/api/v1/admin/stats")
        .add_header(user_h.clone(), user_v.clone())
        .await
        .assert_status(axum::http::StatusCode::FORBIDDEN);

    // Stats reflect the seeded tables.
    let response = h
        .server
        .get("/api/v1/admin/stats")
        .add_header(admin_h.clone(), admin_v.clone())
        .await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"]["total_users"], 2);
    assert_eq!(body["data"]["paid_users_plus"], 1);
    assert_eq!(body["data"]["revenue"]["monthly_revenue"], "150");

    // Filtered listing.
    let response = h
        .server
        .get("/api/v1/admin/users")
        .add_query_param("plan", "plus")
        .add_header(admin_h.clone(), admin_v.clone())
        .await;
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["plan"], "plus");

    // Credit adjustment is absolute.
    let response = h
        .server
        .put(&format!("/api/v1/admin/users/{}/credits", user.id))
        .add_header(admin_h.clone(), admin_v.clone())
        .json(&json!({"credits": 10}))
        .await;
    response.assert_status_ok();
    assert_eq!(h.db.get_user(user.id).unwrap().credits, 10);

    // Reply closes a ticket.
    let ticket = h
        .db
        .insert_ticket(atelier_core::Ticket {
            id: Uuid::new_v4(),
            user_id: user.id,
            subject: "s".into(),
            content: "c".into(),
            category: atelier_core::TicketCategory::Other,
            status: atelier_core::TicketStatus::Open,
            tags: vec![],
            reply: None,
            created_at: t0(),
            updated_at: t0(),
        });
    let response = h
        .server
        .post(&format!("/api/v1/admin/tickets/{}/reply", ticket.id))
        .add_header(admin_h.clone(), admin_v.clone())
        .json(&json!({"reply": "已處理"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["data"]["status"], "closed");

    // Settings upsert and readback.
    h.server
        .put("/api/v1/admin/settings")
        .add_header(admin_h.clone(), admin_v.clone())
        .json(&json!({"key": "maintenance", "value": "on"}))
        .await
        .assert_status_ok();
    let response = h
        .server
        .get("/api/v1/admin/settings")
        .add_header(admin_h, admin_v)
        .await;
    assert_eq!(
        response.json::<serde_json::Value>()["data"][0]["value"],
        "on"
    );
}

#[tokio::test]
async fn client_state_round_trips_and_rolls_weekly() {
    let h = harness();
    let user = seed_user(&h.db, Plan::Free, 0, 0);
    let (name, value) = bearer(&user);

    let saved = json!({
        "history": [],
        "challenges": [],
        "favorites": [3, 7],
        "analysis_count": 4,
        "last_reset": t0().to_rfc3339()
    });
    h.server
        .put("/api/v1/me/state")
        .add_header(name.clone(), value.clone())
        .json(&saved)
        .await
        .assert_status_ok();

    let response = h
        .server
        .get("/api/v1/me/state")
        .add_header(name.clone(), value.clone())
        .await;
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"]["analysis_count"], 4);

    // Monday of the next ISO week: the counter resets, favorites stay.
    h.clock.advance(Duration::days(3));
    let response = h
        .server
        .get("/api/v1/me/state")
        .add_header(name, value)
        .await;
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"]["analysis_count"], 0);
    assert_eq!(body["data"]["favorites"], json!([3, 7]));
}

#[tokio::test]
async fn validated_master_becomes_a_style() {
    let h = harness();

    let response = h
        .server
        .post("/api/v1/masters/validate")
        .json(&json!({"name": "John Singer Sargent", "medium": "oil"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"]["isValid"], true);

    // Rejected names produce no module.
    let response = h
        .server
        .post("/api/v1/masters/validate")
        .json(&json!({"name": "John Doe"}))
        .await;
    assert_eq!(
        response.json::<serde_json::Value>()["data"]["isValid"],
        false
    );
}
