//! The critique flow.
//!
//! `POST /critiques` is the billed path: gate on the caller's allowance,
//! lazily start the free trial, call the vision model, then run the
//! deduction transaction. A deduction failure after a delivered critique
//! is logged and swallowed; the caller still receives the report.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use atelier_billing::{authorize, can_start_trial, Access, UsageArtifact};
use atelier_core::{AnalysisKind, User};
use atelier_critique::{prompt, CritiqueReport};

use crate::error::ApiError;
use crate::middleware::auth::{AuthContext, MaybeAuth};
use crate::models::{AnalysisDto, ApiResponse, CritiqueRequest};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/", post(create_critique))
}

/// Request a critique for an uploaded artwork image.
#[utoipa::path(
    post,
    path = "/api/v1/critiques",
    request_body = CritiqueRequest,
    responses(
        (status = 200, description = "Structured critique report"),
        (status = 400, description = "Missing image"),
        (status = 403, description = "Allowance exhausted (TRIAL_EXPIRED or NO_CREDITS)"),
        (status = 502, description = "Vision model failed")
    ),
    tag = "critique"
)]
pub async fn create_critique(
    State(state): State<Arc<ApiState>>,
    auth: MaybeAuth,
    Json(request): Json<CritiqueRequest>,
) -> Result<Json<CritiqueReport>, ApiError> {
    if request.image.is_empty() {
        return Err(ApiError::BadRequest("image is required".into()));
    }

    let modules = state.catalog.select(
        request.media_id.as_deref(),
        request.style_id.as_deref(),
        request.scenario_id.as_deref(),
    );

    // Anonymous callers skip the ledger entirely; account rows that
    // vanished since sign-in are treated the same way.
    let account: Option<User> = auth
        .0
        .as_ref()
        .and_then(|ctx| state.db.get_user(ctx.user_id));

    if let Some(user) = &account {
        match authorize(user, state.clock.now()) {
            Access::Granted => {
                if can_start_trial(user) {
                    state.trials.ensure_started(user.id)?;
                }
            }
            Access::Denied(reason) => return Err(ApiError::LimitReached(reason)),
        }
    }

    let system_prompt = prompt::critique_prompt(&modules);
    let report = state.model.critique(&system_prompt, &request.image).await?;

    if let Some(user) = &account {
        let artifact = UsageArtifact {
            image_url: request.image.clone(),
            score: report.total_score,
            report: serde_json::to_value(&report)
                .unwrap_or_else(|_| serde_json::Value::Null),
            kind: if modules.style.id == "general" {
                AnalysisKind::General
            } else {
                AnalysisKind::MasterStyle
            },
            media_id: modules.media.id.clone(),
            style_id: modules.style.id.clone(),
            scenario_id: modules.scenario.id.clone(),
        };
        // Outcome intentionally not propagated: the recorder logs a
        // WriteFailed and the delivered report stands.
        let _ = state.recorder.record(user.id, artifact);
    }

    Ok(Json(report))
}

/// The caller's past analyses, newest first.
pub async fn list_my_analyses(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
) -> Json<ApiResponse<Vec<AnalysisDto>>> {
    let rows = state
        .db
        .analyses_for_user(auth.user_id)
        .into_iter()
        .map(AnalysisDto::from)
        .collect();
    Json(ApiResponse::success(rows))
}
