//! Master-artist validation.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use atelier_critique::MasterVerdict;

use crate::error::ApiError;
use crate::models::{ApiResponse, MasterValidateRequest};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/validate", post(validate_master))
}

/// Check whether a name is a recognized master; accepted masters become
/// selectable style modules.
#[utoipa::path(
    post,
    path = "/api/v1/masters/validate",
    request_body = MasterValidateRequest,
    responses(
        (status = 200, description = "Verdict with master info when accepted"),
        (status = 400, description = "Missing name"),
        (status = 502, description = "Vision model failed")
    ),
    tag = "masters"
)]
pub async fn validate_master(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<MasterValidateRequest>,
) -> Result<Json<ApiResponse<MasterVerdict>>, ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("master name is required".into()));
    }

    let verdict = state
        .model
        .validate_master(&request.name, request.medium.as_deref())
        .await?;

    if verdict.is_valid {
        if let Some(style) = verdict.clone().into_style_module() {
            tracing::info!(style_id = %style.id, "master admitted as style module");
            state.catalog.add_style(style);
        }
    }

    Ok(Json(ApiResponse::success(verdict)))
}
