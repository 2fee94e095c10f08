//! Allowance read model.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use atelier_billing::CreditSummary;

use crate::error::ApiError;
use crate::middleware::auth::AuthContext;
use crate::models::{ApiResponse, CreditSummaryDto};
use crate::ApiState;

/// Current allowance for the signed-in account.
#[utoipa::path(
    get,
    path = "/api/v1/me/credits",
    responses(
        (status = 200, description = "Current allowance", body = CreditSummaryDto),
        (status = 401, description = "Not signed in")
    ),
    tag = "credits"
)]
pub async fn get_credits(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<CreditSummaryDto>>, ApiError> {
    let user = state
        .db
        .get_user(auth.user_id)
        .ok_or(ApiError::Unauthorized)?;
    let summary = CreditSummary::for_user(&user, state.clock.now());
    Ok(Json(ApiResponse::success(summary.into())))
}
