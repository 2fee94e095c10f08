//! Back office.
//!
//! Everything here is guarded by [`require_admin`]: dashboard stats,
//! user and credit management, ticket triage, system settings, and the
//! bulk analysis reset.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use uuid::Uuid;

use atelier_billing::{dashboard_stats, DashboardStats};
use atelier_core::{SystemSetting, User};
use atelier_store::{TicketFilter, UserFilter, UserUpdate};

use crate::error::ApiError;
use crate::middleware::auth::{require_admin, AuthContext};
use crate::models::{
    ApiResponse, CreditAdjust, ResetResult, SettingUpsert, TicketDto, TicketListParams,
    TicketReply, TicketTags, UserCreate, UserDto, UserListParams, UserPatch,
};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .route("/users/:id/credits", put(adjust_credits))
        .route("/tickets", get(list_tickets))
        .route("/tickets/:id/reply", post(reply_ticket))
        .route("/tickets/:id/tags", put(set_ticket_tags))
        .route("/settings", get(get_settings).put(put_setting))
        .route("/analyses/reset", post(reset_analyses))
}

/// Dashboard aggregates.
pub async fn get_stats(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    require_admin(&state, &auth)?;
    let stats = dashboard_stats(
        &state.db.all_users(),
        &state.db.all_analyses(),
        state.clock.now(),
    );
    Ok(Json(ApiResponse::success(stats)))
}

/// User listing with explicit filter criteria.
pub async fn list_users(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Query(params): Query<UserListParams>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    require_admin(&state, &auth)?;
    let filter = UserFilter {
        name_contains: params.query,
        role: params.role,
        plan: params.plan,
    };
    let users = state
        .db
        .list_users(&filter)
        .into_iter()
        .map(UserDto::from)
        .collect();
    Ok(Json(ApiResponse::success(users)))
}

/// Create an account from the back office.
pub async fn create_user(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Json(request): Json<UserCreate>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(&state, &auth)?;

    let mut user = User::register(request.email, request.name, state.clock.now());
    if let Some(role) = request.role {
        user.role = role;
    }
    if let Some(plan) = request.plan {
        user.plan = plan;
    }
    if let Some(credits) = request.credits {
        user.credits = credits;
    }
    if let Some(subscription_credits) = request.subscription_credits {
        user.subscription_credits = subscription_credits;
    }

    let user = state.db.insert_user(user)?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Partial user update.
pub async fn update_user(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(&state, &auth)?;
    let user = state.db.update_user(
        id,
        UserUpdate {
            email: patch.email,
            name: patch.name,
            role: patch.role,
            plan: patch.plan,
            credits: patch.credits,
            subscription_credits: patch.subscription_credits,
            subscription_expires_at: patch.subscription_expires_at,
        },
    )?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Delete an account (cascades to analyses and tickets).
pub async fn delete_user(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_admin(&state, &auth)?;
    state.db.delete_user(id)?;
    Ok(Json(ApiResponse::success(())))
}

/// Set the purchased-credit balance to an absolute value.
pub async fn adjust_credits(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<CreditAdjust>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(&state, &auth)?;
    let user = state.db.set_purchased_credits(id, request.credits)?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Ticket triage listing.
pub async fn list_tickets(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Query(params): Query<TicketListParams>,
) -> Result<Json<ApiResponse<Vec<TicketDto>>>, ApiError> {
    require_admin(&state, &auth)?;
    let filter = TicketFilter {
        status: params.status,
        tag: params.tag,
    };
    let tickets = state
        .desk
        .triage(&filter)
        .into_iter()
        .map(TicketDto::from)
        .collect();
    Ok(Json(ApiResponse::success(tickets)))
}

/// Reply to a ticket; this closes it.
pub async fn reply_ticket(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<TicketReply>,
) -> Result<Json<ApiResponse<TicketDto>>, ApiError> {
    require_admin(&state, &auth)?;
    let ticket = state.desk.reply(id, request.reply)?;
    Ok(Json(ApiResponse::success(ticket.into())))
}

/// Replace a ticket's tags.
pub async fn set_ticket_tags(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<TicketTags>,
) -> Result<Json<ApiResponse<TicketDto>>, ApiError> {
    require_admin(&state, &auth)?;
    let ticket = state.desk.set_tags(id, request.tags)?;
    Ok(Json(ApiResponse::success(ticket.into())))
}

/// All system settings.
pub async fn get_settings(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<SystemSetting>>>, ApiError> {
    require_admin(&state, &auth)?;
    Ok(Json(ApiResponse::success(state.db.settings())))
}

/// Upsert one setting.
pub async fn put_setting(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Json(request): Json<SettingUpsert>,
) -> Result<Json<ApiResponse<SystemSetting>>, ApiError> {
    require_admin(&state, &auth)?;
    let setting = state
        .db
        .upsert_setting(&request.key, &request.value, &request.description);
    Ok(Json(ApiResponse::success(setting)))
}

/// Drop all analyses.
pub async fn reset_analyses(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<ResetResult>>, ApiError> {
    require_admin(&state, &auth)?;
    let count = state.db.reset_analyses();
    tracing::warn!(count, admin = %auth.email, "all analyses reset");
    Ok(Json(ApiResponse::success(ResetResult { count })))
}
