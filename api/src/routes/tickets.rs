//! Help-center tickets.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::middleware::auth::AuthContext;
use crate::models::{ApiResponse, TicketCreate, TicketDto};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/", get(list_tickets).post(create_ticket))
}

/// File a support ticket.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = TicketCreate,
    responses(
        (status = 200, description = "Ticket created", body = TicketDto),
        (status = 401, description = "Not signed in")
    ),
    tag = "tickets"
)]
pub async fn create_ticket(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    Json(request): Json<TicketCreate>,
) -> Json<ApiResponse<TicketDto>> {
    let ticket = state.desk.open(
        auth.user_id,
        request.subject,
        request.content,
        request.category,
    );
    Json(ApiResponse::success(ticket.into()))
}

/// The caller's tickets, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    responses(
        (status = 200, description = "Own tickets", body = [TicketDto]),
        (status = 401, description = "Not signed in")
    ),
    tag = "tickets"
)]
pub async fn list_tickets(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
) -> Json<ApiResponse<Vec<TicketDto>>> {
    let tickets = state
        .desk
        .tickets_for_user(auth.user_id)
        .into_iter()
        .map(TicketDto::from)
        .collect();
    Json(ApiResponse::success(tickets))
}
