//! API routes.

pub mod admin;
pub mod credits;
pub mod critique;
pub mod health;
pub mod masters;
pub mod state;
pub mod tickets;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::ApiState;

/// Routes scoped to the authenticated (or guest) caller.
pub fn me_router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/credits", get(credits::get_credits))
        .route("/analyses", get(critique::list_my_analyses))
        .route("/state", get(state::get_state).put(state::put_state))
}
