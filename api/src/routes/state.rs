//! Client-state sync.
//!
//! History, challenges and favorites for the signed-in account, or the
//! shared guest bucket when unauthenticated. Loading rolls the usage
//! window (monthly for guests, ISO-weekly for accounts) before returning.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use atelier_store::{ClientState, StateKey};

use crate::middleware::auth::MaybeAuth;
use crate::models::ApiResponse;
use crate::ApiState;

fn state_key(auth: &MaybeAuth) -> StateKey {
    match &auth.0 {
        Some(ctx) => StateKey::Account(ctx.user_id),
        None => StateKey::Guest,
    }
}

/// Load the caller's client state.
pub async fn get_state(
    State(state): State<Arc<ApiState>>,
    auth: MaybeAuth,
) -> Json<ApiResponse<ClientState>> {
    let key = state_key(&auth);
    let now = state.clock.now();

    let mut client_state = state.state_store.load(&key, now);
    if client_state.roll_window(&key, now) {
        state.state_store.save(&key, client_state.clone());
    }
    Json(ApiResponse::success(client_state))
}

/// Replace the caller's client state.
pub async fn put_state(
    State(state): State<Arc<ApiState>>,
    auth: MaybeAuth,
    Json(client_state): Json<ClientState>,
) -> Json<ApiResponse<ClientState>> {
    let key = state_key(&auth);
    state.state_store.save(&key, client_state.clone());
    Json(ApiResponse::success(client_state))
}
