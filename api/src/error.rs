//! API error responder.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use atelier_billing::DenyReason;
use atelier_core::StoreError;
use atelier_critique::CritiqueError;

use crate::models::ApiResponse;

/// Domain and transport failures mapped onto HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid session token.
    #[error("unauthorized")]
    Unauthorized,
    /// Authenticated but not allowed.
    #[error("forbidden")]
    Forbidden,
    /// The usage gate denied the request.
    #[error("usage limit reached")]
    LimitReached(DenyReason),
    /// Malformed request payload.
    #[error("{0}")]
    BadRequest(String),
    /// Row not found.
    #[error("{0}")]
    NotFound(String),
    /// The vision model failed or answered garbage.
    #[error("critique service failed: {0}")]
    Critique(#[from] CritiqueError),
    /// Store-level failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Client sent too many requests.
    #[error("rate limited")]
    RateLimited,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::LimitReached(DenyReason::TrialExpired) => {
                (StatusCode::FORBIDDEN, "TRIAL_EXPIRED")
            }
            Self::LimitReached(DenyReason::NoCreditsRemaining) => {
                (StatusCode::FORBIDDEN, "NO_CREDITS")
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Critique(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILED"),
            Self::Store(StoreError::UserNotFound(_)) | Self::Store(StoreError::TicketNotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            Self::Store(StoreError::EmailTaken(_)) => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_FAILED"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();
        (status, Json(ApiResponse::<()>::error(code, &message))).into_response()
    }
}
