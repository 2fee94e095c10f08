//! Session authentication.
//!
//! Sessions are issued by the external identity provider; this layer only
//! verifies the HS256 session token and exposes the caller's identity to
//! handlers. [`AuthContext`] rejects unauthenticated requests,
//! [`MaybeAuth`] lets guest traffic through.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::Role;

use crate::error::ApiError;
use crate::ApiState;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id.
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

/// Verified caller identity.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthContext {
    /// Administrator check: either the admin role, or the operator's
    /// configured admin email.
    pub fn is_admin(&self, state: &ApiState) -> bool {
        self.role == Role::Admin
            || state
                .config
                .admin_email
                .as_deref()
                .is_some_and(|email| email.eq_ignore_ascii_case(&self.email))
    }
}

/// Sign a session token (used by tests and tooling; issuance normally
/// happens in the identity provider).
pub fn issue_token(claims: &SessionClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("HS256 signing cannot fail")
}

/// Verify a bearer token against the configured secret.
pub fn verify_token(token: &str, secret: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        let claims =
            verify_token(token, &state.config.session_secret).ok_or(ApiError::Unauthorized)?;
        Ok(AuthContext {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Optional authentication: `None` for guests or invalid tokens.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for MaybeAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let context = bearer_token(parts)
            .and_then(|token| verify_token(token, &state.config.session_secret))
            .map(|claims| AuthContext {
                user_id: claims.sub,
                email: claims.email,
                role: claims.role,
            });
        Ok(MaybeAuth(context))
    }
}

/// Reject non-administrators.
pub fn require_admin(state: &ApiState, auth: &AuthContext) -> Result<(), ApiError> {
    if auth.is_admin(state) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            email: "u@example.com".into(),
            role: Role::User,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        let token = issue_token(&claims, "secret");
        let verified = verify_token(&token, "secret").unwrap();
        assert_eq!(verified.sub, claims.sub);
        assert_eq!(verified.role, Role::User);

        // Wrong secret fails verification.
        assert!(verify_token(&token, "other").is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            email: "u@example.com".into(),
            role: Role::User,
            exp: (chrono::Utc::now().timestamp() - 3600) as usize,
        };
        let token = issue_token(&claims, "secret");
        assert!(verify_token(&token, "secret").is_none());
    }
}
