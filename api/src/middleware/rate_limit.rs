//! Rate limiting middleware.
//!
//! Token bucket per caller: the session subject when authenticated, the
//! forwarded client address otherwise.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::RwLock;

use crate::error::ApiError;
use crate::middleware::auth;
use crate::ApiState;

/// Axum middleware enforcing the per-caller limit.
pub async fn enforce(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = caller_key(&request, &state);
    match state.limiter.check(&key) {
        RateLimitResult::Allowed { .. } => Ok(next.run(request).await),
        RateLimitResult::Limited { retry_after } => {
            tracing::warn!(%key, ?retry_after, "rate limited");
            Err(ApiError::RateLimited)
        }
    }
}

fn caller_key(request: &Request, state: &ApiState) -> String {
    let bearer = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| auth::verify_token(token, &state.config.session_secret));
    if let Some(claims) = bearer {
        return format!("user:{}", claims.sub);
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|addr| format!("addr:{addr}"))
        .unwrap_or_else(|| "anonymous".into())
}

/// Rate limiter.
pub struct RateLimiter {
    buckets: Arc<RwLock<HashMap<String, TokenBucket>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Check if a request is allowed.
    pub fn check(&self, key: &str) -> RateLimitResult {
        let mut buckets = self.buckets.write();

        let bucket = buckets.entry(key.to_string()).or_insert_with(|| {
            TokenBucket::new(self.config.requests_per_second, self.config.burst)
        });

        if bucket.try_acquire() {
            RateLimitResult::Allowed {
                remaining: bucket.available,
                reset_at: bucket.reset_at,
            }
        } else {
            RateLimitResult::Limited {
                retry_after: bucket.reset_at - Instant::now(),
            }
        }
    }
}

/// Rate limit config.
#[derive(Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 100,
            burst: 200,
        }
    }
}

/// Token bucket.
struct TokenBucket {
    available: u32,
    max: u32,
    refill_rate: u32,
    last_refill: Instant,
    reset_at: Instant,
}

impl TokenBucket {
    fn new(rate: u32, burst: u32) -> Self {
        Self {
            available: burst,
            max: burst,
            refill_rate: rate,
            last_refill: Instant::now(),
            reset_at: Instant::now() + Duration::from_secs(1),
        }
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.available > 0 {
            self.available -= 1;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        let tokens = (elapsed.as_secs_f64() * self.refill_rate as f64) as u32;

        if tokens > 0 {
            self.available = (self.available + tokens).min(self.max);
            self.last_refill = now;
            self.reset_at = now + Duration::from_secs(1);
        }
    }
}

/// Rate limit result.
pub enum RateLimitResult {
    Allowed { remaining: u32, reset_at: Instant },
    Limited { retry_after: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_exhausts_and_limits() {
        let limiter = RateLimiter::new(RateLimitConfig {
            requests_per_second: 1,
            burst: 2,
        });

        assert!(matches!(
            limiter.check("user:a"),
            RateLimitResult::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("user:a"),
            RateLimitResult::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("user:a"),
            RateLimitResult::Limited { .. }
        ));

        // Separate callers get separate buckets.
        assert!(matches!(
            limiter.check("user:b"),
            RateLimitResult::Allowed { .. }
        ));
    }
}
