//! Credit ledger calculator.
//!
//! Pure derivation of a user's usable allowance from stored counters and
//! dates. No side effects; "now" is an explicit input so the same inputs
//! always yield the same outputs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::{Plan, User};

use crate::trial::can_start_trial;

/// Length of the free-tier trial window.
pub const TRIAL_WINDOW_DAYS: i64 = 7;

/// Derived allowance. Not persisted; computed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBreakdown {
    /// Subscription balance after trial-expiry zeroing.
    pub effective_subscription_credits: u32,
    /// Total usable allowance.
    pub total: u32,
    /// True iff the plan is free, a trial was started, and more than
    /// seven days have elapsed since.
    pub trial_expired: bool,
}

impl CreditBreakdown {
    /// Compute the allowance for `user` as of `now`.
    ///
    /// Paid tiers are never subject to the trial window. A free account
    /// that has not started its trial is not expired (its subscription
    /// balance is typically still zero). The window boundary is
    /// exclusive: exactly seven days in is still inside the trial.
    pub fn compute(user: &User, now: DateTime<Utc>) -> Self {
        let trial_expired = match (user.plan, user.trial_started_at) {
            (Plan::Free, Some(started)) => now - started > Duration::days(TRIAL_WINDOW_DAYS),
            _ => false,
        };

        let effective_subscription_credits = if trial_expired {
            0
        } else {
            user.subscription_credits
        };

        Self {
            effective_subscription_credits,
            total: effective_subscription_credits + user.credits,
            trial_expired,
        }
    }
}

/// Read model consumed by the client to render remaining allowance and
/// upsell prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditSummary {
    pub credits: u32,
    pub subscription_credits: u32,
    pub plan: Plan,
    pub total: u32,
    pub is_trial_expired: bool,
    pub can_start_trial: bool,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

impl CreditSummary {
    /// Snapshot of `user`'s allowance as of `now`.
    pub fn for_user(user: &User, now: DateTime<Utc>) -> Self {
        let breakdown = CreditBreakdown::compute(user, now);
        Self {
            credits: user.credits,
            subscription_credits: breakdown.effective_subscription_credits,
            plan: user.plan,
            total: breakdown.total,
            is_trial_expired: breakdown.trial_expired,
            can_start_trial: can_start_trial(user),
            trial_started_at: user.trial_started_at,
            subscription_expires_at: user.subscription_expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::User;
    use chrono::TimeZone;

    fn user(plan: Plan, credits: u32, subs: u32, trial: Option<DateTime<Utc>>) -> User {
        let mut u = User::register("u@example.com", "U", t0());
        u.plan = plan;
        u.credits = credits;
        u.subscription_credits = subs;
        u.trial_started_at = trial;
        u
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn paid_tiers_ignore_trial_window() {
        // Even with an ancient trial timestamp, paid plans keep their
        // subscription balance.
        for plan in [Plan::Plus, Plan::Pro] {
            let u = user(plan, 2, 5, Some(t0()));
            let b = CreditBreakdown::compute(&u, t0() + Duration::days(365));
            assert!(!b.trial_expired);
            assert_eq!(b.effective_subscription_credits, 5);
            assert_eq!(b.total, 7);
        }
    }

    #[test]
    fn free_without_trial_is_not_expired() {
        let u = user(Plan::Free, 3, 0, None);
        let b = CreditBreakdown::compute(&u, t0());
        assert!(!b.trial_expired);
        assert_eq!(b.total, 3);
    }

    #[test]
    fn trial_boundary_is_exclusive() {
        let u = user(Plan::Free, 0, 7, Some(t0()));

        // Exactly 7 days in: still valid.
        let b = CreditBreakdown::compute(&u, t0() + Duration::days(7));
        assert!(!b.trial_expired);
        assert_eq!(b.effective_subscription_credits, 7);

        // One second past the window: expired, subscription balance zeroed.
        let b = CreditBreakdown::compute(&u, t0() + Duration::days(7) + Duration::seconds(1));
        assert!(b.trial_expired);
        assert_eq!(b.effective_subscription_credits, 0);
        assert_eq!(b.total, 0);
    }

    #[test]
    fn expired_trial_keeps_purchased_credits() {
        let u = user(Plan::Free, 4, 7, Some(t0()));
        let b = CreditBreakdown::compute(&u, t0() + Duration::days(30));
        assert!(b.trial_expired);
        assert_eq!(b.total, 4);
    }

    #[test]
    fn total_is_sum_of_parts() {
        let u = user(Plan::Pro, 2, 9, None);
        let b = CreditBreakdown::compute(&u, t0());
        assert_eq!(b.total, b.effective_subscription_credits + u.credits);
    }

    #[test]
    fn compute_is_deterministic() {
        let u = user(Plan::Free, 1, 7, Some(t0()));
        let now = t0() + Duration::days(3);
        assert_eq!(
            CreditBreakdown::compute(&u, now),
            CreditBreakdown::compute(&u, now)
        );
    }

    #[test]
    fn summary_mirrors_breakdown() {
        let u = user(Plan::Free, 0, 7, Some(t0()));
        let s = CreditSummary::for_user(&u, t0() + Duration::days(8));
        assert_eq!(s.total, 0);
        assert!(s.is_trial_expired);
        assert!(!s.can_start_trial);
        assert_eq!(s.subscription_credits, 0);

        let fresh = user(Plan::Free, 0, 0, None);
        let s = CreditSummary::for_user(&fresh, t0());
        assert!(s.can_start_trial);
        assert!(!s.is_trial_expired);
    }
}
