//! Usage gate.
//!
//! Request-time check that blocks a critique when the computed allowance
//! is exhausted. Pure: the caller supplies the account row and "now".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::User;

use crate::ledger::CreditBreakdown;
use crate::trial::can_start_trial;

/// Why a request was denied. Drives differentiated client messaging
/// (upsell vs. "come back next cycle").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Free-tier trial window elapsed with no other allowance.
    TrialExpired,
    /// Zero total allowance and not eligible for a trial.
    NoCreditsRemaining,
}

/// Gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Proceed to the critique call.
    Granted,
    /// Block and surface the reason.
    Denied(DenyReason),
}

impl Access {
    /// True for [`Access::Granted`].
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Authorize one critique for `user` as of `now`.
///
/// A zero-allowance free account that has never started its trial is
/// allowed through once; the caller is expected to run the trial
/// initialization as part of granting access.
pub fn authorize(user: &User, now: DateTime<Utc>) -> Access {
    let breakdown = CreditBreakdown::compute(user, now);

    if breakdown.total > 0 {
        return Access::Granted;
    }
    if can_start_trial(user) {
        return Access::Granted;
    }

    Access::Denied(if breakdown.trial_expired {
        DenyReason::TrialExpired
    } else {
        DenyReason::NoCreditsRemaining
    })
}
