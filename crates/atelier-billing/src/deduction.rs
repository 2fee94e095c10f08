//! Deduction transaction.
//!
//! Called only after the external critique succeeds: consume one unit of
//! allowance and persist the analysis row in a single atomic unit. A
//! store failure here is logged and swallowed; the critique result was
//! already delivered and must not be retracted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use atelier_core::{Analysis, AnalysisKind, Clock, FundingSource, User};

use crate::ledger::CreditBreakdown;
use crate::store::LedgerStore;

/// Which balance the next usage event should consume.
///
/// Priority: effective subscription credits first; purchased credits only
/// when the effective subscription balance is zero. `None` when both are
/// empty (a gate/deduct race), in which case the event is still recorded.
pub fn funding_source(user: &User, now: DateTime<Utc>) -> Option<FundingSource> {
    let breakdown = CreditBreakdown::compute(user, now);
    if breakdown.effective_subscription_credits > 0 {
        Some(FundingSource::Subscription)
    } else if user.credits > 0 {
        Some(FundingSource::Purchased)
    } else {
        None
    }
}

/// The critique payload persisted alongside the decrement.
#[derive(Debug, Clone)]
pub struct UsageArtifact {
    pub image_url: String,
    pub score: u32,
    pub report: serde_json::Value,
    pub kind: AnalysisKind,
    pub media_id: String,
    pub style_id: String,
    pub scenario_id: String,
}

/// What happened to the ledger after a delivered critique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeductionOutcome {
    /// Usage event and decrement committed together.
    Recorded {
        /// Balance that paid; `None` if both were already empty.
        funded_by: Option<FundingSource>,
    },
    /// The ledger write failed after the critique was delivered. Logged,
    /// not retried, never surfaced to the user.
    WriteFailed,
}

/// Records one consumed unit of allowance per successful critique.
pub struct UsageRecorder {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl UsageRecorder {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Commit the usage event for `user_id`.
    pub fn record(&self, user_id: Uuid, artifact: UsageArtifact) -> DeductionOutcome {
        let now = self.clock.now();

        let user = match self.store.load_user(user_id) {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::error!(%user_id, "usage unbilled: account row disappeared");
                return DeductionOutcome::WriteFailed;
            }
            Err(err) => {
                tracing::error!(%user_id, error = %err, "usage unbilled: account read failed");
                return DeductionOutcome::WriteFailed;
            }
        };

        let source = funding_source(&user, now);
        let analysis = Analysis {
            id: Uuid::new_v4(),
            user_id,
            image_url: artifact.image_url,
            score: artifact.score,
            result: artifact.report,
            kind: artifact.kind,
            media_id: artifact.media_id,
            style_id: artifact.style_id,
            scenario_id: artifact.scenario_id,
            funded_by: source,
            created_at: now,
        };

        match self.store.commit_usage(user_id, source, analysis) {
            Ok(()) => DeductionOutcome::Recorded { funded_by: source },
            Err(err) => {
                tracing::error!(%user_id, error = %err, "usage unbilled: deduction transaction failed");
                DeductionOutcome::WriteFailed
            }
        }
    }
}
