//! Trial lifecycle.
//!
//! Free accounts get a one-time 7-day trial, initialized lazily on first
//! qualifying use rather than at registration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::{Clock, Plan, StoreError, User};

use crate::store::LedgerStore;

/// Subscription credits granted when the trial starts.
pub const TRIAL_GRANT: u32 = 7;

/// Eligibility: free tier that has never started its trial. Exposed for
/// client display without mutating state.
pub fn can_start_trial(user: &User) -> bool {
    user.plan == Plan::Free && user.trial_started_at.is_none()
}

/// Outcome of the set-if-absent trial initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStart {
    /// This call set the timestamp and granted the trial balance.
    Started,
    /// The timestamp was already set; nothing changed.
    AlreadyStarted,
}

/// Lazily initializes trial state on first qualifying use.
pub struct TrialManager {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl TrialManager {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Idempotent trial initialization. The store performs the
    /// check-and-set as one conditional update, so a concurrent first
    /// use loses cleanly with [`TrialStart::AlreadyStarted`].
    pub fn ensure_started(&self, user_id: Uuid) -> Result<TrialStart, StoreError> {
        self.store
            .start_trial(user_id, self.clock.now(), TRIAL_GRANT)
    }
}
