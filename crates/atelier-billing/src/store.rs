//! Ledger storage port.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use atelier_core::{Analysis, FundingSource, StoreError, User};

use crate::trial::TrialStart;

/// Persistence boundary for the accounting core.
///
/// Implemented by the relational store; tests substitute failing or
/// scripted fakes.
pub trait LedgerStore: Send + Sync {
    /// Current account row, if any.
    fn load_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Set the trial-start timestamp and grant the trial balance, but
    /// only if the timestamp is still absent. Must be a single atomic
    /// conditional update so two concurrent first uses cannot both grant.
    fn start_trial(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        grant: u32,
    ) -> Result<TrialStart, StoreError>;

    /// Decrement one unit from `source` and persist the analysis row in
    /// one all-or-nothing unit. With `source == None` the analysis is
    /// recorded without a decrement (both balances already empty).
    fn commit_usage(
        &self,
        user_id: Uuid,
        source: Option<FundingSource>,
        analysis: Analysis,
    ) -> Result<(), StoreError>;
}
