//! Atelier usage-credit accounting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       CREDIT ACCOUNTING CORE                            │
//! │                                                                         │
//! │  request ──► USAGE GATE ──► allow / deny(TrialExpired|NoCredits)        │
//! │                  │                                                      │
//! │                  ├─ LEDGER CALCULATOR (pure: balances + trial window)   │
//! │                  └─ TRIAL LIFECYCLE  (lazy init, set-if-absent)         │
//! │                                                                         │
//! │  critique ok ──► DEDUCTION TRANSACTION                                  │
//! │                  decrement one unit + persist analysis, atomically      │
//! │                                                                         │
//! │  back office ──► REPORTING (activity, trend, revenue)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! State lives behind the [`LedgerStore`] port; this crate holds the rules.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod deduction;
pub mod gate;
pub mod ledger;
pub mod reporting;
pub mod store;
pub mod trial;

pub use deduction::{funding_source, DeductionOutcome, UsageArtifact, UsageRecorder};
pub use gate::{authorize, Access, DenyReason};
pub use ledger::{CreditBreakdown, CreditSummary, TRIAL_WINDOW_DAYS};
pub use reporting::{dashboard_stats, DashboardStats, RevenueMetrics, TrendPoint};
pub use store::LedgerStore;
pub use trial::{can_start_trial, TrialManager, TrialStart, TRIAL_GRANT};
