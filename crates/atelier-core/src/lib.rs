//! Atelier shared domain model.
//!
//! Row types for the relational schema (users, analyses, tickets, system
//! settings), the plan/role/category vocabulary, the store error taxonomy,
//! and an injectable wall clock. Every other crate in the workspace builds
//! on these types.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod clock;
pub mod error;
pub mod model;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::StoreError;
pub use model::{
    Analysis, AnalysisKind, FundingSource, Plan, Role, SystemSetting, Ticket, TicketCategory,
    TicketStatus, User,
};
