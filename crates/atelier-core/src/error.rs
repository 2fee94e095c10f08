//! Store error taxonomy.

use uuid::Uuid;

use crate::model::FundingSource;

/// Errors surfaced by the relational store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No user row with the given id.
    #[error("user {0} not found")]
    UserNotFound(Uuid),
    /// No ticket row with the given id.
    #[error("ticket {0} not found")]
    TicketNotFound(Uuid),
    /// A user with this email already exists.
    #[error("email {0} already registered")]
    EmailTaken(String),
    /// The balance chosen to fund a usage event is already empty.
    #[error("{0:?} balance is empty")]
    EmptyBalance(FundingSource),
    /// The store could not complete the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
