//! Atelier relational store.
//!
//! An in-memory table engine with the transactional guarantees the
//! accounting core needs: one lock over all tables, so the deduction
//! transaction (balance decrement + analysis insert) and the conditional
//! trial start are single critical sections. Queries go through explicit
//! filter-criteria objects rather than ad-hoc predicate bags.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod client_state;
pub mod db;
pub mod filter;

pub use client_state::{ClientState, MemoryStateStore, StateKey, StateStore};
pub use db::{Database, UserUpdate};
pub use filter::{TicketFilter, UserFilter};
