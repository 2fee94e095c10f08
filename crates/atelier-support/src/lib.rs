//! Atelier support desk.
//!
//! Ticket intake from the help center and triage from the back office:
//! list by status or tag, reply (which closes the ticket), and tag for
//! follow-up.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod desk;

pub use desk::TicketDesk;
