//! The ticket desk.

use std::sync::Arc;

use uuid::Uuid;

use atelier_core::{Clock, StoreError, Ticket, TicketCategory, TicketStatus};
use atelier_store::{Database, TicketFilter};

/// Ticket operations over the store.
pub struct TicketDesk {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl TicketDesk {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// File a new ticket for `user_id`.
    pub fn open(
        &self,
        user_id: Uuid,
        subject: impl Into<String>,
        content: impl Into<String>,
        category: TicketCategory,
    ) -> Ticket {
        let now = self.clock.now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            user_id,
            subject: subject.into(),
            content: content.into(),
            category,
            status: TicketStatus::Open,
            tags: Vec::new(),
            reply: None,
            created_at: now,
            updated_at: now,
        };
        tracing::info!(ticket_id = %ticket.id, %user_id, category = ?category, "ticket opened");
        self.db.insert_ticket(ticket)
    }

    /// A user's own tickets, newest first.
    pub fn tickets_for_user(&self, user_id: Uuid) -> Vec<Ticket> {
        self.db.tickets_for_user(user_id)
    }

    /// Triage listing for the back office.
    pub fn triage(&self, filter: &TicketFilter) -> Vec<Ticket> {
        self.db.list_tickets(filter)
    }

    /// Record the admin reply and close the ticket.
    pub fn reply(&self, ticket_id: Uuid, body: impl Into<String>) -> Result<Ticket, StoreError> {
        let now = self.clock.now();
        let body = body.into();
        self.db.update_ticket(ticket_id, |ticket| {
            ticket.reply = Some(body);
            ticket.status = TicketStatus::Closed;
            ticket.updated_at = now;
        })
    }

    /// Replace a ticket's tags.
    pub fn set_tags(&self, ticket_id: Uuid, tags: Vec<String>) -> Result<Ticket, StoreError> {
        let now = self.clock.now();
        self.db.update_ticket(ticket_id, |ticket| {
            ticket.tags = tags;
            ticket.updated_at = now;
        })
    }
}
