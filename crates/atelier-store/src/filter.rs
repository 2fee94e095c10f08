//! Filter-criteria value objects for the listing queries.
//!
//! Each filter is a struct of named optional fields translated by a
//! single matcher, so callers never assemble untyped predicate bags.

use atelier_core::{Plan, Role, Ticket, TicketStatus, User};

/// Criteria for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring over name and email.
    pub name_contains: Option<String>,
    pub role: Option<Role>,
    pub plan: Option<Plan>,
}

impl UserFilter {
    /// Whether `user` satisfies every present criterion.
    pub fn matches(&self, user: &User) -> bool {
        if let Some(needle) = &self.name_contains {
            let needle = needle.to_lowercase();
            let hit = user.name.to_lowercase().contains(&needle)
                || user.email.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        if let Some(role) = self.role {
            if user.role != role {
                return false;
            }
        }
        if let Some(plan) = self.plan {
            if user.plan != plan {
                return false;
            }
        }
        true
    }
}

/// Criteria for the ticket triage listing.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    /// Ticket must carry this tag.
    pub tag: Option<String>,
}

impl TicketFilter {
    /// Whether `ticket` satisfies every present criterion.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(status) = self.status {
            if ticket.status != status {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !ticket.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }
}
