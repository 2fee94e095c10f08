//! The table engine.
//!
//! All tables sit behind one `RwLock`, so any write touching several rows
//! is a single critical section. The ledger operations validate first and
//! mutate only once the whole write is known to succeed, which is what
//! makes `commit_usage` all-or-nothing and `start_trial` a true
//! set-if-absent.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use atelier_billing::{LedgerStore, TrialStart};
use atelier_core::{
    Analysis, FundingSource, Plan, Role, StoreError, SystemSetting, Ticket, User,
};

use crate::filter::{TicketFilter, UserFilter};

/// Default cap for admin listings.
const LIST_LIMIT: usize = 100;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    analyses: HashMap<Uuid, Analysis>,
    tickets: HashMap<Uuid, Ticket>,
    settings: HashMap<String, SystemSetting>,
}

/// The relational store.
pub struct Database {
    inner: RwLock<Tables>,
}

/// Partial update applied to a user row by the back office. Absent
/// fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub plan: Option<Plan>,
    pub credits: Option<u32>,
    pub subscription_credits: Option<u32>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

impl Database {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables::default()),
        }
    }

    // ---- users ----

    /// Insert a registered user. Fails when the email is taken.
    pub fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut tables = self.inner.write();
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::EmailTaken(user.email));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// User row by id.
    pub fn get_user(&self, id: Uuid) -> Option<User> {
        self.inner.read().users.get(&id).cloned()
    }

    /// User row by email (case-insensitive).
    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.inner
            .read()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Apply a partial update.
    pub fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User, StoreError> {
        let mut tables = self.inner.write();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::UserNotFound(id))?;
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(plan) = update.plan {
            user.plan = plan;
        }
        if let Some(credits) = update.credits {
            user.credits = credits;
        }
        if let Some(subscription_credits) = update.subscription_credits {
            user.subscription_credits = subscription_credits;
        }
        if let Some(expires) = update.subscription_expires_at {
            user.subscription_expires_at = Some(expires);
        }
        Ok(user.clone())
    }

    /// Delete a user and cascade to their analyses and tickets.
    pub fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write();
        if tables.users.remove(&id).is_none() {
            return Err(StoreError::UserNotFound(id));
        }
        tables.analyses.retain(|_, a| a.user_id != id);
        tables.tickets.retain(|_, t| t.user_id != id);
        Ok(())
    }

    /// Users matching `filter`, newest first, capped at the listing limit.
    pub fn list_users(&self, filter: &UserFilter) -> Vec<User> {
        let mut users: Vec<User> = self
            .inner
            .read()
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users.truncate(LIST_LIMIT);
        users
    }

    /// Full user table scan for reporting.
    pub fn all_users(&self) -> Vec<User> {
        self.inner.read().users.values().cloned().collect()
    }

    /// Set the purchased-credit balance to an absolute value.
    pub fn set_purchased_credits(&self, id: Uuid, credits: u32) -> Result<User, StoreError> {
        let mut tables = self.inner.write();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::UserNotFound(id))?;
        user.credits = credits;
        Ok(user.clone())
    }

    /// Record a login.
    pub fn touch_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.inner.write();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::UserNotFound(id))?;
        user.last_login = Some(at);
        Ok(())
    }

    // ---- analyses ----

    /// A user's analyses, newest first.
    pub fn analyses_for_user(&self, user_id: Uuid) -> Vec<Analysis> {
        let mut rows: Vec<Analysis> = self
            .inner
            .read()
            .analyses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    /// Full analysis table scan for reporting.
    pub fn all_analyses(&self) -> Vec<Analysis> {
        self.inner.read().analyses.values().cloned().collect()
    }

    /// Drop every analysis row; returns how many were removed.
    pub fn reset_analyses(&self) -> usize {
        let mut tables = self.inner.write();
        let count = tables.analyses.len();
        tables.analyses.clear();
        count
    }

    // ---- tickets ----

    /// Insert a ticket row.
    pub fn insert_ticket(&self, ticket: Ticket) -> Ticket {
        self.inner
            .write()
            .tickets
            .insert(ticket.id, ticket.clone());
        ticket
    }

    /// Ticket row by id.
    pub fn get_ticket(&self, id: Uuid) -> Option<Ticket> {
        self.inner.read().tickets.get(&id).cloned()
    }

    /// Mutate a ticket row in place.
    pub fn update_ticket<F>(&self, id: Uuid, mutate: F) -> Result<Ticket, StoreError>
    where
        F: FnOnce(&mut Ticket),
    {
        let mut tables = self.inner.write();
        let ticket = tables
            .tickets
            .get_mut(&id)
            .ok_or(StoreError::TicketNotFound(id))?;
        mutate(ticket);
        Ok(ticket.clone())
    }

    /// Tickets matching `filter`, newest first.
    pub fn list_tickets(&self, filter: &TicketFilter) -> Vec<Ticket> {
        let mut rows: Vec<Ticket> = self
            .inner
            .read()
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    /// A user's own tickets, newest first.
    pub fn tickets_for_user(&self, user_id: Uuid) -> Vec<Ticket> {
        let mut rows: Vec<Ticket> = self
            .inner
            .read()
            .tickets
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    // ---- settings ----

    /// Insert or replace a setting.
    pub fn upsert_setting(&self, key: &str, value: &str, description: &str) -> SystemSetting {
        let setting = SystemSetting {
            key: key.into(),
            value: value.into(),
            description: description.into(),
        };
        self.inner
            .write()
            .settings
            .insert(setting.key.clone(), setting.clone());
        setting
    }

    /// Value of one setting.
    pub fn setting(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .settings
            .get(key)
            .map(|s| s.value.clone())
    }

    /// All settings.
    pub fn settings(&self) -> Vec<SystemSetting> {
        let mut rows: Vec<SystemSetting> =
            self.inner.read().settings.values().cloned().collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for Database {
    fn load_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.get_user(id))
    }

    fn start_trial(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        grant: u32,
    ) -> Result<TrialStart, StoreError> {
        let mut tables = self.inner.write();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::UserNotFound(id))?;

        // Set-if-absent under the write lock: a concurrent first use
        // observes the timestamp and loses cleanly.
        if user.trial_started_at.is_some() {
            return Ok(TrialStart::AlreadyStarted);
        }
        user.trial_started_at = Some(at);
        user.subscription_credits += grant;
        Ok(TrialStart::Started)
    }

    fn commit_usage(
        &self,
        user_id: Uuid,
        source: Option<FundingSource>,
        analysis: Analysis,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.write();

        // Validate everything before touching any row; the two writes
        // below then succeed together or not at all.
        let user = tables
            .users
            .get(&user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;
        match source {
            Some(FundingSource::Subscription) if user.subscription_credits == 0 => {
                return Err(StoreError::EmptyBalance(FundingSource::Subscription));
            }
            Some(FundingSource::Purchased) if user.credits == 0 => {
                return Err(StoreError::EmptyBalance(FundingSource::Purchased));
            }
            _ => {}
        }

        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;
        match source {
            Some(FundingSource::Subscription) => user.subscription_credits -= 1,
            Some(FundingSource::Purchased) => user.credits -= 1,
            None => {}
        }
        tables.analyses.insert(analysis.id, analysis);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{AnalysisKind, TicketCategory, TicketStatus};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn seeded_user(db: &Database) -> User {
        db.insert_user(User::register("u@example.com", "U", t0()))
            .unwrap()
    }

    fn analysis_row(user_id: Uuid, source: Option<FundingSource>) -> Analysis {
        Analysis {
            id: Uuid::new_v4(),
            user_id,
            image_url: "data:image/png;base64,xxxx".into(),
            score: 72,
            result: serde_json::json!({"total_score": 72}),
            kind: AnalysisKind::General,
            media_id: "watercolor".into(),
            style_id: "general".into(),
            scenario_id: "free_practice".into(),
            funded_by: source,
            created_at: t0(),
        }
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::new();
        seeded_user(&db);
        let err = db
            .insert_user(User::register("U@EXAMPLE.COM", "Other", t0()))
            .unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken(_)));
    }

    #[test]
    fn start_trial_is_set_if_absent() {
        let db = Database::new();
        let user = seeded_user(&db);

        assert_eq!(
            db.start_trial(user.id, t0(), 7).unwrap(),
            TrialStart::Started
        );
        assert_eq!(
            db.start_trial(user.id, t0(), 7).unwrap(),
            TrialStart::AlreadyStarted
        );

        let row = db.get_user(user.id).unwrap();
        assert_eq!(row.subscription_credits, 7);
        assert_eq!(row.trial_started_at, Some(t0()));
    }

    #[test]
    fn concurrent_trial_starts_grant_once() {
        let db = std::sync::Arc::new(Database::new());
        let user = seeded_user(&db);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                let id = user.id;
                std::thread::spawn(move || db.start_trial(id, t0(), 7).unwrap())
            })
            .collect();
        let outcomes: Vec<TrialStart> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let started = outcomes
            .iter()
            .filter(|o| **o == TrialStart::Started)
            .count();
        assert_eq!(started, 1);
        assert_eq!(db.get_user(user.id).unwrap().subscription_credits, 7);
    }

    #[test]
    fn commit_usage_decrements_and_records_together() {
        let db = Database::new();
        let mut user = User::register("u@example.com", "U", t0());
        user.subscription_credits = 3;
        user.credits = 5;
        let user = db.insert_user(user).unwrap();

        db.commit_usage(
            user.id,
            Some(FundingSource::Subscription),
            analysis_row(user.id, Some(FundingSource::Subscription)),
        )
        .unwrap();

        let row = db.get_user(user.id).unwrap();
        assert_eq!(row.subscription_credits, 2);
        assert_eq!(row.credits, 5);
        assert_eq!(db.analyses_for_user(user.id).len(), 1);
    }

    #[test]
    fn commit_usage_on_empty_balance_changes_nothing() {
        let db = Database::new();
        let user = seeded_user(&db);

        let err = db
            .commit_usage(
                user.id,
                Some(FundingSource::Purchased),
                analysis_row(user.id, Some(FundingSource::Purchased)),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::EmptyBalance(FundingSource::Purchased)
        ));

        // Neither half of the transaction landed.
        let row = db.get_user(user.id).unwrap();
        assert_eq!(row.credits, 0);
        assert!(db.analyses_for_user(user.id).is_empty());
    }

    #[test]
    fn commit_usage_without_source_records_only() {
        let db = Database::new();
        let user = seeded_user(&db);

        db.commit_usage(user.id, None, analysis_row(user.id, None))
            .unwrap();
        let row = db.get_user(user.id).unwrap();
        assert_eq!(row.credits, 0);
        assert_eq!(row.subscription_credits, 0);
        assert_eq!(db.analyses_for_user(user.id).len(), 1);
    }

    #[test]
    fn recorder_drains_subscription_before_purchased() {
        use atelier_billing::{funding_source, DeductionOutcome, UsageRecorder};
        use atelier_core::SystemClock;

        let db = std::sync::Arc::new(Database::new());
        let mut user = User::register("u@example.com", "U", t0());
        user.plan = Plan::Plus;
        user.subscription_credits = 3;
        user.credits = 5;
        let user = db.insert_user(user).unwrap();

        let recorder = UsageRecorder::new(db.clone(), std::sync::Arc::new(SystemClock));
        let artifact = || atelier_billing::UsageArtifact {
            image_url: "data:image/png;base64,xxxx".into(),
            score: 60,
            report: serde_json::json!({}),
            kind: AnalysisKind::General,
            media_id: "watercolor".into(),
            style_id: "general".into(),
            scenario_id: "free_practice".into(),
        };

        // Three units off the subscription balance first.
        for expected in [2u32, 1, 0] {
            let outcome = recorder.record(user.id, artifact());
            assert_eq!(
                outcome,
                DeductionOutcome::Recorded {
                    funded_by: Some(FundingSource::Subscription)
                }
            );
            assert_eq!(db.get_user(user.id).unwrap().subscription_credits, expected);
            assert_eq!(db.get_user(user.id).unwrap().credits, 5);
        }

        // Then the purchased balance.
        let outcome = recorder.record(user.id, artifact());
        assert_eq!(
            outcome,
            DeductionOutcome::Recorded {
                funded_by: Some(FundingSource::Purchased)
            }
        );
        let row = db.get_user(user.id).unwrap();
        assert_eq!(row.credits, 4);
        assert_eq!(funding_source(&row, t0()), Some(FundingSource::Purchased));
        assert_eq!(db.analyses_for_user(user.id).len(), 4);
    }

    #[test]
    fn delete_user_cascades() {
        let db = Database::new();
        let user = seeded_user(&db);
        db.commit_usage(user.id, None, analysis_row(user.id, None))
            .unwrap();
        db.insert_ticket(Ticket {
            id: Uuid::new_v4(),
            user_id: user.id,
            subject: "s".into(),
            content: "c".into(),
            category: TicketCategory::Other,
            status: TicketStatus::Open,
            tags: vec![],
            reply: None,
            created_at: t0(),
            updated_at: t0(),
        });

        db.delete_user(user.id).unwrap();
        assert!(db.get_user(user.id).is_none());
        assert!(db.analyses_for_user(user.id).is_empty());
        assert!(db.tickets_for_user(user.id).is_empty());
    }

    #[test]
    fn listing_is_filtered_and_newest_first() {
        let db = Database::new();
        let mut a = User::register("a@example.com", "Alice", t0());
        a.plan = Plan::Plus;
        let mut b = User::register("b@example.com", "Bob", t0() + chrono::Duration::hours(1));
        b.plan = Plan::Pro;
        db.insert_user(a).unwrap();
        db.insert_user(b).unwrap();

        let all = db.list_users(&UserFilter::default());
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Bob");

        let plus_only = db.list_users(&UserFilter {
            plan: Some(Plan::Plus),
            ..Default::default()
        });
        assert_eq!(plus_only.len(), 1);
        assert_eq!(plus_only[0].name, "Alice");
    }

    #[test]
    fn settings_upsert_replaces() {
        let db = Database::new();
        db.upsert_setting("maintenance", "off", "");
        db.upsert_setting("maintenance", "on", "");
        assert_eq!(db.setting("maintenance").as_deref(), Some("on"));
        assert_eq!(db.settings().len(), 1);
    }
}
