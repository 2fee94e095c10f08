//! Per-account client state.
//!
//! History, challenge progress and favorites used to live in browser
//! storage keyed per account or guest. Here they sit behind an explicit
//! [`StateStore`] interface so the backing can be swapped (server-side
//! store in production, in-memory fake in tests) instead of living as
//! ambient global state.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a state blob belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKey {
    /// Signed-in account.
    Account(Uuid),
    /// Anonymous visitor.
    Guest,
}

/// One past critique kept for the history tab.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub image_url: String,
    pub score: u32,
    pub media_id: String,
    pub style_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Progress within one master challenge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub challenge_id: String,
    pub completed_steps: u32,
    pub best_score: u32,
}

/// The client-side workspace for one account or guest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientState {
    pub history: Vec<HistoryEntry>,
    pub challenges: Vec<ChallengeProgress>,
    pub favorites: Vec<u32>,
    /// Local analysis counter within the current reset window.
    pub analysis_count: u32,
    pub last_reset: DateTime<Utc>,
}

impl ClientState {
    /// Fresh state with the window anchored at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            history: Vec::new(),
            challenges: Vec::new(),
            favorites: Vec::new(),
            analysis_count: 0,
            last_reset: now,
        }
    }

    /// Roll the usage window if it has lapsed: guests reset on a new
    /// calendar month, accounts on a new ISO week. History, challenges
    /// and favorites survive the roll.
    pub fn roll_window(&mut self, key: &StateKey, now: DateTime<Utc>) -> bool {
        let lapsed = match key {
            StateKey::Guest => {
                self.last_reset.year() != now.year() || self.last_reset.month() != now.month()
            }
            StateKey::Account(_) => self.last_reset.iso_week() != now.iso_week(),
        };
        if lapsed {
            self.analysis_count = 0;
            self.last_reset = now;
        }
        lapsed
    }
}

/// Storage abstraction for client state.
pub trait StateStore: Send + Sync {
    /// State for `key`, or a fresh one anchored at `now`.
    fn load(&self, key: &StateKey, now: DateTime<Utc>) -> ClientState;
    /// Replace the state for `key`.
    fn save(&self, key: &StateKey, state: ClientState);
}

/// In-memory state store.
pub struct MemoryStateStore {
    states: RwLock<HashMap<StateKey, ClientState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, key: &StateKey, now: DateTime<Utc>) -> ClientState {
        self.states
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| ClientState::new(now))
    }

    fn save(&self, key: &StateKey, state: ClientState) {
        self.states.write().insert(key.clone(), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn guest_window_resets_on_month_change() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 25, 10, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap();

        let mut state = ClientState::new(jan);
        state.analysis_count = 4;
        state.favorites = vec![3];

        // Still January: nothing changes.
        assert!(!state.roll_window(&StateKey::Guest, jan + chrono::Duration::days(3)));
        assert_eq!(state.analysis_count, 4);

        assert!(state.roll_window(&StateKey::Guest, feb));
        assert_eq!(state.analysis_count, 0);
        assert_eq!(state.last_reset, feb);
        // Favorites survive the roll.
        assert_eq!(state.favorites, vec![3]);
    }

    #[test]
    fn account_window_resets_on_iso_week_change() {
        // 2024-03-01 is a Friday; 2024-03-04 the following Monday.
        let friday = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2024, 3, 3, 10, 0, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        let key = StateKey::Account(Uuid::new_v4());

        let mut state = ClientState::new(friday);
        state.analysis_count = 2;

        assert!(!state.roll_window(&key, sunday));
        assert_eq!(state.analysis_count, 2);

        assert!(state.roll_window(&key, monday));
        assert_eq!(state.analysis_count, 0);
    }

    #[test]
    fn store_round_trip() {
        let store = MemoryStateStore::new();
        let key = StateKey::Account(Uuid::new_v4());
        let now = Utc::now();

        let mut state = store.load(&key, now);
        assert!(state.history.is_empty());

        state.history.push(HistoryEntry {
            image_url: "data:image/png;base64,xxxx".into(),
            score: 88,
            media_id: "oil".into(),
            style_id: "general".into(),
            created_at: Some(now),
        });
        store.save(&key, state);

        assert_eq!(store.load(&key, now).history.len(), 1);
        // Other keys are unaffected.
        assert!(store.load(&StateKey::Guest, now).history.is_empty());
    }
}
