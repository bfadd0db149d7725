//! Local state behind the home screen.
//!
//! Mirrors the three pieces the screen renders from (`users`, `loading`,
//! `error`) and tracks which lifecycle phase produced them.

use chrono::{DateTime, Utc};

use crate::user::UserRecord;

/// Shown when a store reports an error without a message.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to load users.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryPhase {
    /// No subscription has been opened yet.
    #[default]
    Idle,

    /// A subscription is open and has not delivered anything yet.
    Loading,

    /// The latest event was a snapshot.
    Loaded,

    /// The latest event was an error; the listener is gone.
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryState {
    users: Vec<UserRecord>,
    loading: bool,
    error: Option<String>,
    phase: DirectoryPhase,
    last_snapshot: Option<DateTime<Utc>>,
}

impl DirectoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new subscription was opened.
    ///
    /// Users from the previous subscription are kept until the first snapshot
    /// replaces them; the view hides them while loading.
    pub fn set_loading(&mut self) {
        self.loading = true;
        self.error = None;
        self.phase = DirectoryPhase::Loading;
    }

    /// Replace the users with a full snapshot.
    ///
    /// Takes `now` as a parameter so tests control the timestamp.
    pub fn update_users(&mut self, users: Vec<UserRecord>, now: DateTime<Utc>) {
        self.users = users;
        self.loading = false;
        self.error = None;
        self.phase = DirectoryPhase::Loaded;
        self.last_snapshot = Some(now);
    }

    /// Record a failed subscription. Only an empty message is replaced by
    /// [`FALLBACK_ERROR_MESSAGE`].
    pub fn set_error(&mut self, message: String) {
        self.users.clear();
        self.loading = false;
        self.error = Some(if message.is_empty() {
            FALLBACK_ERROR_MESSAGE.to_owned()
        } else {
            message
        });
        self.phase = DirectoryPhase::Failed;
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> DirectoryPhase {
        self.phase
    }

    pub fn last_snapshot(&self) -> Option<DateTime<Utc>> {
        self.last_snapshot
    }
}
