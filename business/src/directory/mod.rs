//! The live directory behind the home screen.
//!
//! A [`Directory`] owns at most one store subscription, bound to the current
//! [`Role`]. Store callbacks may fire on any thread; they only enqueue events
//! tagged with the subscription's generation. The owner applies them with
//! [`Directory::sync`] (or awaits [`Directory::wait_for_update`]), and events
//! from a subscription that has since been replaced are dropped there.
//!
//! ```ignore
//! let mut directory = Directory::new(store);
//! directory.mount();
//!
//! // every frame
//! directory.sync();
//! match directory.view() { /* render */ }
//!
//! // toggle pressed
//! directory.set_role(Role::Student);
//! ```

mod state;
mod view;

use std::sync::Arc;

use chrono::Utc;
use cumeets_states::{LatestOnlyChannel, TaskId};
use log::{debug, info, warn};
use ustr::Ustr;

pub use state::{DirectoryPhase, DirectoryState, FALLBACK_ERROR_MESSAGE};
pub use view::DirectoryView;

use crate::config::{DEFAULT_USERS_COLLECTION, FirebaseConfig};
use crate::error::DirectoryError;
use crate::filter::{SearchQuery, role_predicate};
use crate::store::{Document, DocumentStore, OnError, OnSnapshot, Subscription};
use crate::user::{Role, UserRecord};

/// Raw callback payloads, queued until the owner syncs.
#[derive(Debug)]
enum DirectoryEvent {
    Snapshot(Vec<Document>),
    Error(String),
}

pub struct Directory {
    store: Arc<dyn DocumentStore>,
    collection: Ustr,
    role: Role,
    query: SearchQuery,
    state: DirectoryState,
    events: LatestOnlyChannel<DirectoryEvent>,
    subscription: Option<Subscription>,
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("collection", &self.collection)
            .field("role", &self.role)
            .field("query", &self.query.raw())
            .field("state", &self.state)
            .field("generation", &self.events.generation())
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

impl Directory {
    /// An unmounted directory over the default `users` collection.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: Ustr::from(DEFAULT_USERS_COLLECTION),
            role: Role::default(),
            query: SearchQuery::default(),
            state: DirectoryState::new(),
            events: LatestOnlyChannel::new(),
            subscription: None,
        }
    }

    /// An unmounted directory over the configured users collection.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &FirebaseConfig) -> Self {
        Self::new(store).with_collection(config.users_collection().as_str())
    }

    /// Listen to `collection` instead of the default.
    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = Ustr::from(collection);
        self
    }

    /// Open the subscription for the current role. No-op when already mounted.
    pub fn mount(&mut self) {
        if self.subscription.is_none() {
            self.resubscribe();
        }
    }

    /// Release the subscription. Events still in flight are ignored.
    pub fn unmount(&mut self) {
        self.events.invalidate();
        if let Some(subscription) = self.subscription.take() {
            info!("Releasing directory subscription {}", subscription.id());
        }
    }

    /// Switch roles, replacing the live subscription.
    ///
    /// Selecting the role that is already live keeps the current subscription.
    pub fn set_role(&mut self, role: Role) {
        if role == self.role && self.subscription.is_some() {
            return;
        }
        self.role = role;
        self.resubscribe();
    }

    /// Replace the search text. Local only; the subscription is untouched.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = SearchQuery::new(text);
    }

    fn resubscribe(&mut self) {
        // Drop the old listener before opening the new one.
        self.subscription = None;

        let updater = self.events.begin();
        let snapshot_updater = updater.clone();
        let on_snapshot: OnSnapshot = Arc::new(move |docs: Vec<Document>| {
            snapshot_updater.set(DirectoryEvent::Snapshot(docs));
        });
        let on_error: OnError = Arc::new(move |message: String| {
            updater.set(DirectoryEvent::Error(message));
        });

        self.state.set_loading();
        let predicate = role_predicate(self.role);
        info!(
            "Subscribing to `{}` where {predicate} (generation {})",
            self.collection,
            self.events.generation()
        );
        self.subscription = Some(self.store.subscribe(
            self.collection.as_str(),
            predicate,
            on_snapshot,
            on_error,
        ));
    }

    /// Apply queued events from the live subscription.
    ///
    /// Returns whether anything was applied.
    pub fn sync(&mut self) -> bool {
        let events = self.events.drain();
        let changed = !events.is_empty();
        for event in events {
            self.apply(event);
        }
        changed
    }

    /// Wait for the next event from the live subscription and apply it along
    /// with anything else queued. Returns `false` immediately when unmounted.
    pub async fn wait_for_update(&mut self) -> bool {
        if self.subscription.is_none() {
            return false;
        }
        match self.events.recv_current().await {
            Some(event) => {
                self.apply(event);
                self.sync();
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, event: DirectoryEvent) {
        match event {
            DirectoryEvent::Snapshot(documents) => {
                let users: Vec<UserRecord> =
                    documents.iter().map(UserRecord::from_document).collect();
                debug!("Directory snapshot: {} {}", users.len(), self.role);
                self.state.update_users(users, Utc::now());
            }
            DirectoryEvent::Error(message) => {
                warn!("Directory subscription failed: {message}");
                self.state.set_error(message);
            }
        }
    }

    /// The role the live (or next) subscription is bound to.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current search query.
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Collection the directory listens to.
    pub fn collection(&self) -> Ustr {
        self.collection
    }

    /// Raw state as last applied by `sync`.
    pub fn state(&self) -> &DirectoryState {
        &self.state
    }

    /// Lifecycle phase of the current subscription.
    pub fn phase(&self) -> DirectoryPhase {
        self.state.phase()
    }

    /// Whether the current subscription has not answered yet.
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Users from the latest snapshot, unfiltered.
    pub fn users(&self) -> &[UserRecord] {
        self.state.users()
    }

    /// The subscription failure, if the latest event was an error.
    pub fn error(&self) -> Option<DirectoryError> {
        self.state
            .error()
            .map(|message| DirectoryError::Subscription(message.to_owned()))
    }

    /// Whether a subscription is live.
    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Task id of the live subscription.
    pub fn subscription_id(&self) -> Option<TaskId> {
        self.subscription.as_ref().map(Subscription::id)
    }

    /// Users matching the current query, in snapshot order.
    pub fn derived_list(&self) -> Vec<&UserRecord> {
        self.query.apply(self.state.users())
    }

    /// What to render: loading, then error, then empty, then the list.
    pub fn view(&self) -> DirectoryView<'_> {
        if self.state.phase() == DirectoryPhase::Idle {
            return DirectoryView::Idle;
        }
        if self.state.is_loading() {
            return DirectoryView::Loading { role: self.role };
        }
        if let Some(message) = self.state.error() {
            return DirectoryView::Error(message);
        }
        let users = self.derived_list();
        if users.is_empty() {
            DirectoryView::Empty { role: self.role }
        } else {
            DirectoryView::Results(users)
        }
    }
}
