//! Shared helpers for directory integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use cumeets_business::{Document, DocumentStore, OnError, OnSnapshot, Predicate, Subscription};
use cumeets_states::{TaskHandle, TaskId};
use serde_json::json;

/// One `subscribe` call captured by [`RecordingStore`].
struct Recorded {
    collection: String,
    predicate: Predicate,
    on_snapshot: OnSnapshot,
    on_error: OnError,
    handle: TaskHandle,
}

/// A store that never delivers on its own.
///
/// Tests fire callbacks for any past subscription by index, in any order,
/// which is how late callbacks from replaced subscriptions are simulated.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<Recorded>>,
}

impl std::fmt::Debug for RecordingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingStore")
            .field("calls", &self.subscribe_count())
            .finish()
    }
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub fn active_count(&self) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|call| !call.handle.is_cancelled())
            .count()
    }

    pub fn is_active(&self, index: usize) -> bool {
        !self.calls.lock().expect("calls lock")[index]
            .handle
            .is_cancelled()
    }

    pub fn predicate(&self, index: usize) -> Predicate {
        self.calls.lock().expect("calls lock")[index].predicate.clone()
    }

    pub fn collection(&self, index: usize) -> String {
        self.calls.lock().expect("calls lock")[index].collection.clone()
    }

    /// Fire the snapshot callback of subscription `index`, even if released.
    pub fn deliver(&self, index: usize, documents: Vec<Document>) {
        let callback = Arc::clone(&self.calls.lock().expect("calls lock")[index].on_snapshot);
        callback(documents);
    }

    pub fn fail(&self, index: usize, message: &str) {
        let callback = Arc::clone(&self.calls.lock().expect("calls lock")[index].on_error);
        callback(message.to_owned());
    }
}

impl DocumentStore for RecordingStore {
    fn subscribe(
        &self,
        collection: &str,
        predicate: Predicate,
        on_snapshot: OnSnapshot,
        on_error: OnError,
    ) -> Subscription {
        let mut calls = self.calls.lock().expect("calls lock");
        let handle = TaskHandle::spawn_token(TaskId::new(collection, calls.len() as u64 + 1));
        calls.push(Recorded {
            collection: collection.to_owned(),
            predicate,
            on_snapshot,
            on_error,
            handle: handle.clone(),
        });
        Subscription::new(handle)
    }
}

pub fn user_doc(id: &str, name: &str, major: &str, kind: &str) -> Document {
    Document::new(id)
        .with_field("name", json!(name))
        .with_field("major", json!(major))
        .with_field("type", json!(kind))
}

pub fn alumni_docs() -> Vec<Document> {
    vec![
        user_doc("1", "Amy Lee", "CS", "Alumni"),
        user_doc("2", "Bo Park", "Econ", "Alumni"),
    ]
}

pub fn student_docs() -> Vec<Document> {
    vec![user_doc("s1", "Sam Ortiz", "Biology", "Student")]
}
