//! The document-store collaborator.
//!
//! A store delivers full snapshots of the documents matching a predicate and
//! keeps delivering a new one whenever the remote result changes. Dropping the
//! returned [`Subscription`] stops delivery.

pub mod firestore;
pub mod memory;

use std::fmt;
use std::sync::Arc;

use cumeets_states::{TaskHandle, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ustr::Ustr;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// One document: an opaque id plus arbitrary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Equal,
}

/// Server-side filter `{field} {op} {value}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: Ustr,
    pub op: FieldOp,
    pub value: String,
}

impl Predicate {
    pub fn equals(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: Ustr::from(field),
            op: FieldOp::Equal,
            value: value.into(),
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self.op {
            FieldOp::Equal => document
                .field(self.field.as_str())
                .and_then(Value::as_str)
                .is_some_and(|value| value == self.value),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            FieldOp::Equal => write!(f, "{} == {:?}", self.field, self.value),
        }
    }
}

pub type OnSnapshot = Arc<dyn Fn(Vec<Document>) + Send + Sync>;
pub type OnError = Arc<dyn Fn(String) + Send + Sync>;

/// A live listener. Dropping it releases the listener.
pub struct Subscription {
    handle: TaskHandle,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.handle.id())
            .field("cancelled", &self.handle.is_cancelled())
            .finish()
    }
}

impl Subscription {
    pub fn new(handle: TaskHandle) -> Self {
        Self {
            handle,
            release: None,
        }
    }

    /// Runs `release` once, when the subscription is dropped.
    pub fn with_release(handle: TaskHandle, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            handle,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> TaskId {
        self.handle.id()
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.cancel();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Anything that can stream query snapshots of a collection.
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Start listening to `collection` filtered by `predicate`.
    ///
    /// `on_snapshot` receives at least one full snapshot and then a new one on
    /// every remote change. `on_error` ends the listener; nothing is delivered
    /// after it.
    fn subscribe(
        &self,
        collection: &str,
        predicate: Predicate,
        on_snapshot: OnSnapshot,
        on_error: OnError,
    ) -> Subscription;
}
