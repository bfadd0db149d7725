//! In-process document store with live listeners.
//!
//! Every write re-runs the predicate of each listener on the touched
//! collection and queues a fresh full snapshot. Queued deliveries run in the
//! order they were built, outside the internal lock, so callbacks may call back
//! into the store. A write made from inside a callback is delivered once that
//! callback returns.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cumeets_states::{TaskHandle, TaskId};
use log::{debug, info};

use super::{Document, DocumentStore, OnError, OnSnapshot, Predicate, Subscription};

struct Listener {
    collection: String,
    predicate: Predicate,
    on_snapshot: OnSnapshot,
    on_error: OnError,
}

enum Delivery {
    Snapshot(OnSnapshot, Vec<Document>),
    Error(OnError, String),
}

impl Delivery {
    fn run(self) {
        match self {
            Self::Snapshot(on_snapshot, documents) => on_snapshot(documents),
            Self::Error(on_error, message) => on_error(message),
        }
    }
}

#[derive(Default)]
struct Inner {
    collections: BTreeMap<String, Vec<Document>>,
    listeners: BTreeMap<u64, Listener>,
    next_generation: u64,
    outbox: VecDeque<Delivery>,
    // Set while one caller is draining `outbox`.
    delivering: bool,
}

impl Inner {
    fn snapshot(&self, collection: &str, predicate: &Predicate) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| predicate.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn queue_snapshots(&mut self, collection: &str) {
        let pending: Vec<Delivery> = self
            .listeners
            .values()
            .filter(|listener| listener.collection == collection)
            .map(|listener| {
                Delivery::Snapshot(
                    Arc::clone(&listener.on_snapshot),
                    self.snapshot(collection, &listener.predicate),
                )
            })
            .collect();
        self.outbox.extend(pending);
    }
}

/// A shareable in-memory store. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryStore")
            .field("collections", &inner.collections.len())
            .field("listeners", &inner.listeners.len())
            .field("queued", &inner.outbox.len())
            .finish()
    }
}

// Hands the outbox back if a callback panics mid-drain.
struct DrainGuard<'a> {
    store: &'a MemoryStore,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.store.lock().delivering = false;
        }
    }
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `documents` in `collection`.
    pub fn with_documents(collection: &str, documents: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        store
            .lock()
            .collections
            .insert(collection.to_owned(), documents.into_iter().collect());
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run queued deliveries in order.
    ///
    /// Only one caller drains at a time; anyone else returns immediately and
    /// leaves their deliveries to the active drainer.
    fn flush(&self) {
        {
            let mut inner = self.lock();
            if inner.delivering {
                return;
            }
            inner.delivering = true;
        }
        let _guard = DrainGuard { store: self };
        loop {
            let batch: Vec<Delivery> = {
                let mut inner = self.lock();
                if inner.outbox.is_empty() {
                    inner.delivering = false;
                    return;
                }
                inner.outbox.drain(..).collect()
            };
            for delivery in batch {
                delivery.run();
            }
        }
    }

    /// Insert `document`, or replace the one with the same id in place.
    pub fn upsert(&self, collection: &str, document: Document) {
        {
            let mut inner = self.lock();
            let docs = inner.collections.entry(collection.to_owned()).or_default();
            match docs.iter_mut().find(|doc| doc.id == document.id) {
                Some(existing) => *existing = document,
                None => docs.push(document),
            }
            inner.queue_snapshots(collection);
        }
        self.flush();
    }

    /// Returns whether a document was removed.
    pub fn remove(&self, collection: &str, id: &str) -> bool {
        {
            let mut inner = self.lock();
            let Some(docs) = inner.collections.get_mut(collection) else {
                return false;
            };
            let before = docs.len();
            docs.retain(|doc| doc.id != id);
            if docs.len() == before {
                return false;
            }
            inner.queue_snapshots(collection);
        }
        self.flush();
        true
    }

    /// Deliver `message` to every listener on `collection` and drop them.
    pub fn fail(&self, collection: &str, message: &str) {
        let failed = {
            let mut inner = self.lock();
            let ids: Vec<u64> = inner
                .listeners
                .iter()
                .filter(|(_, listener)| listener.collection == collection)
                .map(|(id, _)| *id)
                .collect();
            let errors: Vec<Delivery> = ids
                .iter()
                .filter_map(|id| inner.listeners.remove(id))
                .map(|listener| Delivery::Error(listener.on_error, message.to_owned()))
                .collect();
            let failed = errors.len();
            inner.outbox.extend(errors);
            failed
        };
        info!("Failing {failed} listener(s) on `{collection}`: {message}");
        self.flush();
    }

    /// One-shot read.
    pub fn snapshot(&self, collection: &str, predicate: &Predicate) -> Vec<Document> {
        self.lock().snapshot(collection, predicate)
    }

    /// Number of live listeners across all collections.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl DocumentStore for MemoryStore {
    fn subscribe(
        &self,
        collection: &str,
        predicate: Predicate,
        on_snapshot: OnSnapshot,
        on_error: OnError,
    ) -> Subscription {
        let generation = {
            let mut inner = self.lock();
            inner.next_generation += 1;
            let generation = inner.next_generation;
            let initial = inner.snapshot(collection, &predicate);
            inner.listeners.insert(
                generation,
                Listener {
                    collection: collection.to_owned(),
                    predicate,
                    on_snapshot: Arc::clone(&on_snapshot),
                    on_error,
                },
            );
            inner
                .outbox
                .push_back(Delivery::Snapshot(on_snapshot, initial));
            generation
        };

        let handle = TaskHandle::spawn_token(TaskId::new(collection, generation));
        debug!("Memory listener {} started", handle.id());
        self.flush();

        let inner = Arc::clone(&self.inner);
        Subscription::with_release(handle, move || {
            let removed = inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&generation)
                .is_some();
            if removed {
                debug!("Memory listener #{generation} released");
            }
        })
    }
}
