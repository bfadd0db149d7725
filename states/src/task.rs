//! Task identity and cooperative cancellation.
//!
//! - `TaskId`: a kind label plus a generation counter
//! - `TaskHandle`: a `TaskId` paired with the `CancellationToken` that stops the task
//!
//! A live subscription is modelled as a task: the store spawns (or registers) the
//! listener and hands back a `TaskHandle`. Cancelling the handle is how the owner
//! tears the listener down.
//!
//! ```ignore
//! use cumeets_states::{TaskHandle, TaskId};
//! use tokio_util::sync::CancellationToken;
//!
//! let handle = TaskHandle::new(TaskId::new("users", 1), CancellationToken::new());
//! let token = handle.cancellation_token();
//!
//! // inside the task
//! tokio::select! {
//!     _ = token.cancelled() => return,
//!     res = poll_once() => { /* ... */ }
//! }
//!
//! handle.cancel();
//! ```

use std::fmt;

use tokio_util::sync::CancellationToken;
use ustr::Ustr;

/// Identifier for a spawned task.
///
/// `kind` names what the task does (usually the collection it listens to) and
/// `generation` distinguishes successive tasks of the same kind. A higher
/// generation always belongs to a more recently started task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    kind: Ustr,
    generation: u64,
}

impl TaskId {
    pub fn new(kind: impl AsRef<str>, generation: u64) -> Self {
        Self {
            kind: Ustr::from(kind.as_ref()),
            generation,
        }
    }

    pub fn kind(&self) -> Ustr {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `self` was started after `other` for the same kind.
    pub fn supersedes(&self, other: &Self) -> bool {
        self.kind == other.kind && self.generation > other.generation
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.generation)
    }
}

/// Handle to a running task with cooperative cancellation.
///
/// Clones share the same token, so cancelling any clone cancels the task.
/// Cancellation is a request: the task observes it at its next check point
/// (`is_cancelled()` or `cancelled().await`).
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    /// Creates a handle with a fresh token.
    pub fn spawn_token(id: TaskId) -> Self {
        Self::new(id, CancellationToken::new())
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns a clone of the token for the task body to watch.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}
