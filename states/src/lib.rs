//! State plumbing shared by the CU Meets crates.
//!
//! Out-of-band producers talk to the owning thread through generation-tagged
//! channels, and long-running listeners are stopped through task handles.

mod task;
mod updater;

pub use task::{TaskHandle, TaskId};
pub use updater::{LatestOnlyChannel, LatestOnlyUpdater};
