//! Generation-tagged updates.
//!
//! Producers running out-of-band (store listeners, spawned tasks) hold a
//! [`LatestOnlyUpdater`]. Every value they send is tagged with the generation
//! the updater was created for. The owner keeps the [`LatestOnlyChannel`] and
//! bumps the generation whenever earlier producers become obsolete; values from
//! older generations are discarded when the owner drains the channel.

use flume::{Receiver, Sender};
use log::debug;

struct Tagged<T> {
    generation: u64,
    value: T,
}

/// Sending half bound to a single generation.
pub struct LatestOnlyUpdater<T> {
    generation: u64,
    send: Sender<Tagged<T>>,
}

impl<T> Clone for LatestOnlyUpdater<T> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            send: self.send.clone(),
        }
    }
}

impl<T> std::fmt::Debug for LatestOnlyUpdater<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatestOnlyUpdater")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<T> LatestOnlyUpdater<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Enqueue `value` for the owner.
    ///
    /// A dropped channel means the owner is gone; the value is discarded.
    pub fn set(&self, value: T) {
        let tagged = Tagged {
            generation: self.generation,
            value,
        };
        if self.send.send(tagged).is_err() {
            debug!(
                "Update for generation {} dropped: channel closed",
                self.generation
            );
        }
    }
}

/// Receiving half that only yields values from the current generation.
pub struct LatestOnlyChannel<T> {
    send: Sender<Tagged<T>>,
    recv: Receiver<Tagged<T>>,
    generation: u64,
}

impl<T> Default for LatestOnlyChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for LatestOnlyChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatestOnlyChannel")
            .field("generation", &self.generation)
            .field("queued", &self.recv.len())
            .finish()
    }
}

impl<T> LatestOnlyChannel<T> {
    /// Generation 0 is never handed out, so a fresh channel accepts nothing.
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            send,
            recv,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new generation and return an updater bound to it.
    ///
    /// Every updater handed out earlier becomes stale.
    pub fn begin(&mut self) -> LatestOnlyUpdater<T> {
        self.generation += 1;
        LatestOnlyUpdater {
            generation: self.generation,
            send: self.send.clone(),
        }
    }

    /// Make all outstanding updaters stale without starting a new producer.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Take every queued value from the current generation, in send order.
    pub fn drain(&self) -> Vec<T> {
        let mut stale = 0usize;
        let current: Vec<T> = self
            .recv
            .try_iter()
            .filter_map(|tagged| {
                if tagged.generation == self.generation {
                    Some(tagged.value)
                } else {
                    stale += 1;
                    None
                }
            })
            .collect();
        if stale > 0 {
            debug!(
                "Discarded {stale} stale update(s); current generation is {}",
                self.generation
            );
        }
        current
    }

    /// Wait for the next value from the current generation.
    ///
    /// Stale values that arrive first are skipped. Returns `None` only if the
    /// channel is disconnected, which cannot happen while `self` is alive.
    pub async fn recv_current(&self) -> Option<T> {
        loop {
            let tagged = self.recv.recv_async().await.ok()?;
            if tagged.generation == self.generation {
                return Some(tagged.value);
            }
            debug!(
                "Skipped stale update from generation {} (current {})",
                tagged.generation, self.generation
            );
        }
    }
}
