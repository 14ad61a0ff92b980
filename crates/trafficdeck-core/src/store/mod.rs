// ── Entity sync stores ──
//
// One independently lifecycled store per entity kind. Each owns its
// source handle and publishes immutable snapshots; none of them share
// global state. Fetch failures never escape `refresh`: the store swaps in
// fallback data and records the message in `last_error`.

mod alerts;
mod intersections;
mod stats;
mod sync;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use alerts::AlertStore;
pub use intersections::IntersectionStore;
pub use stats::StatsStore;
pub use sync::{EntitySyncStore, SyncSnapshot};

/// Owns the background task that turns change signals into refreshes.
///
/// Disposing stops the task before any further refresh; disposing twice is
/// harmless. Dropping the handle disposes it.
#[derive(Debug)]
pub struct Subscription {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { cancel, task }
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the listener task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
