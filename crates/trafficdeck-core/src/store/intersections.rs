// ── Intersections store ──
//
// The only store that listens for backend pushes: every change signal
// triggers a full re-fetch. An empty or failed fetch shows the single
// placeholder intersection so the monitor view is never blank.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use super::Subscription;
use super::sync::{EntitySyncStore, SyncSnapshot};
use crate::fallback::placeholder_intersection;
use crate::model::{EntityKind, Intersection};
use crate::source::{CollectionSource, Filters};
use crate::stream::SnapshotStream;

pub struct IntersectionStore<S> {
    source: Arc<S>,
    state: EntitySyncStore<Vec<Intersection>>,
    subscription: OnceLock<Subscription>,
}

impl<S: CollectionSource<Intersection>> IntersectionStore<S> {
    /// An idle store: no fetch, no subscription.
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            state: EntitySyncStore::new(EntityKind::Intersection, Vec::new()),
            subscription: OnceLock::new(),
        }
    }

    /// Open the change subscription, then run the first refresh.
    pub async fn activate(source: Arc<S>) -> Arc<Self> {
        let store = Arc::new(Self::new(source));
        store.watch_changes();
        store.refresh().await;
        store
    }

    fn watch_changes(self: &Arc<Self>) {
        let mut feed = match self.source.subscribe() {
            Ok(feed) => feed,
            Err(e) => {
                info!(error = %e, "no intersection change feed, refreshing on demand only");
                return;
            }
        };
        let cancel = feed.cancel_token();
        let store = Arc::downgrade(self);

        let stopped = cancel.clone();

        let task = tokio::spawn(async move {
            while feed.next().await.is_some() {
                // Disposal can land between receiving a signal and acting on it.
                if stopped.is_cancelled() {
                    break;
                }
                let Some(store) = store.upgrade() else {
                    break;
                };
                debug!("intersections changed upstream");
                store.refresh().await;
            }
            debug!("intersection change listener stopped");
        });

        if let Err(extra) = self.subscription.set(Subscription::new(cancel, task)) {
            extra.dispose();
        }
    }

    /// Re-fetch every intersection. Never fails.
    pub async fn refresh(&self) {
        self.state.begin();
        match self.source.fetch_all(&Filters::none()).await {
            Ok(records) if records.is_empty() => {
                debug!("backend has no intersections, showing placeholder");
                self.state.succeed(vec![placeholder_intersection()]);
            }
            Ok(records) => self.state.succeed(records),
            Err(e) => self.state.degrade(vec![placeholder_intersection()], &e),
        }
    }

    /// Release the change subscription. Safe to call repeatedly.
    pub fn dispose(&self) {
        if let Some(subscription) = self.subscription.get() {
            subscription.dispose();
        }
    }

    /// A live change subscription is attached.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.get().is_some_and(|s| !s.is_disposed())
    }
}

impl<S> IntersectionStore<S> {
    pub fn snapshot(&self) -> SyncSnapshot<Vec<Intersection>> {
        self.state.snapshot()
    }

    pub fn records(&self) -> Arc<Vec<Intersection>> {
        self.state.records()
    }

    pub fn subscribe(&self) -> SnapshotStream<SyncSnapshot<Vec<Intersection>>> {
        self.state.subscribe()
    }

    pub fn find(&self, id: &str) -> Option<Intersection> {
        self.state.records().iter().find(|i| i.id == id).cloned()
    }

    /// The matching record, or the placeholder when `id` is unset or
    /// unknown.
    pub fn find_or_placeholder(&self, id: Option<&str>) -> Intersection {
        id.and_then(|id| self.find(id))
            .unwrap_or_else(placeholder_intersection)
    }
}
