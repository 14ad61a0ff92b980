// ── Alerts store ──
//
// Filtering is delegated to the backend. Only the degraded path filters
// locally, over the bundled demonstration alerts, with the same matching
// rules.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::sync::{EntitySyncStore, SyncSnapshot};
use crate::aggregate::AlertTally;
use crate::fallback::demo_alerts;
use crate::model::{Alert, AlertFilter, EntityKind};
use crate::source::{CollectionSource, Filters};
use crate::stream::SnapshotStream;

pub struct AlertStore<S> {
    source: Arc<S>,
    state: EntitySyncStore<Vec<Alert>>,
    filter: watch::Sender<AlertFilter>,
}

impl<S: CollectionSource<Alert>> AlertStore<S> {
    /// An idle store with the given filter. Nothing is fetched yet.
    pub fn new(source: Arc<S>, filter: AlertFilter) -> Self {
        let (filter, _) = watch::channel(filter);
        Self {
            source,
            state: EntitySyncStore::new(EntityKind::Alert, Vec::new()),
            filter,
        }
    }

    /// Create the store and run the first refresh with `filter`.
    pub async fn activate(source: Arc<S>, filter: AlertFilter) -> Arc<Self> {
        let store = Arc::new(Self::new(source, filter));
        store.refresh().await;
        store
    }

    /// Apply a new filter. Refreshes only when it differs from the current
    /// one; returns whether it did.
    pub async fn set_filter(&self, filter: AlertFilter) -> bool {
        let changed = self.filter.send_if_modified(|current| {
            if *current == filter {
                return false;
            }
            *current = filter;
            true
        });
        if changed {
            debug!(
                status = filter.status_label(),
                category = filter.category_label(),
                "alert filter changed"
            );
            self.refresh().await;
        }
        changed
    }

    /// Fetch alerts matching the current filter, newest first. Never fails.
    pub async fn refresh(&self) {
        let filter = self.filter();
        self.state.begin();
        match self.source.fetch_all(&Filters::from(filter)).await {
            Ok(records) => self.state.succeed(records),
            Err(e) => self.state.degrade(filter.apply(&demo_alerts()), &e),
        }
    }
}

impl<S> AlertStore<S> {
    pub fn filter(&self) -> AlertFilter {
        *self.filter.borrow()
    }

    pub fn snapshot(&self) -> SyncSnapshot<Vec<Alert>> {
        self.state.snapshot()
    }

    pub fn records(&self) -> Arc<Vec<Alert>> {
        self.state.records()
    }

    pub fn subscribe(&self) -> SnapshotStream<SyncSnapshot<Vec<Alert>>> {
        self.state.subscribe()
    }

    /// Open/resolved counts over the current snapshot.
    pub fn tally(&self) -> AlertTally {
        AlertTally::from_snapshot(&self.state.records())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AlertCategory, AlertStatus};
    use crate::testing::{FakeSource, sample_alerts};

    const STATUSES: [&str; 3] = ["all", "pending", "resolved"];
    const CATEGORIES: [&str; 5] = ["all", "accident", "congestion", "device", "emergency"];

    fn ids(alerts: &[Alert]) -> Vec<String> {
        alerts.iter().map(|a| a.id.clone()).collect()
    }

    #[tokio::test]
    async fn degraded_pending_accident_is_alert_one() {
        let filter = AlertFilter::new(Some(AlertStatus::Pending), Some(AlertCategory::Accident));
        let store = AlertStore::activate(Arc::new(FakeSource::unreachable()), filter).await;

        assert_eq!(ids(&store.records()), vec!["1"]);
        assert!(store.snapshot().is_degraded());
    }

    #[tokio::test]
    async fn local_fallback_filtering_matches_backend_filtering() {
        for status in STATUSES {
            for category in CATEGORIES {
                let filter = AlertFilter::from_selection(status, category).unwrap();

                let offline =
                    AlertStore::activate(Arc::new(FakeSource::unreachable()), filter).await;
                let online = AlertStore::activate(
                    Arc::new(FakeSource::online(Vec::new(), demo_alerts())),
                    filter,
                )
                .await;

                assert!(offline.snapshot().is_degraded());
                assert!(!online.snapshot().is_degraded());
                assert_eq!(
                    ids(&offline.records()),
                    ids(&online.records()),
                    "status={status} category={category}"
                );
            }
        }
    }

    #[tokio::test]
    async fn empty_result_is_kept_verbatim() {
        let source = Arc::new(FakeSource::online(Vec::new(), Vec::new()));
        let store = AlertStore::activate(source, AlertFilter::all()).await;
        assert!(store.records().is_empty());
        assert!(store.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn filter_is_sent_to_backend() {
        let source = Arc::new(FakeSource::online(Vec::new(), sample_alerts()));
        let store = AlertStore::activate(Arc::clone(&source), AlertFilter::emergencies()).await;

        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].category, AlertCategory::Emergency);
        let sent = source.alert_filters();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].get("category"), Some("emergency"));
        assert_eq!(sent[0].get("status"), None);
    }

    #[tokio::test]
    async fn changing_filter_refetches_once() {
        let source = Arc::new(FakeSource::online(Vec::new(), sample_alerts()));
        let store = AlertStore::activate(Arc::clone(&source), AlertFilter::all()).await;
        assert_eq!(store.records().len(), 4);

        assert!(!store.set_filter(AlertFilter::all()).await);
        assert_eq!(source.alert_fetches.load(Ordering::SeqCst), 1);

        assert!(store.set_filter(AlertFilter::pending()).await);
        assert_eq!(source.alert_fetches.load(Ordering::SeqCst), 2);
        assert_eq!(store.filter(), AlertFilter::pending());
    }

    #[tokio::test]
    async fn tally_counts_open_and_resolved() {
        let store =
            AlertStore::activate(Arc::new(FakeSource::unreachable()), AlertFilter::all()).await;
        let tally = store.tally();
        assert_eq!(tally.open, 3);
        assert_eq!(tally.resolved, 3);
    }
}
