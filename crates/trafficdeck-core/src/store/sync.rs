// ── Generic snapshot holder ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use crate::error::CoreError;
use crate::model::EntityKind;
use crate::stream::SnapshotStream;

/// Complete state of one store after its latest refresh.
#[derive(Debug)]
pub struct SyncSnapshot<V> {
    pub records: Arc<V>,
    pub is_loading: bool,
    /// Message of the failure that put the store in degraded mode.
    pub last_error: Option<String>,
    /// When the last refresh completed. `None` before the first one.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl<V> Clone for SyncSnapshot<V> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            is_loading: self.is_loading,
            last_error: self.last_error.clone(),
            refreshed_at: self.refreshed_at,
        }
    }
}

impl<V> SyncSnapshot<V> {
    /// Serving fallback data because the last refresh failed.
    pub fn is_degraded(&self) -> bool {
        self.last_error.is_some()
    }
}

/// Publishes [`SyncSnapshot`]s for one entity kind.
///
/// Refreshes are not serialized: whichever completion lands last
/// overwrites records, loading flag and error together.
pub struct EntitySyncStore<V: Send + Sync + 'static> {
    kind: EntityKind,
    tx: watch::Sender<SyncSnapshot<V>>,
}

impl<V: Send + Sync + 'static> EntitySyncStore<V> {
    pub fn new(kind: EntityKind, initial: V) -> Self {
        let (tx, _) = watch::channel(SyncSnapshot {
            records: Arc::new(initial),
            is_loading: false,
            last_error: None,
            refreshed_at: None,
        });
        Self { kind, tx }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn snapshot(&self) -> SyncSnapshot<V> {
        self.tx.borrow().clone()
    }

    pub fn records(&self) -> Arc<V> {
        Arc::clone(&self.tx.borrow().records)
    }

    pub fn subscribe(&self) -> SnapshotStream<SyncSnapshot<V>> {
        SnapshotStream::new(self.tx.subscribe())
    }

    pub(crate) fn begin(&self) {
        self.tx.send_if_modified(|snap| {
            let was_loading = snap.is_loading;
            snap.is_loading = true;
            !was_loading
        });
    }

    pub(crate) fn succeed(&self, records: V) {
        self.publish(records, None);
    }

    /// Replace records with fallback data and remember why.
    pub(crate) fn degrade(&self, fallback: V, error: &CoreError) {
        warn!(kind = %self.kind, error = %error, "fetch failed, serving fallback data");
        self.publish(fallback, Some(error.to_string()));
    }

    fn publish(&self, records: V, last_error: Option<String>) {
        self.tx.send_replace(SyncSnapshot {
            records: Arc::new(records),
            is_loading: false,
            last_error,
            refreshed_at: Some(Utc::now()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrade_records_message_and_clears_loading() {
        let store = EntitySyncStore::new(EntityKind::Alert, vec![1_u8]);
        store.begin();
        assert!(store.snapshot().is_loading);

        store.degrade(vec![9], &CoreError::Internal("boom".into()));
        let snap = store.snapshot();
        assert!(!snap.is_loading);
        assert!(snap.is_degraded());
        assert_eq!(*snap.records, vec![9]);
        assert!(snap.refreshed_at.is_some());

        store.succeed(Vec::new());
        let snap = store.snapshot();
        assert!(snap.last_error.is_none());
        assert!(snap.records.is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_each_publication() {
        let store = EntitySyncStore::new(EntityKind::Intersection, 0_u32);
        let mut stream = store.subscribe();
        store.begin();
        assert!(stream.changed().await.is_some_and(|s| s.is_loading));
        store.succeed(5);
        let snap = stream.changed().await;
        assert!(snap.is_some_and(|s| *s.records == 5 && !s.is_loading));
    }
}
