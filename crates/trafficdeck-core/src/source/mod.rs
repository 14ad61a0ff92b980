// ── Remote collection contract ──
//
// `CollectionSource` is the seam between the stores and the backend. The
// production implementation is `BackendSource`; tests swap in an in-memory
// fake. Every method either returns a complete result or a `CoreError`;
// nothing is partially populated.

mod backend;

use std::collections::BTreeMap;
use std::future::Future;

use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use trafficdeck_api::models::{ALERTS_TABLE, INTERSECTIONS_TABLE};
use trafficdeck_api::{AlertRecord, ChangeSignal, IntersectionRecord};

use crate::error::CoreError;
use crate::model::alert::ALL;
use crate::model::{Alert, AlertFilter, EntityKind, Intersection};

pub use backend::BackendSource;

// ── Filters ─────────────────────────────────────────────────────────

/// Exact-match predicates keyed by domain field name.
///
/// Absent fields and the value `"all"` impose no constraint, so they are
/// never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(BTreeMap<String, String>);

impl Filters {
    /// No constraints.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add `field = value`, skipping `None` and `"all"`.
    pub fn with(mut self, field: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty() && *v != ALL) {
            self.0.insert(field.to_owned(), value.to_owned());
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<AlertFilter> for Filters {
    fn from(filter: AlertFilter) -> Self {
        Filters::none()
            .with("status", filter.status.map(Into::into))
            .with("category", filter.category.map(Into::into))
    }
}

// ── Entity ──────────────────────────────────────────────────────────

/// A domain type that can be fetched as a collection.
pub trait Entity: Sized + Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    /// Backend table name.
    const TABLE: &'static str;
    /// Timestamp column to order by, newest first.
    const ORDER_BY: Option<&'static str> = None;

    type Record: DeserializeOwned + Send;

    fn from_record(record: Self::Record) -> Result<Self, CoreError>;

    /// Backend column for a domain field name.
    fn column(field: &str) -> &str {
        field
    }
}

impl Entity for Intersection {
    const KIND: EntityKind = EntityKind::Intersection;
    const TABLE: &'static str = INTERSECTIONS_TABLE;

    type Record = IntersectionRecord;

    fn from_record(record: IntersectionRecord) -> Result<Self, CoreError> {
        Self::try_from(record)
    }
}

impl Entity for Alert {
    const KIND: EntityKind = EntityKind::Alert;
    const TABLE: &'static str = ALERTS_TABLE;
    const ORDER_BY: Option<&'static str> = Some("created_at");

    type Record = AlertRecord;

    fn from_record(record: AlertRecord) -> Result<Self, CoreError> {
        Self::try_from(record)
    }

    fn column(field: &str) -> &str {
        match field {
            "category" => "type",
            other => other,
        }
    }
}

// ── CollectionSource ────────────────────────────────────────────────

/// Fetch, count and watch one entity kind on the backend.
pub trait CollectionSource<T: Entity>: Send + Sync + 'static {
    /// Every record matching `filters`, in backend order.
    fn fetch_all(&self, filters: &Filters) -> impl Future<Output = Result<Vec<T>, CoreError>> + Send;

    /// Number of matching records, without transferring them.
    fn count(&self, filters: &Filters) -> impl Future<Output = Result<u64, CoreError>> + Send;

    /// Open a change feed for the kind's table.
    fn subscribe(&self) -> Result<ChangeFeed, CoreError>;
}

/// A source serving every kind the dashboard needs.
pub trait DashboardSource: CollectionSource<Intersection> + CollectionSource<Alert> {}

impl<S> DashboardSource for S where S: CollectionSource<Intersection> + CollectionSource<Alert> {}

// ── ChangeFeed ──────────────────────────────────────────────────────

/// Payload-free "something changed" notifications for one table.
///
/// Disposing cancels the underlying connection; it is safe to dispose more
/// than once, and dropping the feed disposes it.
#[derive(Debug)]
pub struct ChangeFeed {
    signals: broadcast::Receiver<ChangeSignal>,
    cancel: CancellationToken,
}

impl ChangeFeed {
    /// `cancel` is triggered on dispose; pass the token that owns the
    /// producer so it shuts down too.
    pub fn new(signals: broadcast::Receiver<ChangeSignal>, cancel: CancellationToken) -> Self {
        Self { signals, cancel }
    }

    /// Wait for the next change. `None` once disposed or the producer is gone.
    pub async fn next(&mut self) -> Option<ChangeSignal> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            received = self.signals.recv() => match received {
                Ok(signal) => Some(signal),
                // Missed signals collapse into one re-fetch.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "change feed lagged");
                    Some(ChangeSignal)
                }
                Err(broadcast::error::RecvError::Closed) => None,
            },
        }
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AlertCategory, AlertStatus};

    #[test]
    fn all_and_none_add_no_predicate() {
        let f = Filters::none().with("status", None).with("category", Some("all"));
        assert!(f.is_empty());
    }

    #[test]
    fn alert_filter_uses_domain_field_names() {
        let f = Filters::from(AlertFilter::new(
            Some(AlertStatus::Pending),
            Some(AlertCategory::Emergency),
        ));
        assert_eq!(f.get("status"), Some("pending"));
        assert_eq!(f.get("category"), Some("emergency"));
        assert_eq!(Alert::column("category"), "type");
        assert_eq!(Intersection::column("status"), "status");
    }

    #[tokio::test]
    async fn feed_yields_signals_until_disposed() {
        let (tx, rx) = broadcast::channel(4);
        let mut feed = ChangeFeed::new(rx, CancellationToken::new());

        tx.send(ChangeSignal).unwrap();
        assert_eq!(feed.next().await, Some(ChangeSignal));

        feed.dispose();
        feed.dispose();
        assert!(feed.is_disposed());
        tx.send(ChangeSignal).unwrap();
        assert_eq!(feed.next().await, None);
    }

    #[tokio::test]
    async fn lagged_feed_reports_a_single_change() {
        let (tx, rx) = broadcast::channel(1);
        let mut feed = ChangeFeed::new(rx, CancellationToken::new());
        tx.send(ChangeSignal).unwrap();
        tx.send(ChangeSignal).unwrap();
        assert_eq!(feed.next().await, Some(ChangeSignal));
    }

    #[tokio::test]
    async fn closed_producer_ends_feed() {
        let (tx, rx) = broadcast::channel::<ChangeSignal>(1);
        let mut feed = ChangeFeed::new(rx, CancellationToken::new());
        drop(tx);
        assert_eq!(feed.next().await, None);
    }
}
