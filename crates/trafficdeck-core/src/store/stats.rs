// ── Stats store ──
//
// Composes TrafficStats from four independent backend counts. If any count
// fails the whole snapshot falls back to the design-time stats.

use std::sync::Arc;

use super::sync::{EntitySyncStore, SyncSnapshot};
use crate::aggregate::{StatsAggregator, StatsCounts};
use crate::error::CoreError;
use crate::fallback::fallback_stats;
use crate::model::{
    Alert, AlertCategory, AlertFilter, AlertStatus, EntityKind, Intersection, TrafficStats,
};
use crate::source::{CollectionSource, DashboardSource, Filters};
use crate::stream::SnapshotStream;

pub struct StatsStore<S> {
    source: Arc<S>,
    state: EntitySyncStore<TrafficStats>,
}

impl<S: DashboardSource> StatsStore<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            state: EntitySyncStore::new(EntityKind::TrafficStats, fallback_stats()),
        }
    }

    pub async fn activate(source: Arc<S>) -> Arc<Self> {
        let store = Arc::new(Self::new(source));
        store.refresh().await;
        store
    }

    /// Recount and re-aggregate. Never fails.
    pub async fn refresh(&self) {
        self.state.begin();
        match self.fetch_counts().await {
            Ok(counts) => self.state.succeed(StatsAggregator::aggregate(counts)),
            Err(e) => self.state.degrade(fallback_stats(), &e),
        }
    }

    async fn fetch_counts(&self) -> Result<StatsCounts, CoreError> {
        let source = self.source.as_ref();
        let everything = Filters::none();
        let online = Filters::none().with("status", Some("online"));
        let pending = Filters::from(AlertFilter::pending());
        let pending_emergencies = Filters::from(AlertFilter::new(
            Some(AlertStatus::Pending),
            Some(AlertCategory::Emergency),
        ));

        let (total, online, pending, emergencies) = tokio::try_join!(
            CollectionSource::<Intersection>::count(source, &everything),
            CollectionSource::<Intersection>::count(source, &online),
            CollectionSource::<Alert>::count(source, &pending),
            CollectionSource::<Alert>::count(source, &pending_emergencies),
        )?;

        Ok(StatsCounts {
            total_intersections: total,
            online_intersections: online,
            pending_alerts: pending,
            pending_emergencies: emergencies,
        })
    }
}

impl<S> StatsStore<S> {
    pub fn snapshot(&self) -> SyncSnapshot<TrafficStats> {
        self.state.snapshot()
    }

    pub fn stats(&self) -> Arc<TrafficStats> {
        self.state.records()
    }

    pub fn subscribe(&self) -> SnapshotStream<SyncSnapshot<TrafficStats>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::aggregate::PLACEHOLDER_CONGESTION_INDEX;
    use crate::fallback::demo_alerts;
    use crate::model::{IntersectionStatus, OnlineStatus};
    use crate::testing::{FakeSource, intersection};

    #[tokio::test]
    async fn counts_are_aggregated() {
        let intersections = vec![
            intersection("A", IntersectionStatus::Online, 30.0),
            intersection("B", IntersectionStatus::Online, 30.0),
            intersection("C", IntersectionStatus::Offline, 0.0),
            intersection("D", IntersectionStatus::Warning, 12.0),
        ];
        let mut alerts = demo_alerts();
        alerts[1].status = AlertStatus::Pending;
        let source = Arc::new(FakeSource::online(intersections, alerts));

        let store = StatsStore::activate(source).await;
        let stats = store.stats();

        assert_eq!(stats.total_intersections, 4);
        assert!((stats.online_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(stats.online_status, OnlineStatus::Warning);
        assert_eq!(stats.pending_alerts, 3);
        assert_eq!(stats.emergency_requests, 1);
        assert_eq!(stats.congestion_index, PLACEHOLDER_CONGESTION_INDEX);
        assert!(store.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn any_failed_count_serves_fallback_stats() {
        let source = Arc::new(FakeSource::online(Vec::new(), demo_alerts()));
        source.fail_counts();
        let store = StatsStore::activate(source).await;

        assert_eq!(*store.stats(), fallback_stats());
        assert!(store.snapshot().is_degraded());
        assert!(!store.snapshot().is_loading);
    }

    #[tokio::test]
    async fn empty_backend_reports_zero_rate() {
        let source = Arc::new(FakeSource::online(Vec::new(), Vec::new()));
        let store = StatsStore::activate(source).await;

        let stats = store.stats();
        assert_eq!(stats.total_intersections, 0);
        assert!(stats.online_rate.abs() < f64::EPSILON);
        assert_eq!(stats.online_status, OnlineStatus::Warning);
    }
}
