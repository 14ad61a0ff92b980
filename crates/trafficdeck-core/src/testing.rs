// In-memory `CollectionSource` for store and dashboard tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use trafficdeck_api::ChangeSignal;

use crate::error::CoreError;
use crate::model::{Alert, AlertCategory, CongestionLevel, Intersection, IntersectionStatus};
use crate::source::{ChangeFeed, CollectionSource, Filters};

pub(crate) fn offline() -> CoreError {
    CoreError::ConnectionFailed {
        url: "http://backend.invalid".into(),
        reason: "connection refused".into(),
    }
}

pub(crate) fn intersection(id: &str, status: IntersectionStatus, speed: f64) -> Intersection {
    Intersection {
        id: id.into(),
        name: format!("Junction {id}"),
        status,
        traffic_flow: 100,
        avg_speed: speed,
        congestion: CongestionLevel::Low,
        signal_phase: "N-S through".into(),
        countdown_secs: 10,
    }
}

type Scripted = (Duration, Result<Vec<Intersection>, CoreError>);

pub(crate) struct FakeSource {
    intersections: Mutex<Result<Vec<Intersection>, CoreError>>,
    script: Mutex<VecDeque<Scripted>>,
    alerts: Mutex<Option<Vec<Alert>>>,
    counts_fail: Mutex<bool>,
    realtime: bool,
    changes: broadcast::Sender<ChangeSignal>,
    feeds: Mutex<Vec<CancellationToken>>,
    alert_filters: Mutex<Vec<Filters>>,
    pub(crate) intersection_fetches: AtomicUsize,
    pub(crate) alert_fetches: AtomicUsize,
}

impl FakeSource {
    /// Backend that answers with the given data and supports realtime.
    pub(crate) fn online(intersections: Vec<Intersection>, alerts: Vec<Alert>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            intersections: Mutex::new(Ok(intersections)),
            script: Mutex::new(VecDeque::new()),
            alerts: Mutex::new(Some(alerts)),
            counts_fail: Mutex::new(false),
            realtime: true,
            changes,
            feeds: Mutex::new(Vec::new()),
            alert_filters: Mutex::new(Vec::new()),
            intersection_fetches: AtomicUsize::new(0),
            alert_fetches: AtomicUsize::new(0),
        }
    }

    /// Backend where every call fails.
    pub(crate) fn unreachable() -> Self {
        let source = Self::online(Vec::new(), Vec::new());
        source.set_intersections(Err(offline()));
        *source.alerts.lock().unwrap() = None;
        *source.counts_fail.lock().unwrap() = true;
        source
    }

    pub(crate) fn without_realtime(mut self) -> Self {
        self.realtime = false;
        self
    }

    pub(crate) fn set_intersections(&self, result: Result<Vec<Intersection>, CoreError>) {
        *self.intersections.lock().unwrap() = result;
    }

    /// Queue a one-shot response delivered after `delay`.
    pub(crate) fn script(&self, delay: Duration, result: Result<Vec<Intersection>, CoreError>) {
        self.script.lock().unwrap().push_back((delay, result));
    }

    pub(crate) fn fail_counts(&self) {
        *self.counts_fail.lock().unwrap() = true;
    }

    /// Broadcast a change signal to every open feed.
    pub(crate) fn push_change(&self) -> usize {
        self.changes.send(ChangeSignal).unwrap_or(0)
    }

    pub(crate) fn feeds_opened(&self) -> usize {
        self.feeds.lock().unwrap().len()
    }

    pub(crate) fn feeds_disposed(&self) -> usize {
        self.feeds
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.is_cancelled())
            .count()
    }

    pub(crate) fn alert_filters(&self) -> Vec<Filters> {
        self.alert_filters.lock().unwrap().clone()
    }

    fn open_feed(&self) -> Result<ChangeFeed, CoreError> {
        if !self.realtime {
            return Err(CoreError::Unsupported {
                operation: "subscribe".into(),
                required: "realtime".into(),
            });
        }
        let cancel = CancellationToken::new();
        self.feeds.lock().unwrap().push(cancel.clone());
        Ok(ChangeFeed::new(self.changes.subscribe(), cancel))
    }
}

fn alert_matches(alert: &Alert, filters: &Filters) -> bool {
    filters.iter().all(|(field, value)| match field {
        "status" => <&str>::from(alert.status) == value,
        "category" => <&str>::from(alert.category) == value,
        _ => false,
    })
}

impl CollectionSource<Intersection> for FakeSource {
    async fn fetch_all(&self, _filters: &Filters) -> Result<Vec<Intersection>, CoreError> {
        self.intersection_fetches.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        let (delay, result) =
            scripted.unwrap_or_else(|| (Duration::ZERO, self.intersections.lock().unwrap().clone()));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn count(&self, filters: &Filters) -> Result<u64, CoreError> {
        if *self.counts_fail.lock().unwrap() {
            return Err(offline());
        }
        let all = self.intersections.lock().unwrap().clone()?;
        let matching = all
            .iter()
            .filter(|i| filters.get("status").is_none_or(|s| <&str>::from(i.status) == s))
            .count();
        Ok(matching as u64)
    }

    fn subscribe(&self) -> Result<ChangeFeed, CoreError> {
        self.open_feed()
    }
}

impl CollectionSource<Alert> for FakeSource {
    async fn fetch_all(&self, filters: &Filters) -> Result<Vec<Alert>, CoreError> {
        self.alert_fetches.fetch_add(1, Ordering::SeqCst);
        self.alert_filters.lock().unwrap().push(filters.clone());
        let alerts = self.alerts.lock().unwrap().clone().ok_or_else(offline)?;
        Ok(alerts.into_iter().filter(|a| alert_matches(a, filters)).collect())
    }

    async fn count(&self, filters: &Filters) -> Result<u64, CoreError> {
        if *self.counts_fail.lock().unwrap() {
            return Err(offline());
        }
        let alerts = self.alerts.lock().unwrap().clone().ok_or_else(offline)?;
        Ok(alerts.iter().filter(|a| alert_matches(a, filters)).count() as u64)
    }

    fn subscribe(&self) -> Result<ChangeFeed, CoreError> {
        self.open_feed()
    }
}

/// One alert per category, all pending.
pub(crate) fn sample_alerts() -> Vec<Alert> {
    use strum::IntoEnumIterator;

    AlertCategory::iter()
        .enumerate()
        .map(|(n, category)| Alert {
            id: format!("live-{n}"),
            category,
            title: format!("{category} reported"),
            description: String::new(),
            location: "Ring Rd".into(),
            time_label: "just now".into(),
            status: crate::model::AlertStatus::Pending,
        })
        .collect()
}
