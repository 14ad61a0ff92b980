// ── Dashboard facade ──
//
// Ties navigation to data: each view mount activates exactly the stores
// that view reads, and stores no longer needed are disposed and dropped.
// Presentation code talks to this type only.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::model::{AlertFilter, Intersection};
use crate::navigation::{NavigationController, NavigationState};
use crate::source::DashboardSource;
use crate::store::{AlertStore, IntersectionStore, StatsStore};

/// Which stores a view reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Needs {
    intersections: bool,
    alerts: Option<AlertFilter>,
    stats: bool,
}

impl Needs {
    fn of(state: &NavigationState) -> Self {
        match state {
            NavigationState::Home => Self {
                alerts: Some(AlertFilter::all()),
                stats: true,
                ..Self::default()
            },
            NavigationState::Monitor | NavigationState::IntersectionDetail { .. } => Self {
                intersections: true,
                ..Self::default()
            },
            NavigationState::Alerts { filter } => Self {
                alerts: Some(*filter),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

pub struct Dashboard<S> {
    source: Arc<S>,
    navigation: NavigationController,
    intersections: Mutex<Option<Arc<IntersectionStore<S>>>>,
    alerts: Mutex<Option<Arc<AlertStore<S>>>>,
    stats: Mutex<Option<Arc<StatsStore<S>>>>,
}

impl<S: DashboardSource> Dashboard<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            navigation: NavigationController::new(),
            intersections: Mutex::new(None),
            alerts: Mutex::new(None),
            stats: Mutex::new(None),
        }
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    /// Bring the stores in line with the current view.
    ///
    /// Returns the state that was mounted.
    pub async fn mount(&self) -> NavigationState {
        let state = self.navigation.current();
        let needs = Needs::of(&state);
        debug!(view = %state.view(), ?needs, "mounting view");

        {
            let mut slot = self.intersections.lock().await;
            match (needs.intersections, slot.as_ref()) {
                (true, None) => {
                    *slot = Some(IntersectionStore::activate(Arc::clone(&self.source)).await);
                }
                (false, Some(store)) => {
                    store.dispose();
                    *slot = None;
                }
                _ => {}
            }
        }

        {
            let mut slot = self.alerts.lock().await;
            match (needs.alerts, slot.as_ref()) {
                (Some(filter), None) => {
                    *slot = Some(AlertStore::activate(Arc::clone(&self.source), filter).await);
                }
                (Some(filter), Some(store)) => {
                    // A view that reads alerts pulls fresh data on every mount.
                    if !store.set_filter(filter).await {
                        store.refresh().await;
                    }
                }
                (None, Some(_)) => *slot = None,
                (None, None) => {}
            }
        }

        {
            let mut slot = self.stats.lock().await;
            match (needs.stats, slot.is_some()) {
                (true, false) => {
                    *slot = Some(StatsStore::activate(Arc::clone(&self.source)).await);
                }
                (false, true) => *slot = None,
                _ => {}
            }
        }

        state
    }

    /// Re-fetch every store the current view has mounted.
    pub async fn refresh(&self) {
        if let Some(store) = self.intersections().await {
            store.refresh().await;
        }
        if let Some(store) = self.alerts().await {
            store.refresh().await;
        }
        if let Some(store) = self.stats().await {
            store.refresh().await;
        }
    }

    /// Dispose and drop every store.
    pub async fn teardown(&self) {
        if let Some(store) = self.intersections.lock().await.take() {
            store.dispose();
        }
        self.alerts.lock().await.take();
        self.stats.lock().await.take();
        info!("dashboard torn down");
    }

    pub async fn intersections(&self) -> Option<Arc<IntersectionStore<S>>> {
        self.intersections.lock().await.clone()
    }

    pub async fn alerts(&self) -> Option<Arc<AlertStore<S>>> {
        self.alerts.lock().await.clone()
    }

    pub async fn stats(&self) -> Option<Arc<StatsStore<S>>> {
        self.stats.lock().await.clone()
    }

    /// Record for the detail view: the selected intersection, or the
    /// placeholder if it is not in the snapshot. `None` outside the view.
    pub async fn intersection_detail(&self) -> Option<Intersection> {
        let state = self.navigation.current();
        let id = state.selected_intersection()?;
        let store = self.intersections().await?;
        Some(store.find_or_placeholder(Some(id)))
    }

    /// Remount on every navigation change until `cancel` fires, then tear
    /// everything down.
    pub fn spawn_view_bridge(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let dashboard = Arc::clone(self);
        let mut changes = self.navigation.subscribe();

        tokio::spawn(async move {
            dashboard.mount().await;
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    changed = changes.changed() => {
                        if changed.is_none() {
                            break;
                        }
                        dashboard.mount().await;
                    }
                }
            }
            dashboard.teardown().await;
        })
    }
}
