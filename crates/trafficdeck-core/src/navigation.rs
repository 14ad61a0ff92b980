// ── View navigation state machine ──
//
// `NavigationState` is an enum, so exactly one view is active by
// construction. Context that belongs to a view (the selected intersection,
// the alert filter) lives inside that view's variant and disappears the
// moment the view is left. Reading it from anywhere else yields "unset".

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tokio::sync::watch;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{AlertCategory, AlertFilter, AlertStatus};
use crate::stream::SnapshotStream;

/// The eight screens of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum ViewId {
    Login,
    Home,
    Monitor,
    Alerts,
    IntersectionDetail,
    Stats,
    DeviceManagement,
    SystemSettings,
}

/// Bottom tab bar entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum NavTab {
    Home,
    Monitor,
    Alerts,
}

/// Current view plus the context only that view may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view")]
pub enum NavigationState {
    Login,
    Home,
    Monitor,
    Alerts { filter: AlertFilter },
    IntersectionDetail { intersection_id: String },
    Stats,
    DeviceManagement,
    SystemSettings,
}

impl NavigationState {
    pub fn view(&self) -> ViewId {
        match self {
            Self::Login => ViewId::Login,
            Self::Home => ViewId::Home,
            Self::Monitor => ViewId::Monitor,
            Self::Alerts { .. } => ViewId::Alerts,
            Self::IntersectionDetail { .. } => ViewId::IntersectionDetail,
            Self::Stats => ViewId::Stats,
            Self::DeviceManagement => ViewId::DeviceManagement,
            Self::SystemSettings => ViewId::SystemSettings,
        }
    }

    /// Selected intersection; `None` outside the detail view.
    pub fn selected_intersection(&self) -> Option<&str> {
        match self {
            Self::IntersectionDetail { intersection_id } => Some(intersection_id),
            _ => None,
        }
    }

    /// Alert filter; all-unset outside the alerts view.
    pub fn alert_filter(&self) -> AlertFilter {
        match self {
            Self::Alerts { filter } => *filter,
            _ => AlertFilter::all(),
        }
    }

    /// Tab highlighted in the bottom bar. The detail view counts as Monitor.
    pub fn nav_tab(&self) -> Option<NavTab> {
        match self {
            Self::Home => Some(NavTab::Home),
            Self::Monitor | Self::IntersectionDetail { .. } => Some(NavTab::Monitor),
            Self::Alerts { .. } => Some(NavTab::Alerts),
            _ => None,
        }
    }

    pub fn shows_tab_bar(&self) -> bool {
        !matches!(self, Self::Login)
    }
}

// ── Controller ──────────────────────────────────────────────────────

/// Owns the navigation state and applies transitions.
///
/// An event that is not defined for the current view returns
/// [`CoreError::InvalidTransition`] and leaves the state untouched.
/// Subscribers are notified only when the state actually changes.
pub struct NavigationController {
    state: watch::Sender<NavigationState>,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationController {
    /// Starts at `Login`.
    pub fn new() -> Self {
        let (state, _) = watch::channel(NavigationState::Login);
        Self { state }
    }

    pub fn current(&self) -> NavigationState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> ViewId {
        self.state.borrow().view()
    }

    pub fn subscribe(&self) -> SnapshotStream<NavigationState> {
        SnapshotStream::new(self.state.subscribe())
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Login → Home.
    pub fn login(&self) -> Result<ViewId, CoreError> {
        self.transition("login", |state| match state {
            NavigationState::Login => Some(NavigationState::Home),
            _ => None,
        })
    }

    /// Tab bar selection: Home, Monitor or Alerts, from any view but Login.
    ///
    /// Re-selecting Alerts while on Alerts keeps the current filter; arriving
    /// from elsewhere shows it unset, since it was cleared on exit.
    pub fn select_view(&self, target: ViewId) -> Result<ViewId, CoreError> {
        self.transition("select_view", |state| {
            if matches!(state, NavigationState::Login) {
                return None;
            }
            match target {
                ViewId::Home => Some(NavigationState::Home),
                ViewId::Monitor => Some(NavigationState::Monitor),
                ViewId::Alerts => Some(NavigationState::Alerts {
                    filter: state.alert_filter(),
                }),
                _ => None,
            }
        })
    }

    /// Any view → Alerts with the given filter (unset means "all").
    pub fn navigate_to_alerts(
        &self,
        status: Option<AlertStatus>,
        category: Option<AlertCategory>,
    ) -> Result<ViewId, CoreError> {
        self.transition("navigate_to_alerts", |_| {
            Some(NavigationState::Alerts {
                filter: AlertFilter::new(status, category),
            })
        })
    }

    /// Alerts → Home, dropping the filter.
    pub fn back_from_alerts(&self) -> Result<ViewId, CoreError> {
        self.transition("back_from_alerts", |state| match state {
            NavigationState::Alerts { .. } => Some(NavigationState::Home),
            _ => None,
        })
    }

    /// Monitor → IntersectionDetail for `intersection_id`.
    pub fn open_detail(&self, intersection_id: &str) -> Result<ViewId, CoreError> {
        self.transition("open_detail", |state| match state {
            NavigationState::Monitor => Some(NavigationState::IntersectionDetail {
                intersection_id: intersection_id.to_owned(),
            }),
            _ => None,
        })
    }

    /// IntersectionDetail → Monitor.
    pub fn back_from_detail(&self) -> Result<ViewId, CoreError> {
        self.transition("back_from_detail", |state| match state {
            NavigationState::IntersectionDetail { .. } => Some(NavigationState::Monitor),
            _ => None,
        })
    }

    pub fn open_stats(&self) -> Result<ViewId, CoreError> {
        self.from_home("open_stats", NavigationState::Stats)
    }

    pub fn open_device_management(&self) -> Result<ViewId, CoreError> {
        self.from_home("open_device_management", NavigationState::DeviceManagement)
    }

    pub fn open_system_settings(&self) -> Result<ViewId, CoreError> {
        self.from_home("open_system_settings", NavigationState::SystemSettings)
    }

    /// Stats, DeviceManagement or SystemSettings → Home.
    pub fn back_to_home(&self) -> Result<ViewId, CoreError> {
        self.transition("back_to_home", |state| match state {
            NavigationState::Stats
            | NavigationState::DeviceManagement
            | NavigationState::SystemSettings => Some(NavigationState::Home),
            _ => None,
        })
    }

    /// SystemSettings → Login.
    pub fn logout(&self) -> Result<ViewId, CoreError> {
        self.transition("logout", |state| match state {
            NavigationState::SystemSettings => Some(NavigationState::Login),
            _ => None,
        })
    }

    fn from_home(&self, event: &'static str, next: NavigationState) -> Result<ViewId, CoreError> {
        self.transition(event, |state| match state {
            NavigationState::Home => Some(next),
            _ => None,
        })
    }

    /// Check-and-set under the channel lock: `next` sees the current state
    /// and returns the successor, or `None` if `event` is undefined there.
    fn transition<F>(&self, event: &'static str, next: F) -> Result<ViewId, CoreError>
    where
        F: FnOnce(&NavigationState) -> Option<NavigationState>,
    {
        let mut outcome = Err(CoreError::Internal(format!("transition '{event}' not applied")));
        self.state.send_if_modified(|state| {
            let from = state.view();
            let Some(successor) = next(state) else {
                debug!(%from, event, "navigation rejected");
                outcome = Err(CoreError::InvalidTransition { from, event });
                return false;
            };
            debug!(%from, to = %successor.view(), event, "navigation");
            outcome = Ok(successor.view());
            if *state == successor {
                return false;
            }
            *state = successor;
            true
        });
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn at_home() -> NavigationController {
        let nav = NavigationController::new();
        nav.login().unwrap();
        nav
    }

    #[test]
    fn starts_at_login_without_tab_bar() {
        let nav = NavigationController::new();
        assert_eq!(nav.view(), ViewId::Login);
        assert!(!nav.current().shows_tab_bar());
        assert_eq!(nav.current().nav_tab(), None);
    }

    #[test]
    fn login_then_tabs() {
        let nav = at_home();
        assert_eq!(nav.view(), ViewId::Home);
        assert_eq!(nav.select_view(ViewId::Monitor).unwrap(), ViewId::Monitor);
        assert_eq!(nav.select_view(ViewId::Alerts).unwrap(), ViewId::Alerts);
        assert_eq!(nav.select_view(ViewId::Home).unwrap(), ViewId::Home);
    }

    #[test]
    fn select_view_rejected_from_login_and_for_non_tab_views() {
        let nav = NavigationController::new();
        let err = nav.select_view(ViewId::Home).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition { from: ViewId::Login, event: "select_view" }
        ));

        nav.login().unwrap();
        assert!(nav.select_view(ViewId::Stats).is_err());
        assert!(nav.select_view(ViewId::IntersectionDetail).is_err());
        assert_eq!(nav.view(), ViewId::Home);
    }

    #[test]
    fn filter_cleared_after_leaving_alerts() {
        let nav = at_home();
        nav.navigate_to_alerts(Some(AlertStatus::Pending), Some(AlertCategory::Emergency))
            .unwrap();
        assert_eq!(
            nav.current().alert_filter(),
            AlertFilter::new(Some(AlertStatus::Pending), Some(AlertCategory::Emergency))
        );

        nav.back_from_alerts().unwrap();
        assert_eq!(nav.view(), ViewId::Home);
        assert!(nav.current().alert_filter().is_all());

        nav.select_view(ViewId::Alerts).unwrap();
        let filter = nav.current().alert_filter();
        assert_eq!(filter.status_label(), "all");
        assert_eq!(filter.category_label(), "all");
    }

    #[test]
    fn reselecting_alerts_keeps_filter() {
        let nav = at_home();
        nav.navigate_to_alerts(None, Some(AlertCategory::Emergency)).unwrap();
        nav.select_view(ViewId::Alerts).unwrap();
        assert_eq!(nav.current().alert_filter(), AlertFilter::emergencies());
    }

    #[test]
    fn navigate_to_alerts_works_from_any_view() {
        for view in [ViewId::Login, ViewId::Home, ViewId::Monitor] {
            let nav = NavigationController::new();
            if view != ViewId::Login {
                nav.login().unwrap();
                nav.select_view(view).unwrap();
            }
            nav.navigate_to_alerts(Some(AlertStatus::Pending), None).unwrap();
            assert_eq!(nav.current().alert_filter(), AlertFilter::pending());
        }
    }

    #[test]
    fn detail_round_trip_scopes_selection() {
        let nav = at_home();
        assert!(nav.open_detail("INT-001").is_err());

        nav.select_view(ViewId::Monitor).unwrap();
        nav.open_detail("INT-042").unwrap();
        let state = nav.current();
        assert_eq!(state.selected_intersection(), Some("INT-042"));
        assert_eq!(state.nav_tab(), Some(NavTab::Monitor));

        nav.back_from_detail().unwrap();
        assert_eq!(nav.view(), ViewId::Monitor);
        assert_eq!(nav.current().selected_intersection(), None);
    }

    #[test]
    fn home_subviews_and_logout() {
        let nav = at_home();
        nav.open_stats().unwrap();
        assert_eq!(nav.current().nav_tab(), None);
        assert!(nav.open_device_management().is_err());
        nav.back_to_home().unwrap();

        nav.open_device_management().unwrap();
        nav.back_to_home().unwrap();

        nav.open_system_settings().unwrap();
        nav.back_to_home().unwrap();
        nav.open_system_settings().unwrap();
        nav.logout().unwrap();
        assert_eq!(nav.view(), ViewId::Login);
        assert!(nav.logout().is_err());
    }

    #[test]
    fn rejected_transition_leaves_state_and_subscribers_untouched() {
        let nav = at_home();
        nav.navigate_to_alerts(None, Some(AlertCategory::Device)).unwrap();
        let before = nav.current();
        let stream = nav.subscribe();

        for result in [nav.login(), nav.back_from_detail(), nav.open_stats(), nav.logout()] {
            assert!(matches!(result, Err(CoreError::InvalidTransition { from: ViewId::Alerts, .. })));
        }
        assert_eq!(nav.current(), before);
        assert_eq!(stream.latest(), before);
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let nav = NavigationController::new();
        let mut stream = nav.subscribe();
        nav.login().unwrap();
        assert_eq!(stream.changed().await, Some(NavigationState::Home));
    }

    /// Drive a long deterministic pseudo-random walk and check the scoping
    /// rules after every event, accepted or not.
    #[test]
    fn random_walk_keeps_context_scoped() {
        let nav = NavigationController::new();
        let views: Vec<ViewId> = ViewId::iter().collect();
        let mut seed: u64 = 0x5eed;

        for _ in 0..2_000 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            let pick = usize::try_from(seed >> 33).unwrap();
            let before = nav.current();

            let result = match pick % 12 {
                0 => nav.login(),
                1 => nav.select_view(views[pick % views.len()]),
                2 => nav.navigate_to_alerts(Some(AlertStatus::Pending), Some(AlertCategory::Accident)),
                3 => nav.back_from_alerts(),
                4 => nav.open_detail("INT-007"),
                5 => nav.back_from_detail(),
                6 => nav.open_stats(),
                7 => nav.open_device_management(),
                8 => nav.open_system_settings(),
                9 => nav.back_to_home(),
                10 => nav.logout(),
                _ => nav.select_view(ViewId::Alerts),
            };

            let after = nav.current();
            match result {
                Ok(view) => assert_eq!(view, after.view()),
                Err(_) => assert_eq!(after, before),
            }
            if after.view() != ViewId::IntersectionDetail {
                assert_eq!(after.selected_intersection(), None);
            }
            if after.view() != ViewId::Alerts {
                assert!(after.alert_filter().is_all());
            }
            assert_eq!(after.shows_tab_bar(), after.view() != ViewId::Login);
        }
    }
}
