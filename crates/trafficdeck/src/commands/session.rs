//! Line-driven dashboard session.
//!
//! Reads one navigation command per line from stdin, applies it to the
//! dashboard's navigation controller, mounts the resulting view and prints
//! what that view would display. Rejected transitions are reported on
//! stderr and the session continues.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use trafficdeck_core::{
    Alert, AlertFilter, AlertTally, BackendSource, CoreError, Dashboard, Intersection,
    MonitorSummary, NavTab, NavigationController, NavigationState, TrafficStats, ViewId,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

const HELP: &str = "\
commands:
  login | logout
  home | monitor | alerts            switch tab
  alerts <status> <category>         open alerts with a filter
  detail <intersection-id>           open an intersection (from monitor)
  stats | devices | settings         open a home sub-view
  back                               leave the current view
  refresh                            re-fetch what the current view shows
  quit";

// ── Parsed input ────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Login,
    Logout,
    Tab(ViewId),
    AlertsWith(AlertFilter),
    Detail(String),
    Stats,
    Devices,
    Settings,
    Back,
    Refresh,
    Help,
    Quit,
}

fn parse(line: &str) -> Result<Input, CliError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let input = match words.as_slice() {
        ["login"] => Input::Login,
        ["logout"] => Input::Logout,
        ["home"] => Input::Tab(ViewId::Home),
        ["monitor"] => Input::Tab(ViewId::Monitor),
        ["alerts"] => Input::Tab(ViewId::Alerts),
        ["alerts", status, category] => Input::AlertsWith(
            AlertFilter::from_selection(status, category).map_err(|e| CliError::Validation {
                field: "alert filter".into(),
                reason: e.to_string(),
            })?,
        ),
        ["detail", id] => Input::Detail((*id).to_owned()),
        ["stats"] => Input::Stats,
        ["devices"] => Input::Devices,
        ["settings"] => Input::Settings,
        ["back"] => Input::Back,
        ["refresh"] => Input::Refresh,
        ["help"] => Input::Help,
        ["quit" | "exit"] => Input::Quit,
        _ => {
            return Err(CliError::Validation {
                field: "command".into(),
                reason: format!("unrecognised input '{line}'"),
            });
        }
    };
    Ok(input)
}

/// Apply one input. `back` picks the transition that fits the current view.
fn apply(nav: &NavigationController, input: Input) -> Result<ViewId, CoreError> {
    match input {
        Input::Login => nav.login(),
        Input::Logout => nav.logout(),
        Input::Tab(view) => nav.select_view(view),
        Input::AlertsWith(filter) => nav.navigate_to_alerts(filter.status, filter.category),
        Input::Detail(id) => nav.open_detail(&id),
        Input::Stats => nav.open_stats(),
        Input::Devices => nav.open_device_management(),
        Input::Settings => nav.open_system_settings(),
        Input::Back => match nav.view() {
            ViewId::Alerts => nav.back_from_alerts(),
            ViewId::IntersectionDetail => nav.back_from_detail(),
            _ => nav.back_to_home(),
        },
        Input::Refresh | Input::Help | Input::Quit => Ok(nav.view()),
    }
}

// ── View report ─────────────────────────────────────────────────────

/// What the mounted view displays.
#[derive(Debug, Default, Serialize)]
struct ViewReport {
    view: Option<ViewId>,
    tab: Option<NavTab>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert_filter: Option<AlertFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<TrafficStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alerts: Option<Vec<Alert>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert_tally: Option<AlertTally>,
    #[serde(skip_serializing_if = "Option::is_none")]
    monitor: Option<MonitorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    intersection: Option<Intersection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    degraded: Vec<String>,
}

async fn report(dashboard: &Dashboard<BackendSource>, state: &NavigationState) -> ViewReport {
    let mut report = ViewReport {
        view: Some(state.view()),
        tab: state.nav_tab(),
        ..ViewReport::default()
    };

    if let Some(store) = dashboard.stats().await {
        let snap = store.snapshot();
        if let Some(e) = snap.last_error {
            report.degraded.push(format!("stats: {e}"));
        }
        report.stats = Some((*snap.records).clone());
    }
    if let Some(store) = dashboard.alerts().await {
        let snap = store.snapshot();
        if let Some(e) = snap.last_error {
            report.degraded.push(format!("alerts: {e}"));
        }
        report.alert_tally = Some(AlertTally::from_snapshot(&snap.records));
        report.alerts = Some((*snap.records).clone());
        if matches!(state, NavigationState::Alerts { .. }) {
            report.alert_filter = Some(state.alert_filter());
        }
    }
    if let Some(store) = dashboard.intersections().await {
        let snap = store.snapshot();
        if let Some(e) = snap.last_error {
            report.degraded.push(format!("intersections: {e}"));
        }
        report.monitor = Some(MonitorSummary::from_snapshot(&snap.records));
        report.intersection = dashboard.intersection_detail().await;
    }
    report
}

fn human(r: &ViewReport) -> String {
    let mut lines = Vec::new();
    if let Some(view) = r.view {
        lines.push(format!("== {view} =="));
    }
    if let Some(filter) = r.alert_filter {
        lines.push(format!(
            "filter: status={} category={}",
            filter.status_label(),
            filter.category_label()
        ));
    }
    if let Some(s) = &r.stats {
        lines.push(format!(
            "online {}% ({}), pending alerts {}, emergencies {}, intersections {}",
            s.online_rate,
            s.online_status,
            s.pending_alerts,
            s.emergency_requests,
            s.total_intersections
        ));
    }
    if let (Some(alerts), Some(tally)) = (&r.alerts, r.alert_tally) {
        lines.push(format!(
            "alerts: {} (open {}, resolved {})",
            alerts.len(),
            tally.open,
            tally.resolved
        ));
        lines.extend(
            alerts
                .iter()
                .map(|a| format!("  [{}] {} {} ({})", a.id, a.category, a.title, a.status)),
        );
    }
    if let Some(m) = &r.monitor {
        lines.push(format!(
            "intersections: {} online of {}, avg speed {} km/h, {} abnormal",
            m.online,
            m.total,
            m.average_speed,
            m.abnormal.len()
        ));
    }
    if let Some(i) = &r.intersection {
        lines.push(format!(
            "{} {}: {} flow {} veh/h, {} phase '{}' {}s",
            i.id, i.name, i.status, i.traffic_flow, i.congestion, i.signal_phase, i.countdown_secs
        ));
    }
    lines.extend(r.degraded.iter().map(|d| format!("(fallback) {d}")));
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(source: Arc<BackendSource>, global: &GlobalOpts) -> Result<(), CliError> {
    let dashboard = Dashboard::new(source);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let input = match parse(line) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        match input {
            Input::Quit => break,
            Input::Help => {
                output::print_output(HELP, global.quiet);
                continue;
            }
            _ => {}
        }

        let is_refresh = input == Input::Refresh;
        if let Err(e) = apply(dashboard.navigation(), input) {
            debug!(error = %e, "transition rejected");
            eprintln!("{}", CliError::from(e));
            continue;
        }

        let state = if is_refresh {
            dashboard.refresh().await;
            dashboard.navigation().current()
        } else {
            dashboard.mount().await
        };
        let report = report(&dashboard, &state).await;
        let out = output::render_single(&global.output, &report, human, |r| {
            r.view.map(|v| v.to_string()).unwrap_or_default()
        })?;
        output::print_output(&out, global.quiet);
    }

    dashboard.teardown().await;
    Ok(())
}
