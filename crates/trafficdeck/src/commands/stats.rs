//! Traffic statistics handler.

use std::sync::Arc;

use tracing::info;
use trafficdeck_core::{
    AlertFilter, AlertStore, BackendSource, IntersectionStore, StatsAggregator, StatsStore,
    TrafficStats,
};

use crate::cli::{GlobalOpts, StatsArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

fn detail(s: &TrafficStats, painter: Painter) -> String {
    output::detail_block(&[
        ("Online rate", format!("{}%", s.online_rate)),
        ("Network", painter.online_status(s.online_status)),
        (
            "Congestion",
            format!("{} ({})", s.congestion_index, s.congestion_label),
        ),
        ("Pending alerts", s.pending_alerts.to_string()),
        ("Emergencies", s.emergency_requests.to_string()),
        ("Intersections", s.total_intersections.to_string()),
    ])
}

/// Derive stats from the list endpoints. `None` if either list is
/// degraded, since counting fallback rows would be meaningless.
async fn from_lists(source: &Arc<BackendSource>) -> Option<TrafficStats> {
    let intersections = IntersectionStore::activate(Arc::clone(source)).await;
    let alerts = AlertStore::activate(Arc::clone(source), AlertFilter::all()).await;
    intersections.dispose();

    let i = intersections.snapshot();
    let a = alerts.snapshot();
    if i.is_degraded() || a.is_degraded() {
        return None;
    }
    Some(StatsAggregator::from_snapshots(&i.records, &a.records))
}

pub async fn handle(
    source: Arc<BackendSource>,
    args: StatsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let stats = if args.local {
        match from_lists(&source).await {
            Some(stats) => stats,
            None => {
                output::warn_degraded("lists", Some("backend unreachable"), global.quiet);
                trafficdeck_core::fallback::fallback_stats()
            }
        }
    } else {
        let store = StatsStore::activate(Arc::clone(&source)).await;
        let snapshot = store.snapshot();
        match snapshot.last_error {
            None => (*snapshot.records).clone(),
            Some(ref error) => {
                info!(error = %error, "counts failed, deriving stats from lists");
                if let Some(stats) = from_lists(&source).await {
                    stats
                } else {
                    output::warn_degraded("stats", Some(error), global.quiet);
                    (*snapshot.records).clone()
                }
            }
        }
    };

    let painter = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &stats,
        |s| detail(s, painter),
        |s| s.online_rate.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
