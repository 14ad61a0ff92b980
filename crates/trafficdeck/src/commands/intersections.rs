//! Intersection command handlers.

use std::sync::Arc;

use tabled::Tabled;
use trafficdeck_core::{BackendSource, Intersection, IntersectionStore, MonitorSummary};

use crate::cli::{GlobalOpts, IntersectionsArgs, IntersectionsCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct IntersectionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Flow (veh/h)")]
    flow: u32,
    #[tabled(rename = "Speed (km/h)")]
    speed: String,
    #[tabled(rename = "Congestion")]
    congestion: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Next (s)")]
    countdown: u32,
}

impl IntersectionRow {
    pub(crate) fn new(i: &Intersection, painter: Painter) -> Self {
        Self {
            id: i.id.clone(),
            name: i.name.clone(),
            status: painter.intersection_status(i.status),
            flow: i.traffic_flow,
            speed: format!("{:.0}", i.avg_speed),
            congestion: painter.congestion(i.congestion),
            phase: i.signal_phase.clone(),
            countdown: i.countdown_secs,
        }
    }
}

fn detail(i: &Intersection, painter: Painter) -> String {
    output::detail_block(&[
        ("ID", i.id.clone()),
        ("Name", i.name.clone()),
        ("Status", painter.intersection_status(i.status)),
        ("Flow", format!("{} veh/h", i.traffic_flow)),
        ("Avg speed", format!("{:.0} km/h", i.avg_speed)),
        ("Congestion", painter.congestion(i.congestion)),
        ("Signal phase", i.signal_phase.clone()),
        ("Countdown", format!("{}s", i.countdown_secs)),
    ])
}

fn summary_detail(s: &MonitorSummary) -> String {
    let abnormal = if s.abnormal.is_empty() {
        "none".to_owned()
    } else {
        s.abnormal
            .iter()
            .map(|i| i.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    output::detail_block(&[
        ("Intersections", s.total.to_string()),
        ("Online", s.online.to_string()),
        ("Avg speed", format!("{} km/h", s.average_speed)),
        ("Abnormal", abnormal),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    source: Arc<BackendSource>,
    args: IntersectionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = IntersectionStore::activate(source).await;
    let snapshot = store.snapshot();
    output::warn_degraded("intersections", snapshot.last_error.as_deref(), global.quiet);
    let painter = Painter::new(&global.color);

    let out = match args.command {
        IntersectionsCommand::List => output::render_list(
            &global.output,
            snapshot.records.as_slice(),
            |i| IntersectionRow::new(i, painter),
            |i| i.id.clone(),
        )?,

        IntersectionsCommand::Show { id } => {
            let record = store.find_or_placeholder(Some(&id));
            if record.id != id && !global.quiet {
                eprintln!("warning: intersection '{id}' not found; showing placeholder");
            }
            output::render_single(
                &global.output,
                &record,
                |i| detail(i, painter),
                |i| i.id.clone(),
            )?
        }

        IntersectionsCommand::Summary => {
            let summary = MonitorSummary::from_snapshot(&snapshot.records);
            output::render_single(&global.output, &summary, summary_detail, |s| {
                s.abnormal
                    .iter()
                    .map(|i| i.id.clone())
                    .collect::<Vec<_>>()
                    .join("\n")
            })?
        }
    };

    store.dispose();
    output::print_output(&out, global.quiet);
    Ok(())
}
