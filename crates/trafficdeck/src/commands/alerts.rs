//! Alert command handlers.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use trafficdeck_core::{Alert, AlertFilter, AlertStore, AlertTally, BackendSource};

use crate::cli::{AlertFilterArgs, AlertsArgs, AlertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Location")]
    location: String,
}

impl AlertRow {
    fn new(a: &Alert, painter: Painter) -> Self {
        Self {
            id: a.id.clone(),
            time: a.time_label.clone(),
            category: a.category.to_string(),
            status: painter.alert_status(a.status),
            title: a.title.clone(),
            location: a.location.clone(),
        }
    }
}

#[derive(Serialize)]
struct AlertSummary {
    status: &'static str,
    category: &'static str,
    #[serde(flatten)]
    tally: AlertTally,
}

fn parse_filter(args: &AlertFilterArgs) -> Result<AlertFilter, CliError> {
    AlertFilter::from_selection(&args.status, &args.category).map_err(|e| CliError::Validation {
        field: "alert filter".into(),
        reason: e.to_string(),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    source: Arc<BackendSource>,
    args: AlertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let filter_args = match &args.command {
        AlertsCommand::List(f) | AlertsCommand::Summary(f) => f,
    };
    let filter = parse_filter(filter_args)?;

    let store = AlertStore::activate(source, filter).await;
    let snapshot = store.snapshot();
    output::warn_degraded("alerts", snapshot.last_error.as_deref(), global.quiet);
    let painter = Painter::new(&global.color);

    let out = match args.command {
        AlertsCommand::List(_) => output::render_list(
            &global.output,
            snapshot.records.as_slice(),
            |a| AlertRow::new(a, painter),
            |a| a.id.clone(),
        )?,

        AlertsCommand::Summary(_) => {
            let summary = AlertSummary {
                status: filter.status_label(),
                category: filter.category_label(),
                tally: AlertTally::from_snapshot(&snapshot.records),
            };
            output::render_single(
                &global.output,
                &summary,
                |s| {
                    output::detail_block(&[
                        ("Status filter", s.status.to_owned()),
                        ("Category filter", s.category.to_owned()),
                        ("Open", s.tally.open.to_string()),
                        ("Resolved", s.tally.resolved.to_string()),
                    ])
                },
                |s| format!("{}\n{}", s.tally.open, s.tally.resolved),
            )?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}
