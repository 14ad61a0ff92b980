//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use trafficdeck_core::{AlertStatus, CongestionLevel, IntersectionStatus, OnlineStatus};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Traffic-light coloring for table cells.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: &ColorMode) -> Self {
        Self {
            enabled: should_color(mode),
        }
    }

    fn paint(self, text: &str, level: Level) -> String {
        if !self.enabled {
            return text.to_owned();
        }
        match level {
            Level::Good => text.green().to_string(),
            Level::Warn => text.yellow().to_string(),
            Level::Bad => text.red().to_string(),
        }
    }

    pub fn intersection_status(self, status: IntersectionStatus) -> String {
        let level = match status {
            IntersectionStatus::Online => Level::Good,
            IntersectionStatus::Warning => Level::Warn,
            IntersectionStatus::Offline => Level::Bad,
        };
        self.paint(status.into(), level)
    }

    pub fn congestion(self, congestion: CongestionLevel) -> String {
        let level = match congestion {
            CongestionLevel::Low => Level::Good,
            CongestionLevel::Moderate => Level::Warn,
            CongestionLevel::Heavy | CongestionLevel::Severe => Level::Bad,
        };
        self.paint(congestion.into(), level)
    }

    pub fn alert_status(self, status: AlertStatus) -> String {
        let level = match status {
            AlertStatus::Pending => Level::Bad,
            AlertStatus::Processing => Level::Warn,
            AlertStatus::Resolved => Level::Good,
        };
        self.paint(status.into(), level)
    }

    pub fn online_status(self, status: OnlineStatus) -> String {
        let level = match status {
            OnlineStatus::Normal => Level::Good,
            OnlineStatus::Warning => Level::Warn,
        };
        self.paint(status.into(), level)
    }
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Good,
    Warn,
    Bad,
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the records via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item detail views don't
/// use the `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Key/value detail block used by `render_single` table output.
pub fn detail_block(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    pairs
        .iter()
        .map(|(k, v)| format!("{k:<width$}  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Tell the operator on stderr that fallback data is being shown.
pub fn warn_degraded(what: &str, error: Option<&str>, quiet: bool) {
    if quiet {
        return;
    }
    if let Some(error) = error {
        eprintln!("warning: {what} unavailable ({error}); showing fallback data");
    }
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
