//! Clap derive structures for the `trafficdeck` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// trafficdeck: traffic-operations dashboard in the terminal
#[derive(Debug, Parser)]
#[command(
    name = "trafficdeck",
    version,
    about = "Inspect intersections, alerts and traffic statistics from the command line",
    long_about = "Reads intersection status, alerts and aggregate statistics from the\n\
        traffic-operations backend. When the backend is unreachable every command\n\
        still answers, using the bundled fallback dataset.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "TRAFFICDECK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend project URL (overrides profile)
    #[arg(long, short = 'b', env = "TRAFFICDECK_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Backend API key
    #[arg(long, env = "TRAFFICDECK_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TRAFFICDECK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "TRAFFICDECK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: profile, then config defaults, then 30]
    #[arg(long, env = "TRAFFICDECK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Intersection status and detail
    #[command(alias = "int", alias = "i")]
    Intersections(IntersectionsArgs),

    /// Operator alerts
    #[command(alias = "a")]
    Alerts(AlertsArgs),

    /// Aggregate traffic statistics
    Stats(StatsArgs),

    /// Follow intersection changes pushed by the backend
    Watch,

    /// Drive the dashboard views with navigation commands read from stdin
    Session,

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Intersections ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct IntersectionsArgs {
    #[command(subcommand)]
    pub command: IntersectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum IntersectionsCommand {
    /// List all intersections
    #[command(alias = "ls")]
    List,

    /// Show one intersection (placeholder if the ID is unknown)
    Show {
        /// Intersection ID (e.g. INT-001)
        id: String,
    },

    /// Average speed and abnormal intersections
    Summary,
}

// ── Alerts ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List alerts, newest first
    #[command(alias = "ls")]
    List(AlertFilterArgs),

    /// Open/resolved counts
    Summary(AlertFilterArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AlertFilterArgs {
    /// Status filter: all, pending, processing, resolved
    #[arg(long, short = 's', default_value = "all")]
    pub status: String,

    /// Category filter: all, accident, congestion, device, emergency
    #[arg(long, short = 'c', default_value = "all")]
    pub category: String,
}

// ── Stats ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Derive counters from the intersection and alert lists instead of
    /// backend counts
    #[arg(long)]
    pub local: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the loaded configuration (keys masked)
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Store the API key for the active profile in the system keyring
    /// (read from stdin)
    SetKey,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
