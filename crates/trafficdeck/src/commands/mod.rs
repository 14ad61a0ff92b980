//! Command dispatch: bridges CLI args -> core stores -> output formatting.

pub mod alerts;
pub mod config_cmd;
pub mod intersections;
pub mod session;
pub mod stats;
pub mod watch;

use std::sync::Arc;

use trafficdeck_core::BackendSource;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    source: Arc<BackendSource>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Intersections(args) => intersections::handle(source, args, global).await,
        Command::Alerts(args) => alerts::handle(source, args, global).await,
        Command::Stats(args) => stats::handle(source, args, global).await,
        Command::Watch => watch::handle(source, global).await,
        Command::Session => session::handle(source, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}
