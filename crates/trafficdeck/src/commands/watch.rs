//! Follow intersection changes until interrupted.

use std::sync::Arc;

use tracing::info;
use trafficdeck_core::{BackendSource, IntersectionStore};

use crate::cli::GlobalOpts;
use crate::commands::intersections::IntersectionRow;
use crate::error::CliError;
use crate::output::{self, Painter};

pub async fn handle(source: Arc<BackendSource>, global: &GlobalOpts) -> Result<(), CliError> {
    let store = IntersectionStore::activate(source).await;
    if !store.is_subscribed() {
        return Err(CliError::Unsupported {
            operation: "watch".into(),
            required: "realtime enabled for the profile".into(),
        });
    }

    let painter = Painter::new(&global.color);
    let mut updates = store.subscribe();
    let mut snapshot = updates.current().clone();

    loop {
        output::warn_degraded("intersections", snapshot.last_error.as_deref(), global.quiet);
        let out = output::render_list(
            &global.output,
            snapshot.records.as_slice(),
            |i| IntersectionRow::new(i, painter),
            |i| i.id.clone(),
        )?;
        output::print_output(&out, global.quiet);

        // Skip the loading edge; print once the refresh lands.
        let next = loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    store.dispose();
                    return Ok(());
                }
                changed = updates.changed() => match changed {
                    Some(snap) if snap.is_loading => {}
                    Some(snap) => break snap,
                    None => {
                        store.dispose();
                        return Ok(());
                    }
                }
            }
        };
        snapshot = next;
    }
}
