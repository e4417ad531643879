//! `rainlink toggle`: open or close one zone's valve.

use std::time::Duration;

use serde::Serialize;

use rainlink_config::Config;
use rainlink_core::{Dashboard, Delivery, ZoneId};

use crate::cli::{GlobalOpts, ToggleArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ToggleReport {
    zone_id: u32,
    name: String,
    active: bool,
    sent: bool,
}

pub async fn handle(args: ToggleArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let dashboard_config = config::build_dashboard_config(global, cfg)?;
    let id = ZoneId::new(args.id);

    // Fail fast on an unknown zone instead of waiting for the board.
    let name = dashboard_config
        .zones
        .iter()
        .find(|z| z.id == id)
        .map(|z| z.name.clone())
        .ok_or_else(|| CliError::ZoneNotFound { id: id.to_string() })?;

    let pb = util::spinner(
        &format!("Connecting to {}", dashboard_config.endpoint),
        global,
    );
    let result = Dashboard::oneshot(dashboard_config, Duration::from_secs(args.wait), |d| async move {
        d.toggle_zone(id)
    })
    .await;
    pb.finish_and_clear();
    let outcome = result?;

    let sent = match outcome.delivery {
        Delivery::Sent => true,
        Delivery::NotSent(ref e) => {
            tracing::warn!(error = %e, "toggle command not delivered");
            false
        }
    };
    if !sent {
        return Err(CliError::NotConnected);
    }

    let report = ToggleReport {
        zone_id: id.get(),
        name,
        active: outcome.active,
        sent,
    };
    let out = output::render_single(
        &global.output_format(),
        &report,
        |r| {
            format!(
                "Zone {} ({}) valve {}",
                r.zone_id,
                r.name,
                if r.active { "opened" } else { "closed" }
            )
        },
        |r| r.active.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
