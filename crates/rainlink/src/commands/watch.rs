//! `rainlink watch`: stream zone changes and connection notices.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;

use rainlink_config::Config;
use rainlink_core::{Dashboard, LinkEvent, Notification, Zone, ZoneStore};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: WatchArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let dashboard = Dashboard::new(config::build_dashboard_config(global, cfg)?)?;
    let format = global.output_format();
    let color = output::should_color(&global.color_mode());

    let mut notifications = dashboard.notifications();
    let mut link_events = dashboard.link_events();
    let zones = dashboard.subscribe_zones();
    let mut previous = Arc::clone(zones.current());
    let mut updates = zones.into_stream();

    dashboard.connect().await?;
    if !global.quiet {
        eprintln!(
            "Watching {} (press Ctrl-C to stop)",
            dashboard.config().endpoint
        );
    }

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            Some(snapshot) = updates.next() => {
                print_changes(&previous, &snapshot, &format, global.quiet)?;
                previous = snapshot;
            }
            Ok(note) = notifications.recv() => {
                if !global.quiet {
                    eprintln!("{}", format_notification(&note, color));
                }
            }
            Ok(event) = link_events.recv() => {
                if let LinkEvent::RetryScheduled { attempt, delay } = event {
                    if !global.quiet {
                        eprintln!(
                            "Reconnecting in {} (attempt {attempt})",
                            humantime::format_duration(round_to_millis(delay))
                        );
                    }
                }
            }
        }
    }

    dashboard.disconnect().await;
    Ok(())
}

/// Print every zone that differs between two snapshots.
fn print_changes(
    before: &ZoneStore,
    after: &ZoneStore,
    format: &OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    for zone in after.zones() {
        let Some(old) = before.get(zone.id) else {
            continue;
        };
        if old == zone {
            continue;
        }

        let line = match format {
            OutputFormat::Table | OutputFormat::Plain => {
                format!("#{} {}: {}", zone.id, zone.name, describe_change(old, zone))
            }
            OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(zone)?,
            OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(zone)?),
        };
        output::print_output(&line, quiet);
    }
    Ok(())
}

fn describe_change(old: &Zone, new: &Zone) -> String {
    let mut parts = Vec::new();
    if old.moisture != new.moisture {
        parts.push(format!("moisture {}% -> {}%", old.moisture, new.moisture));
    }
    if old.temperature != new.temperature {
        parts.push(format!(
            "temperature {}°C -> {}°C",
            old.temperature, new.temperature
        ));
    }
    if old.active != new.active {
        parts.push(format!("valve {}", if new.active { "opened" } else { "closed" }));
    }
    if old.name != new.name {
        parts.push(format!("renamed from \"{}\"", old.name));
    }
    parts.join(", ")
}

fn format_notification(note: &Notification, color: bool) -> String {
    let title = output::paint_severity(&note.title, note.severity, color);
    match note.description {
        Some(ref desc) => format!("[{}] {title}: {desc}", note.at.format("%H:%M:%S")),
        None => format!("[{}] {title}", note.at.format("%H:%M:%S")),
    }
}

fn round_to_millis(delay: Duration) -> Duration {
    Duration::from_millis(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX))
}
