//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use rainlink_core::{Dashboard, LinkState};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A stderr spinner, hidden when quiet or not attached to a terminal.
pub fn spinner(message: &str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Connect, apply live sensor data for `duration` (or until Ctrl-C), then
/// disconnect. Returns whether the controller was reached at all.
pub async fn listen(
    dashboard: &Dashboard,
    duration: Duration,
    global: &GlobalOpts,
) -> Result<bool, CliError> {
    let mut state = dashboard.connection_state();
    dashboard.connect().await?;

    let pb = spinner(
        &format!("Connecting to {}", dashboard.config().endpoint),
        global,
    );
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    let mut reached = false;

    loop {
        tokio::select! {
            () = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let now = *state.borrow_and_update();
                if now == LinkState::Connected {
                    reached = true;
                    pb.set_message("Receiving sensor data");
                } else {
                    pb.set_message(format!("Controller {now}"));
                }
            }
        }
    }

    dashboard.disconnect().await;
    pb.finish_and_clear();

    if !reached && !global.quiet {
        eprintln!(
            "warning: controller at {} not reachable; showing configured values",
            dashboard.config().endpoint
        );
    }
    Ok(reached)
}
