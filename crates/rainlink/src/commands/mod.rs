//! Command dispatch: bridges CLI args -> dashboard operations -> output.

pub mod config_cmd;
pub mod rename;
pub mod summary;
pub mod toggle;
pub mod util;
pub mod watch;
pub mod zones;

use rainlink_config::Config;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to its handler.
pub async fn dispatch(cmd: Command, cfg: Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Zones(args) => zones::handle(args, &cfg, global).await,
        Command::Summary(args) => summary::handle(args, &cfg, global).await,
        Command::Watch(args) => watch::handle(args, &cfg, global).await,
        Command::Toggle(args) => toggle::handle(args, &cfg, global).await,
        Command::Rename(args) => rename::handle(args, cfg, global),
        Command::Config(args) => config_cmd::handle(args, cfg, global),
        // Handled in main before config is loaded.
        Command::Completions(_) => Ok(()),
    }
}
