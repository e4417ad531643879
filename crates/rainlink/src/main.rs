mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Log to stderr so stdout stays machine-readable.
fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        mut global,
        command,
    } = cli;

    // Completions need neither config nor a controller.
    if let Command::Completions(ref args) = command {
        let mut cmd = Cli::command();
        clap_complete::generate(args.shell, &mut cmd, "rainlink", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config()?;
    config::apply_defaults(&mut global, &cfg);

    tracing::debug!(command = ?command, "dispatching command");
    commands::dispatch(command, cfg, &global).await
}
