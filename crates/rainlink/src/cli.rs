//! Clap derive structures for the `rainlink` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Also
//! compiled by `build.rs` for man page generation, so it depends on clap
//! and clap_complete only.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rainlink -- watch and control a home irrigation controller
#[derive(Debug, Parser)]
#[command(
    name = "rainlink",
    version,
    about = "Monitor and control garden irrigation zones from the command line",
    long_about = "Talks to an irrigation controller board over WebSocket.\n\n\
        Shows zone moisture, temperature and valve state, streams live sensor\n\
        data, and opens or closes zone valves.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "RAINLINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller endpoint, host:port or ws:// URL (overrides profile)
    #[arg(long, short = 'e', env = "RAINLINK_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "RAINLINK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl GlobalOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.clone().unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
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
    /// List zones with their latest readings
    #[command(alias = "ls", alias = "z")]
    Zones(ZonesArgs),

    /// Show the summary cards (active zones, mean moisture, mean temperature)
    #[command(alias = "sum")]
    Summary(SummaryArgs),

    /// Stream live zone changes and connection notices until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Open or close a zone's valve
    #[command(alias = "t")]
    Toggle(ToggleArgs),

    /// Rename a zone in the active profile
    Rename(RenameArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ZONES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ZonesArgs {
    /// Connect and apply live sensor data for this many seconds first
    #[arg(long, value_name = "SECS")]
    pub live: Option<u64>,

    /// Only show matching zones
    #[arg(long, short = 'f', value_enum, default_value = "all")]
    pub filter: ZoneFilterArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ZoneFilterArg {
    /// Every zone
    All,
    /// Valve open
    Active,
    /// Valve closed
    Inactive,
    /// Moisture below 50%
    Low,
    /// Moisture 50-69%
    Normal,
    /// Moisture 70% and above
    Excellent,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Connect and apply live sensor data for this many seconds first
    #[arg(long, value_name = "SECS")]
    pub live: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOGGLE / RENAME
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ToggleArgs {
    /// Zone ID
    pub id: u32,

    /// Seconds to wait for the controller connection
    #[arg(long, value_name = "SECS", default_value = "10")]
    pub wait: u64,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Zone ID
    pub id: u32,

    /// New display name (surrounding whitespace is trimmed)
    pub name: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Set the controller endpoint of the active profile
    SetEndpoint {
        /// host:port or ws:// / wss:// URL
        endpoint: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
