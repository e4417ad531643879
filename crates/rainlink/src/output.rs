//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use rainlink_core::{MoistureLevel, Severity, Zone, ZoneSummary};

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

fn paint_level(text: String, level: MoistureLevel, color: bool) -> String {
    if !color {
        return text;
    }
    match level {
        MoistureLevel::Excellent => text.green().to_string(),
        MoistureLevel::Normal => text.yellow().to_string(),
        MoistureLevel::Low => text.red().to_string(),
    }
}

pub fn paint_severity(text: &str, severity: Severity, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match severity {
        Severity::Success => text.green().to_string(),
        Severity::Info => text.cyan().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Error => text.red().bold().to_string(),
    }
}

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct ZoneRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Valve")]
    valve: String,
    #[tabled(rename = "Moisture")]
    moisture: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Last watered")]
    last_watered: String,
}

impl ZoneRow {
    pub fn new(zone: &Zone, color: bool) -> Self {
        let valve = match (zone.active, color) {
            (true, true) => "open".blue().to_string(),
            (true, false) => "open".into(),
            (false, _) => "closed".into(),
        };
        let level = zone.moisture_level();

        Self {
            id: zone.id.get(),
            name: zone.name.clone(),
            valve,
            moisture: paint_level(format!("{}% ({level})", zone.moisture), level, color),
            temperature: format!("{}°C", zone.temperature),
            last_watered: if zone.last_watered.is_empty() {
                "-".into()
            } else {
                zone.last_watered.clone()
            },
        }
    }
}

/// Multi-line summary card block for table output.
pub fn summary_detail(summary: &ZoneSummary, color: bool) -> String {
    let level = MoistureLevel::from_percent(summary.mean_moisture);
    format!(
        "Active zones:      {}/{}\n\
         Mean moisture:     {}\n\
         Mean temperature:  {}°C",
        summary.active_count,
        summary.total,
        paint_level(format!("{}% ({level})", summary.mean_moisture), level, color),
        summary.mean_temperature,
    )
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
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
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use the
/// `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
