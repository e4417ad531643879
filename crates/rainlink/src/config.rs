//! CLI glue over `rainlink-config`: applies `GlobalOpts` overrides and
//! builds the `DashboardConfig` handed to core.

use clap::ValueEnum;

use rainlink_config::{Config, Profile};
use rainlink_core::DashboardConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use rainlink_config::{config_path, load_config, save_config};

/// Determine the active profile name from flags and config.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    cfg.profile_name(global.profile.as_deref())
}

/// Fill `--output` / `--color` from `[defaults]` when not given on the
/// command line. Unrecognised config values are ignored.
pub fn apply_defaults(global: &mut GlobalOpts, cfg: &Config) {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&cfg.defaults.output, true).ok();
    }
    if global.color.is_none() {
        global.color = ColorMode::from_str(&cfg.defaults.color, true).ok();
    }
}

/// Resolve the profile to use.
///
/// An explicitly requested profile must exist. Otherwise a missing default
/// profile falls back to factory settings, so the CLI works before
/// `config init` has been run.
pub fn resolve_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, cfg);

    match cfg.profiles.get(&name) {
        Some(profile) => Ok((name, profile.clone())),
        None if global.profile.is_some() => Err(profile_not_found(name, cfg)),
        None => {
            tracing::debug!(profile = %name, "profile not configured, using factory settings");
            Ok((name, Profile::default()))
        }
    }
}

/// Build a `DashboardConfig` from the config file, profile, and CLI overrides.
pub fn build_dashboard_config(global: &GlobalOpts, cfg: &Config) -> Result<DashboardConfig, CliError> {
    let (_, mut profile) = resolve_profile(global, cfg)?;

    if let Some(ref endpoint) = global.endpoint {
        profile.endpoint.clone_from(endpoint);
    }

    Ok(rainlink_config::profile_to_dashboard_config(&profile)?)
}

pub fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}
