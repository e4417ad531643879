//! Shared configuration for rainlink front ends.
//!
//! TOML profiles on disk, `RAINLINK_`-prefixed environment overrides, and
//! translation to `rainlink_core::DashboardConfig`. The CLI adds
//! `GlobalOpts`-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rainlink_core::{DashboardConfig, ReconnectConfig, Zone, ZoneId, ZoneStore, default_zones};

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "RAINLINK_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The profile name to use: an explicit choice, else `default_profile`,
    /// else `"default"`.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
            .to_owned()
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A named controller profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Board address: `host:port` or a `ws://` / `wss://` URL.
    pub endpoint: String,

    /// First reconnect delay, in milliseconds.
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    /// Backoff ceiling, in seconds.
    #[serde(default = "default_reconnect_max_secs")]
    pub reconnect_max_secs: u64,

    /// Stop reconnecting after this many consecutive failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Zone layout. Empty means the factory layout.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<ZoneSeed>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            endpoint: "192.168.1.100:81".into(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_secs: default_reconnect_max_secs(),
            max_retries: None,
            zones: Vec::new(),
        }
    }
}

fn default_reconnect_initial_ms() -> u64 {
    1000
}
fn default_reconnect_max_secs() -> u64 {
    30
}

impl Profile {
    pub fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.reconnect_initial_ms),
            max_delay: Duration::from_secs(self.reconnect_max_secs),
            max_retries: self.max_retries,
        }
    }

    /// Configured zones, or the factory layout when none are configured.
    pub fn zones_or_default(&self) -> Vec<Zone> {
        if self.zones.is_empty() {
            default_zones()
        } else {
            self.zones.iter().map(Zone::from).collect()
        }
    }

    /// Replace the zone seed with `zones`.
    pub fn set_zones<'a>(&mut self, zones: impl IntoIterator<Item = &'a Zone>) {
        self.zones = zones.into_iter().map(ZoneSeed::from).collect();
    }
}

/// One zone as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ZoneSeed {
    pub id: u32,
    pub name: String,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub moisture: u8,

    #[serde(default)]
    pub temperature: i32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_watered: String,
}

impl From<&ZoneSeed> for Zone {
    fn from(seed: &ZoneSeed) -> Self {
        Zone {
            id: ZoneId::new(seed.id),
            name: seed.name.clone(),
            active: seed.active,
            moisture: seed.moisture,
            temperature: seed.temperature,
            last_watered: seed.last_watered.clone(),
        }
    }
}

impl From<&Zone> for ZoneSeed {
    fn from(zone: &Zone) -> Self {
        ZoneSeed {
            id: zone.id.get(),
            name: zone.name.clone(),
            active: zone.active,
            moisture: zone.moisture,
            temperature: zone.temperature,
            last_watered: zone.last_watered.clone(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `RAINLINK_CONFIG` if set, else the
/// platform config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }

    ProjectDirs::from("com", "rainlink", "rainlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rainlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment. A missing file is not
/// an error.
///
/// Nested keys use a double underscore, e.g.
/// `RAINLINK_PROFILES__DEFAULT__ENDPOINT=10.0.0.5:81`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RAINLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

/// Serialize config to TOML and write to `path`, creating parent
/// directories as needed.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DashboardConfig` from a profile.
///
/// Validates the endpoint and the zone seed (unique ids, non-blank names,
/// moisture within 0..=100).
pub fn profile_to_dashboard_config(profile: &Profile) -> Result<DashboardConfig, ConfigError> {
    let endpoint =
        rainlink_api::parse_endpoint(&profile.endpoint).map_err(|e| ConfigError::Validation {
            field: "endpoint".into(),
            reason: e.to_string(),
        })?;

    if profile.reconnect_initial_ms == 0 {
        return Err(ConfigError::Validation {
            field: "reconnect_initial_ms".into(),
            reason: "must be greater than zero".into(),
        });
    }

    if let Some(seed) = profile
        .zones
        .iter()
        .find(|z| z.moisture > rainlink_api::protocol::MAX_MOISTURE)
    {
        return Err(ConfigError::Validation {
            field: "zones".into(),
            reason: format!("zone {} moisture {} exceeds 100", seed.id, seed.moisture),
        });
    }

    let zones = profile.zones_or_default();
    ZoneStore::new(zones.clone()).map_err(|e| ConfigError::Validation {
        field: "zones".into(),
        reason: e.to_string(),
    })?;

    Ok(DashboardConfig {
        endpoint,
        reconnect: profile.reconnect_config(),
        zones,
    })
}
