//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use rainlink_config::ConfigError;
use rainlink_core::CoreError;

/// Process exit codes. Success is 0.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {endpoint}")]
    #[diagnostic(
        code(rainlink::connection_failed),
        help(
            "Check that the board is powered and on the same network.\n\
             Endpoint: {endpoint}\n\
             Change it with: rainlink config set-endpoint <HOST:PORT>"
        )
    )]
    ConnectionFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Cannot connect to controller: {reason}")]
    #[diagnostic(
        code(rainlink::handshake_failed),
        help("Check that the board is powered and on the same network.")
    )]
    Handshake { reason: String },

    #[error("Connection to controller lost: {reason}")]
    #[diagnostic(code(rainlink::connection_lost))]
    ConnectionLost { reason: String },

    #[error("Not connected to the irrigation controller")]
    #[diagnostic(
        code(rainlink::not_connected),
        help("The command was not delivered. Retry once the controller is reachable.")
    )]
    NotConnected,

    // ── Zones ────────────────────────────────────────────────────────
    #[error("Zone '{id}' not found")]
    #[diagnostic(
        code(rainlink::zone_not_found),
        help("Run: rainlink zones -o plain to see available zone IDs")
    )]
    ZoneNotFound { id: String },

    #[error("Zone name cannot be blank")]
    #[diagnostic(code(rainlink::invalid_name))]
    InvalidName,

    // ── Controller data ──────────────────────────────────────────────
    #[error("Controller sent a malformed message: {message}")]
    #[diagnostic(code(rainlink::malformed_message))]
    MalformedMessage { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rainlink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(rainlink::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: rainlink config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(rainlink::config))]
    Config(Box<figment::Error>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Controller did not respond within {seconds}s")]
    #[diagnostic(
        code(rainlink::timeout),
        help("Increase the wait with --wait or check the board's Wi-Fi signal.")
    )]
    Timeout { seconds: u64 },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(rainlink::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(rainlink::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(rainlink::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. }
            | Self::Handshake { .. }
            | Self::ConnectionLost { .. }
            | Self::NotConnected => exit_code::CONNECTION,
            Self::ZoneNotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::InvalidName | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ZoneNotFound { id } => CliError::ZoneNotFound { id: id.to_string() },
            CoreError::InvalidName => CliError::InvalidName,
            CoreError::DuplicateZone { id } => CliError::Validation {
                field: "zones".into(),
                reason: format!("zone id {id} appears more than once"),
            },
            CoreError::InvalidMoisture { id, moisture } => CliError::Validation {
                field: "zones".into(),
                reason: format!("zone {id} moisture {moisture}% is outside 0-100"),
            },
            CoreError::NotConnected => CliError::NotConnected,
            CoreError::ConnectionLost { reason } => CliError::ConnectionLost { reason },
            CoreError::ConnectionFailed { endpoint, reason } => CliError::ConnectionFailed {
                endpoint,
                source: reason.into(),
            },
            CoreError::Handshake { reason } => CliError::Handshake { reason },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::MalformedMessage { message } => CliError::MalformedMessage { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
