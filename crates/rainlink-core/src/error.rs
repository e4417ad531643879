// ── Core error types ──
//
// User-facing errors from rainlink-core. Consumers never see tungstenite
// or serde errors directly; the `From<rainlink_api::Error>` impl folds
// transport failures into domain variants.

use thiserror::Error;

use crate::model::ZoneId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Zone errors ──────────────────────────────────────────────────
    #[error("Zone not found: {id}")]
    ZoneNotFound { id: ZoneId },

    #[error("Invalid zone name: a name must contain non-whitespace characters")]
    InvalidName,

    #[error("Duplicate zone id {id} in seed")]
    DuplicateZone { id: ZoneId },

    #[error("Zone {id} moisture {moisture}% is outside 0-100")]
    InvalidMoisture { id: ZoneId, moisture: u8 },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Not connected to the irrigation controller")]
    NotConnected,

    #[error("Connection to controller lost: {reason}")]
    ConnectionLost { reason: String },

    #[error("Cannot connect to controller at {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The WebSocket handshake failed; the link does not report which
    /// endpoint it was dialling.
    #[error("Cannot connect to controller: {reason}")]
    Handshake { reason: String },

    #[error("Controller did not connect within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed message from controller: {message}")]
    MalformedMessage { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rainlink_api::Error> for CoreError {
    fn from(err: rainlink_api::Error) -> Self {
        match err {
            rainlink_api::Error::InvalidEndpoint { endpoint, reason } => CoreError::Config {
                message: format!("Invalid endpoint '{endpoint}': {reason}"),
            },
            rainlink_api::Error::Connect(reason) => CoreError::Handshake { reason },
            rainlink_api::Error::ConnectionLost { reason } => CoreError::ConnectionLost { reason },
            rainlink_api::Error::MalformedMessage { message } => {
                CoreError::MalformedMessage { message }
            }
            rainlink_api::Error::NotConnected => CoreError::NotConnected,
            rainlink_api::Error::SendQueueFull => CoreError::ConnectionLost {
                reason: "outbound queue is full".into(),
            },
            rainlink_api::Error::Serialization(e) => {
                CoreError::Internal(format!("Serialization error: {e}"))
            }
        }
    }
}
