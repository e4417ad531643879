use thiserror::Error;

/// Top-level error type for the `rainlink-api` crate.
///
/// Covers every failure mode of the device link: endpoint parsing, the
/// WebSocket handshake, a dropped connection, inbound frame decoding, and
/// outbound queueing. `rainlink-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Endpoint ────────────────────────────────────────────────────
    /// The configured address is not a usable `ws://` / `wss://` endpoint.
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    // ── Connection ──────────────────────────────────────────────────
    /// WebSocket handshake failed (refused, DNS failure, TLS, bad upgrade).
    #[error("WebSocket connection failed: {0}")]
    Connect(String),

    /// An established connection dropped without being asked to.
    #[error("Connection lost: {reason}")]
    ConnectionLost { reason: String },

    // ── Frames ──────────────────────────────────────────────────────
    /// Inbound frame was not valid JSON or did not match a known shape.
    #[error("Malformed message: {message}")]
    MalformedMessage { message: String },

    // ── Outbound ────────────────────────────────────────────────────
    /// A command was sent while the link was not connected.
    #[error("Not connected to the irrigation controller")]
    NotConnected,

    /// The outbound queue is full; the socket writer is not keeping up.
    #[error("Outbound command queue is full")]
    SendQueueFull,

    /// Serializing an outbound command failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
