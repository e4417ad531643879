//! Endpoint parsing.
//!
//! Controller boards are usually configured by bare `host:port`; a full
//! `ws://` or `wss://` URL is accepted as well.

use url::Url;

use crate::error::Error;

/// Address the stock controller firmware listens on.
pub const DEFAULT_ENDPOINT: &str = "ws://192.168.1.100:81/";

/// Parse a configured endpoint into a WebSocket URL.
///
/// `192.168.1.100:81` becomes `ws://192.168.1.100:81/`. Any scheme other
/// than `ws` / `wss` is rejected, as is a URL without a host.
pub fn parse_endpoint(raw: &str) -> Result<Url, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(raw, "endpoint is empty"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("ws://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| invalid(raw, &e.to_string()))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(invalid(
                raw,
                &format!("unsupported scheme '{other}', expected ws or wss"),
            ));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(raw, "missing host"));
    }

    Ok(url)
}

fn invalid(raw: &str, reason: &str) -> Error {
    Error::InvalidEndpoint {
        endpoint: raw.to_owned(),
        reason: reason.to_owned(),
    }
}
