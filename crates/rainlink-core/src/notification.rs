// ── User-facing notifications ──
//
// Short toast-style messages a front end can show as-is.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: Option<String>,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            description: None,
            at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn connected() -> Self {
        Self::new(Severity::Success, "Connected to controller")
            .with_description("Live data is streaming")
    }

    pub(crate) fn connection_lost() -> Self {
        Self::new(Severity::Error, "Connection lost").with_description("Attempting to reconnect...")
    }

    pub(crate) fn gave_up(attempts: u32) -> Self {
        Self::new(Severity::Error, "Controller unreachable")
            .with_description(format!("Stopped reconnecting after {attempts} attempts"))
    }

    pub(crate) fn renamed(name: &str) -> Self {
        Self::new(Severity::Success, "Zone renamed").with_description(format!("New name: {name}"))
    }
}
