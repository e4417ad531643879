// ── Runtime dashboard configuration ──
//
// Describes *what* to connect to and which zones to start with.
// Core never reads config files; the CLI builds a `DashboardConfig`
// and hands it in.

use rainlink_api::ReconnectConfig;
use url::Url;

use crate::model::{Zone, default_zones};

/// Configuration for a single dashboard session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Controller board WebSocket endpoint (e.g., `ws://192.168.1.100:81/`).
    pub endpoint: Url,
    /// Backoff policy for the device link.
    pub reconnect: ReconnectConfig,
    /// Zone seed, in display order.
    pub zones: Vec<Zone>,
}

impl DashboardConfig {
    /// Default reconnect policy and the factory zone layout.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            reconnect: ReconnectConfig::default(),
            zones: default_zones(),
        }
    }

    pub fn with_zones(mut self, zones: Vec<Zone>) -> Self {
        self.zones = zones;
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }
}
