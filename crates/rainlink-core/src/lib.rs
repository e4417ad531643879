// rainlink-core: Zone state and session logic between rainlink-api and front ends.

pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod notification;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::DashboardConfig;
pub use controller::{Dashboard, Delivery, ToggleOutcome};
pub use error::CoreError;
pub use notification::{Notification, Severity};
pub use store::ZoneStore;
pub use stream::{ZoneFilter, ZoneStream};

pub use model::{MoistureLevel, SensorUpdate, Zone, ZoneId, ZoneSummary, default_zones};

// Link types consumers need without depending on rainlink-api directly.
pub use rainlink_api::{LinkEvent, LinkState, ReconnectConfig};
