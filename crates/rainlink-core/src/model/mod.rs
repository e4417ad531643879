// ── Zone domain model ──
//
// Canonical types every consumer (CLI, tests, future front ends) works with.
// Wire payloads from rainlink-api are converted into these in `convert`.

pub mod seed;
pub mod summary;
pub mod zone;

// ── Re-exports ──────────────────────────────────────────────────────

pub use seed::default_zones;
pub use summary::ZoneSummary;
pub use zone::{MoistureLevel, SensorUpdate, Zone, ZoneId};
