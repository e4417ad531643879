// ── Filter predicates for zone snapshots ──
//
// Lets front ends narrow a snapshot without touching the store.

use crate::model::{MoistureLevel, Zone};

/// Filter predicate for zone collections.
pub enum ZoneFilter {
    All,
    Active,
    Inactive,
    ByLevel(MoistureLevel),
    Custom(Box<dyn Fn(&Zone) -> bool + Send + Sync>),
}

impl ZoneFilter {
    pub fn matches(&self, zone: &Zone) -> bool {
        match self {
            Self::All => true,
            Self::Active => zone.active,
            Self::Inactive => !zone.active,
            Self::ByLevel(level) => zone.moisture_level() == *level,
            Self::Custom(f) => f(zone),
        }
    }
}
