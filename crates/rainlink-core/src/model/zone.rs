// ── Zone domain types ──
//
// A zone is one irrigation area: a valve plus the sensors reporting on it.
// Ids are assigned by the controller board and never change.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use rainlink_api::protocol::MAX_MOISTURE;
use serde::{Deserialize, Serialize};

// ── ZoneId ──────────────────────────────────────────────────────────

/// Stable identifier of a zone, as used on the wire (`zoneId`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(u32);

impl ZoneId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ZoneId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u32> for ZoneId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<ZoneId> for u32 {
    fn from(id: ZoneId) -> Self {
        id.0
    }
}

// ── MoistureLevel ───────────────────────────────────────────────────

/// Coarse soil moisture classification used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MoistureLevel {
    Excellent,
    Normal,
    Low,
}

impl MoistureLevel {
    pub fn from_percent(moisture: u8) -> Self {
        match moisture {
            70.. => Self::Excellent,
            50..=69 => Self::Normal,
            _ => Self::Low,
        }
    }
}

// ── Zone ────────────────────────────────────────────────────────────

/// An irrigation zone and its latest readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    /// Whether the valve is open.
    pub active: bool,
    /// Soil moisture, percent.
    pub moisture: u8,
    /// Soil temperature in °C, as reported by the board.
    pub temperature: i32,
    /// Free-form, for display only.
    pub last_watered: String,
}

impl Zone {
    /// A zone with no readings yet.
    pub fn new(id: impl Into<ZoneId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active: false,
            moisture: 0,
            temperature: 0,
            last_watered: String::new(),
        }
    }

    /// Moisture within 0..=100.
    pub fn has_valid_moisture(&self) -> bool {
        self.moisture <= MAX_MOISTURE
    }

    pub fn moisture_level(&self) -> MoistureLevel {
        MoistureLevel::from_percent(self.moisture)
    }

    /// Merge a sensor update; absent fields are left untouched.
    pub(crate) fn apply(&mut self, update: &SensorUpdate) {
        if let Some(moisture) = update.moisture {
            self.moisture = moisture;
        }
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
    }
}

// ── SensorUpdate ────────────────────────────────────────────────────

/// A partial set of readings for one zone. `None` means "unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorUpdate {
    pub moisture: Option<u8>,
    pub temperature: Option<i32>,
    pub active: Option<bool>,
}

impl SensorUpdate {
    pub fn is_empty(&self) -> bool {
        self.moisture.is_none() && self.temperature.is_none() && self.active.is_none()
    }

    /// False when the update carries a moisture reading above 100.
    pub fn is_in_range(&self) -> bool {
        self.moisture.is_none_or(|m| m <= MAX_MOISTURE)
    }
}
