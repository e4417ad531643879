// ── Aggregate zone statistics ──

use serde::{Deserialize, Serialize};

use super::zone::Zone;

/// Totals shown in the dashboard header cards.
///
/// Means are rounded to the nearest integer with halves rounding up
/// (-3.5 becomes -3); an empty zone list yields zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub active_count: usize,
    pub total: usize,
    pub mean_moisture: u8,
    pub mean_temperature: i32,
}

impl ZoneSummary {
    pub fn from_zones<'a>(zones: impl IntoIterator<Item = &'a Zone>) -> Self {
        let mut active_count = 0_usize;
        let mut total = 0_usize;
        let mut moisture_sum = 0_i64;
        let mut temperature_sum = 0_i64;

        for zone in zones {
            total += 1;
            if zone.active {
                active_count += 1;
            }
            moisture_sum += i64::from(zone.moisture);
            temperature_sum += i64::from(zone.temperature);
        }

        if total == 0 {
            return Self::default();
        }

        let count = i64::try_from(total).unwrap_or(i64::MAX);
        Self {
            active_count,
            total,
            // A mean of u8 values always fits in u8, likewise for i32.
            mean_moisture: u8::try_from(rounded_mean(moisture_sum, count)).unwrap_or(u8::MAX),
            mean_temperature: i32::try_from(rounded_mean(temperature_sum, count))
                .unwrap_or_default(),
        }
    }
}

/// Integer mean, `floor(sum / count + 0.5)`. `count` must be positive.
fn rounded_mean(sum: i64, count: i64) -> i64 {
    (sum * 2 + count).div_euclid(count * 2)
}
