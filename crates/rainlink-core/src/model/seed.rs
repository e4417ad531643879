// ── Factory zone layout ──
//
// Used when a profile configures no zones of its own.

use super::zone::{Zone, ZoneId};

const DEFAULT_ZONES: [(u32, &str, bool, u8, i32, &str); 8] = [
    (1, "Front lawn", true, 72, 24, "2 hours ago"),
    (2, "Flower bed", true, 68, 23, "1 hour ago"),
    (3, "Vegetable garden", false, 55, 25, "5 hours ago"),
    (4, "Back lawn", true, 75, 22, "30 minutes ago"),
    (5, "Greenhouse", false, 58, 28, "4 hours ago"),
    (6, "Entrance bed", true, 71, 23, "1.5 hours ago"),
    (7, "Orchard", true, 69, 24, "2.5 hours ago"),
    (8, "Rose garden", false, 52, 22, "6 hours ago"),
];

/// The eight zones a freshly flashed controller reports.
pub fn default_zones() -> Vec<Zone> {
    DEFAULT_ZONES
        .iter()
        .map(
            |&(id, name, active, moisture, temperature, last_watered)| Zone {
                id: ZoneId::new(id),
                name: name.to_owned(),
                active,
                moisture,
                temperature,
                last_watered: last_watered.to_owned(),
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_seed_has_unique_ids() {
        let zones = default_zones();
        let mut ids: Vec<_> = zones.iter().map(|z| z.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), zones.len());
        assert_eq!(zones.len(), 8);
    }

    #[test]
    fn default_seed_has_five_active_zones() {
        assert_eq!(default_zones().iter().filter(|z| z.active).count(), 5);
    }
}
