// ── Zone store ──
//
// The session's authoritative list of zones. Seeded once; zones are never
// added or removed afterwards, only mutated in place.

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::{SensorUpdate, Zone, ZoneId, ZoneSummary};

/// Ordered, id-keyed collection of zones.
///
/// Iteration follows seed order. Cloning is a deep copy; the dashboard
/// shares snapshots through `Arc<ZoneStore>` and clones on write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneStore {
    zones: IndexMap<ZoneId, Zone>,
}

impl ZoneStore {
    /// Build a store from a seed list.
    ///
    /// Fails on a repeated id, a name that is blank after trimming, or
    /// moisture above 100.
    pub fn new(seed: impl IntoIterator<Item = Zone>) -> Result<Self, CoreError> {
        let mut zones = IndexMap::new();
        for zone in seed {
            if zone.name.trim().is_empty() {
                return Err(CoreError::InvalidName);
            }
            if !zone.has_valid_moisture() {
                return Err(CoreError::InvalidMoisture {
                    id: zone.id,
                    moisture: zone.moisture,
                });
            }
            let id = zone.id;
            if zones.insert(id, zone).is_some() {
                return Err(CoreError::DuplicateZone { id });
            }
        }
        Ok(Self { zones })
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Flip the valve flag. Returns the new value.
    pub fn toggle(&mut self, id: ZoneId) -> Result<bool, CoreError> {
        let zone = self.get_mut(id)?;
        zone.active = !zone.active;
        Ok(zone.active)
    }

    /// Set the valve flag explicitly. Returns the previous value.
    pub fn set_active(&mut self, id: ZoneId, active: bool) -> Result<bool, CoreError> {
        let zone = self.get_mut(id)?;
        Ok(std::mem::replace(&mut zone.active, active))
    }

    /// Rename a zone, storing the trimmed name.
    ///
    /// A blank name is rejected before the id is looked up, so the
    /// existing name is always kept on error.
    pub fn rename(&mut self, id: ZoneId, new_name: &str) -> Result<(), CoreError> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidName);
        }
        let zone = self.get_mut(id)?;
        trimmed.clone_into(&mut zone.name);
        Ok(())
    }

    /// Merge a sensor reading. Returns `false` (and changes nothing) for an
    /// unknown id or an out-of-range moisture reading.
    pub fn apply_sensor_update(&mut self, id: ZoneId, update: &SensorUpdate) -> bool {
        if !update.is_in_range() {
            return false;
        }
        match self.zones.get_mut(&id) {
            Some(zone) => {
                zone.apply(update);
                true
            }
            None => false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary::from_zones(self.zones.values())
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn contains(&self, id: ZoneId) -> bool {
        self.zones.contains_key(&id)
    }

    /// All zones in seed order.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Zones whose valve is open, in seed order.
    pub fn active_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values().filter(|z| z.active)
    }

    pub fn ids(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.zones.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    fn get_mut(&mut self, id: ZoneId) -> Result<&mut Zone, CoreError> {
        self.zones
            .get_mut(&id)
            .ok_or(CoreError::ZoneNotFound { id })
    }
}
