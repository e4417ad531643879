// ── Wire-to-domain conversions ──
//
// Bridges rainlink-api payloads into zone model types and back.

use rainlink_api::{OutboundCommand, SensorData};

use crate::model::{SensorUpdate, ZoneId};

impl From<&SensorData> for SensorUpdate {
    fn from(data: &SensorData) -> Self {
        Self {
            moisture: data.moisture,
            temperature: data.temperature,
            active: data.active,
        }
    }
}

/// Split a sensor payload into the target zone and the fields it carries.
pub fn sensor_update(data: &SensorData) -> (ZoneId, SensorUpdate) {
    (ZoneId::new(data.zone_id), SensorUpdate::from(data))
}

/// The command that asks the board to set a zone's valve to `active`.
pub fn toggle_command(id: ZoneId, active: bool) -> OutboundCommand {
    OutboundCommand::ToggleZone {
        zone_id: id.get(),
        active,
    }
}
