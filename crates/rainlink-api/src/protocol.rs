//! Wire format for frames exchanged with the controller board.
//!
//! Inbound frames are JSON envelopes with a `type` discriminator:
//!
//! ```json
//! { "type": "sensor_data", "data": { "zoneId": 3, "moisture": 41 } }
//! ```
//!
//! Outbound commands use the same discriminator, flattened:
//!
//! ```json
//! { "type": "toggle_zone", "zoneId": 3, "active": true }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Discriminator of the only inbound message the link acts on.
pub const SENSOR_DATA: &str = "sensor_data";

/// Highest moisture reading a sensor can report (percent).
pub const MAX_MOISTURE: u8 = 100;

// ── Inbound ──────────────────────────────────────────────────────────

/// Payload of a `sensor_data` frame.
///
/// Every reading is optional; absent and `null` fields both mean
/// "leave the current value alone".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorData {
    pub zone_id: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moisture: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Sensor readings for a single zone.
    SensorData(SensorData),
    /// Any other `type`. Carried so callers can log it, never acted on.
    Other { kind: String },
}

/// Raw envelope before the payload is interpreted.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl InboundMessage {
    /// Decode a text frame.
    ///
    /// Fails with [`Error::MalformedMessage`] on invalid JSON, a missing
    /// `type`, or a `sensor_data` payload that does not fit [`SensorData`].
    /// Unknown types decode successfully as [`InboundMessage::Other`].
    pub fn parse(text: &str) -> Result<Self, Error> {
        let envelope: Envelope = serde_json::from_str(text).map_err(malformed)?;

        if envelope.kind != SENSOR_DATA {
            return Ok(Self::Other {
                kind: envelope.kind,
            });
        }

        let data: SensorData = serde_json::from_value(envelope.data).map_err(malformed)?;
        if let Some(moisture) = data.moisture {
            if moisture > MAX_MOISTURE {
                return Err(Error::MalformedMessage {
                    message: format!(
                        "moisture {moisture}% out of range for zone {}",
                        data.zone_id
                    ),
                });
            }
        }

        Ok(Self::SensorData(data))
    }
}

fn malformed(err: serde_json::Error) -> Error {
    Error::MalformedMessage {
        message: err.to_string(),
    }
}

// ── Outbound ─────────────────────────────────────────────────────────

/// Commands sent to the controller board. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundCommand {
    /// Open or close the valve for a zone.
    ToggleZone {
        #[serde(rename = "zoneId")]
        zone_id: u32,
        active: bool,
    },
}

impl OutboundCommand {
    /// Serialize into the text frame written to the socket.
    pub fn to_frame(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// The wire discriminator, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToggleZone { .. } => "toggle_zone",
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_full_sensor_frame() {
        let raw = r#"{
            "type": "sensor_data",
            "data": { "zoneId": 2, "moisture": 68, "temperature": 23, "active": true }
        }"#;

        let msg = InboundMessage::parse(raw).unwrap();
        assert_eq!(
            msg,
            InboundMessage::SensorData(SensorData {
                zone_id: 2,
                moisture: Some(68),
                temperature: Some(23),
                active: Some(true),
            })
        );
    }

    #[test]
    fn parse_partial_sensor_frame_treats_null_as_absent() {
        let raw = r#"{"type":"sensor_data","data":{"zoneId":5,"moisture":40,"temperature":null}}"#;

        let InboundMessage::SensorData(data) = InboundMessage::parse(raw).unwrap() else {
            panic!("expected sensor data");
        };
        assert_eq!(data.zone_id, 5);
        assert_eq!(data.moisture, Some(40));
        assert_eq!(data.temperature, None);
        assert_eq!(data.active, None);
    }

    #[test]
    fn negative_temperature_is_accepted() {
        let raw = r#"{"type":"sensor_data","data":{"zoneId":1,"temperature":-4}}"#;
        let InboundMessage::SensorData(data) = InboundMessage::parse(raw).unwrap() else {
            panic!("expected sensor data");
        };
        assert_eq!(data.temperature, Some(-4));
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let msg = InboundMessage::parse(r#"{"type":"heartbeat","uptime":1234}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Other {
                kind: "heartbeat".into()
            }
        );
    }

    #[test]
    fn missing_type_is_malformed() {
        let err = InboundMessage::parse(r#"{"data":{"zoneId":1}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedMessage { .. }));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = InboundMessage::parse("not json at all").unwrap_err();
        assert!(matches!(err, Error::MalformedMessage { .. }));
    }

    #[test]
    fn sensor_frame_without_zone_id_is_malformed() {
        let err = InboundMessage::parse(r#"{"type":"sensor_data","data":{"moisture":50}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedMessage { .. }));
    }

    #[test]
    fn sensor_frame_without_payload_is_malformed() {
        let err = InboundMessage::parse(r#"{"type":"sensor_data"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedMessage { .. }));
    }

    #[test]
    fn moisture_above_range_is_malformed() {
        let err = InboundMessage::parse(r#"{"type":"sensor_data","data":{"zoneId":1,"moisture":140}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn toggle_command_wire_shape() {
        let cmd = OutboundCommand::ToggleZone {
            zone_id: 1,
            active: true,
        };
        assert_eq!(
            cmd.to_frame().unwrap(),
            r#"{"type":"toggle_zone","zoneId":1,"active":true}"#
        );
        assert_eq!(cmd.kind(), "toggle_zone");
    }
}
