// rainlink-api: WebSocket transport and wire format for irrigation controller boards.

pub mod endpoint;
pub mod error;
pub mod link;
pub mod protocol;

pub use endpoint::{DEFAULT_ENDPOINT, parse_endpoint};
pub use error::Error;
pub use link::{DeviceLink, LinkEvent, LinkState, ReconnectConfig, SensorFeed, calculate_backoff};
pub use protocol::{InboundMessage, OutboundCommand, SensorData};
