// ── Status model ──
//
// Everything known about one receiver. Pure data plus derived read-only
// views. Sub-structs that only the admin WebSocket can fill are wrapped in
// `Option` on `Status`: `None` means "not available in this mode", which
// consumers must be able to tell apart from a measured zero.

pub mod channel;
pub mod device_config;
pub mod gps;
pub mod mac;
pub mod reporter;
pub mod status;
pub mod system;

pub use channel::{Channel, ChannelActivity, ChannelKind, ChannelSummary};
pub use device_config::{DeviceConfig, MacSource};
pub use gps::{GpsReceiver, GpsStatus, Satellite, SatelliteSummary};
pub use mac::MacAddress;
pub use reporter::ReporterConfig;
pub use status::{ConnectionMode, SnrReading, Status};
pub use system::SystemStats;
