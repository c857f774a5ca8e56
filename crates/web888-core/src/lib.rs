//! Domain layer between `web888-api` and its consumers (CLI, bridges).
//!
//! - **[`Monitor`]**: scheduler-facing facade. Each
//!   [`update()`](Monitor::update) tick lets the [`ReconnectSupervisor`]
//!   decide whether to rebuild the [`Session`], applies exponential backoff,
//!   and returns a [`Snapshot`]. [`Monitor::oneshot()`] serves single CLI
//!   invocations.
//!
//! - **[`Session`]**: one live connection. HTTP mode polls `/status`;
//!   WebSocket mode authenticates, drains the config burst, then runs a
//!   receive task and a poll task under a cancellation token, plus the
//!   hybrid `/status` fetch for fields the socket never sends.
//!
//! - **[`StatusStore`]**: owns the [`Status`] and publishes a value copy
//!   after each merge through a `watch` channel and [`StatusObserver`]s.
//!
//! - **Domain model** ([`model`]): `Status`, channels, GPS, system stats,
//!   reporter identity and device config. WebSocket-only sections are
//!   `None` in HTTP mode.

pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod monitor;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod supervisor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    BackoffPolicy, CHANNEL_SLOTS, DEFAULT_PORT, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL,
    ModePreference, MonitorConfig, SATELLITE_SLOTS, Timeouts, clamp_poll_interval,
};
pub use error::CoreError;
pub use monitor::Monitor;
pub use session::{Session, SessionState};
pub use snapshot::{Snapshot, SnapshotOptions};
pub use store::{ObserverError, StatusObserver, StatusStore};
pub use supervisor::ReconnectSupervisor;

pub use model::{
    Channel, ChannelActivity, ChannelKind, ChannelSummary, ConnectionMode, DeviceConfig,
    GpsReceiver, GpsStatus, MacAddress, MacSource, ReporterConfig, Satellite, SatelliteSummary,
    SnrReading, Status, SystemStats,
};

pub use web888_api::DrainConfig;
