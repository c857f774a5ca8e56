//! Async client for the two status surfaces of a Web-888 / KiwiSDR receiver.
//!
//! - [`status`]: the unauthenticated plaintext `/status` page
//!   (`key=value` per line), fetched over a pooled `reqwest` client.
//! - [`admin`]: the authenticated admin WebSocket
//!   (`ws://host:port/kiwi/{nonce}/admin`), carrying `MSG tag=value` frames
//!   with stats, channel activity, GPS satellites and device config.
//!
//! Both parsers are total: malformed input is reported per line or per
//! frame and never aborts the surrounding parse.

pub mod admin;
pub mod error;
pub mod status;
pub mod transport;

pub use admin::{
    AdminCommand, AdminMessage, AdminReader, AdminSocket, AdminWriter, DrainConfig, DrainOutcome,
    parse_frame,
};
pub use error::Error;
pub use status::{StatusClient, StatusReport};
pub use transport::{DEFAULT_PORT, DeviceAddress, TransportConfig, connection_nonce};
