// Frame parser for the admin WebSocket.
//
// A frame is `MSG <tag>=<value>`. Frames without the prefix are ignored.
// The parser is total: malformed payloads become `Err(Deserialization)`
// which callers log and drop, never a panic.

use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;

use super::models::{
    AdminConfig, GeneralConfig, Identity, PositionUpdate, SatelliteUpdate, StatsBlock, UserEntry,
};
use crate::error::Error;

pub const FRAME_PREFIX: &str = "MSG ";

/// One decoded admin frame.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminMessage {
    /// `user_cb`: full channel list.
    Users(Vec<UserEntry>),
    /// `stats_cb`
    Stats(Box<StatsBlock>),
    /// `gps_update_cb`: per-satellite detail.
    Satellites(SatelliteUpdate),
    /// `gps_POS_data_cb`
    Position(PositionUpdate),
    /// `load_cfg` or `cfg`
    Config(Box<GeneralConfig>),
    /// `load_adm`
    Admin(Box<AdminConfig>),
    /// `config_cb`
    Identity(Identity),
    /// `badp`: `Some(0)` means the password was accepted.
    AuthResult { code: Option<i64> },
    /// `cfg_loaded`: the device finished pushing its config.
    ConfigLoaded,
    /// Any other tag.
    Other { tag: String },
}

impl AdminMessage {
    pub fn tag(&self) -> &str {
        match self {
            Self::Users(_) => "user_cb",
            Self::Stats(_) => "stats_cb",
            Self::Satellites(_) => "gps_update_cb",
            Self::Position(_) => "gps_POS_data_cb",
            Self::Config(_) => "load_cfg",
            Self::Admin(_) => "load_adm",
            Self::Identity(_) => "config_cb",
            Self::AuthResult { .. } => "badp",
            Self::ConfigLoaded => "cfg_loaded",
            Self::Other { tag } => tag,
        }
    }
}

/// Percent-decode a payload (`%20` → space; `+` is left alone).
pub fn percent_decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Parse one raw frame (text or binary).
///
/// Returns `Ok(None)` for frames that are not `MSG` frames.
pub fn parse_frame(data: &[u8]) -> Result<Option<AdminMessage>, Error> {
    let text = String::from_utf8_lossy(data);
    let Some(content) = text.strip_prefix(FRAME_PREFIX) else {
        return Ok(None);
    };

    let (tag, value) = match content.split_once('=') {
        Some((tag, value)) => (tag.trim(), value.trim()),
        None => (content.trim(), ""),
    };

    let message = match tag {
        "user_cb" => {
            let mut users: Vec<UserEntry> = decode_json(tag, value)?;
            for user in &mut users {
                user.name = user.name.take().map(|n| percent_decode(&n));
                user.activity = user.activity.take().map(|g| percent_decode(&g));
            }
            AdminMessage::Users(users)
        }
        "stats_cb" => AdminMessage::Stats(Box::new(decode_json(tag, value)?)),
        "gps_update_cb" => AdminMessage::Satellites(decode_json(tag, &percent_decode(value))?),
        "gps_POS_data_cb" => AdminMessage::Position(decode_json(tag, &percent_decode(value))?),
        "load_cfg" | "cfg" => {
            AdminMessage::Config(Box::new(decode_json(tag, &percent_decode(value))?))
        }
        "load_adm" => AdminMessage::Admin(Box::new(decode_json(tag, &percent_decode(value))?)),
        "config_cb" => AdminMessage::Identity(decode_json(tag, &percent_decode(value))?),
        "badp" => AdminMessage::AuthResult {
            code: value
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok()),
        },
        "cfg_loaded" => AdminMessage::ConfigLoaded,
        other => AdminMessage::Other {
            tag: other.to_owned(),
        },
    };

    Ok(Some(message))
}

fn decode_json<T: DeserializeOwned>(context: &str, payload: &str) -> Result<T, Error> {
    serde_json::from_str(payload).map_err(|e| Error::deserialization(context, e, payload))
}
