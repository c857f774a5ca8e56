use secrecy::{ExposeSecret, SecretString};

/// Text command sent to the admin socket as `SET <verb> [args]`.
#[derive(Debug, Clone)]
pub enum AdminCommand {
    /// `SET auth t=admin p=<password>`
    Auth { password: SecretString },
    /// `SET GET_CONFIG`, answered by a `config_cb` identity frame.
    GetConfig,
    /// `SET STATS_UPD ch=<n>`
    StatsUpdate { channel: u8 },
    /// `SET GET_USERS`
    GetUsers,
    /// `SET gps_update`
    GpsUpdate,
}

impl AdminCommand {
    /// Verb only, safe for logs.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::GetConfig => "GET_CONFIG",
            Self::StatsUpdate { .. } => "STATS_UPD",
            Self::GetUsers => "GET_USERS",
            Self::GpsUpdate => "gps_update",
        }
    }

    /// Full wire text. Contains the password for `Auth`; never log it.
    pub(crate) fn to_wire(&self) -> String {
        match self {
            Self::Auth { password } => {
                format!("SET auth t=admin p={}", password.expose_secret())
            }
            Self::StatsUpdate { channel } => format!("SET STATS_UPD ch={channel}"),
            other => format!("SET {}", other.verb()),
        }
    }
}
