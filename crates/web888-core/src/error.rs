// ── Core error types ──
//
// User-facing errors from web888-core. Consumers never see reqwest or
// tungstenite errors directly; `From<web888_api::Error>` folds them into
// the handful of outcomes an update tick can have.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Web-888 at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Web-888 disconnected")]
    Disconnected,

    #[error("Web-888 connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<web888_api::Error> for CoreError {
    fn from(err: web888_api::Error) -> Self {
        match err {
            web888_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            web888_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::ConnectionFailed {
                        address: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            web888_api::Error::HttpStatus { status, url } => CoreError::ConnectionFailed {
                address: url,
                reason: format!("HTTP status {status}"),
            },
            web888_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            web888_api::Error::Timeout { timeout_ms, .. } => CoreError::Timeout {
                timeout_secs: timeout_ms.div_ceil(1000),
            },
            web888_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                address: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            web888_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                address: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            web888_api::Error::WebSocketIo(reason) => CoreError::ConnectionFailed {
                address: String::new(),
                reason: format!("WebSocket I/O error: {reason}"),
            },
            web888_api::Error::Deserialization {
                context, message, ..
            } => CoreError::Internal(format!("Deserialization error in {context}: {message}")),
        }
    }
}
