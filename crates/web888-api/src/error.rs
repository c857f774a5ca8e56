use thiserror::Error;

/// Top-level error type for the `web888-api` crate.
///
/// Covers every failure mode across both device surfaces: the plaintext
/// `/status` page and the admin WebSocket. `web888-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device rejected the admin password (`badp` with a non-zero code),
    /// or never acknowledged the auth command at all.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The status page answered with something other than 200.
    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An operation exceeded its time budget.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed while the handshake still needed it.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// Sending or receiving on an established socket failed.
    #[error("WebSocket I/O error: {0}")]
    WebSocketIo(String),

    // ── Data ────────────────────────────────────────────────────────
    /// A message payload could not be decoded, with the raw body for debugging.
    #[error("Deserialization error in {context}: {message}")]
    Deserialization {
        context: String,
        message: String,
        body: String,
    },
}

impl Error {
    /// Returns `true` if the device refused our credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. }
            | Self::WebSocketConnect(_)
            | Self::WebSocketClosed { .. }
            | Self::WebSocketIo(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the error is a timeout of any kind.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn deserialization(context: &str, message: impl ToString, body: &str) -> Self {
        // Config frames can be tens of kilobytes; keep the head for logs.
        let body = body.chars().take(512).collect();
        Self::Deserialization {
            context: context.to_owned(),
            message: message.to_string(),
            body,
        }
    }
}
