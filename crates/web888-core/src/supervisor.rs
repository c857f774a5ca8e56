// ── Reconnect supervisor ──
//
// Pure policy: counts consecutive failures, decides when a session must be
// rebuilt and how long to wait first, and latches authentication
// rejections so a bad credential is not retried. The monitor does the I/O.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::BackoffPolicy;
use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct ReconnectSupervisor {
    policy: BackoffPolicy,
    failures: u32,
    connected: bool,
    ever_connected: bool,
    auth_rejection: Option<String>,
}

impl ReconnectSupervisor {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            failures: 0,
            connected: false,
            ever_connected: false,
            auth_rejection: None,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Compare our view with the session's live flag at the start of a
    /// tick. Returns `true` if the transport dropped since the last tick;
    /// that counts as a failure.
    pub fn observe(&mut self, session_connected: bool) -> bool {
        if !self.connected || session_connected {
            return false;
        }
        self.connected = false;
        self.failures = self.failures.saturating_add(1);
        if self.failures == 1 {
            warn!("device disconnected, will reconnect with backoff");
        } else {
            debug!(attempt = self.failures, "device still disconnected");
        }
        true
    }

    pub fn needs_connect(&self) -> bool {
        !self.connected
    }

    /// Wait before the next attempt; zero before any failure.
    pub fn backoff(&self) -> Duration {
        self.policy.delay(self.failures)
    }

    /// Fails fast while a rejected credential is still installed.
    pub fn check_credentials(&self) -> Result<(), CoreError> {
        match &self.auth_rejection {
            Some(message) => Err(CoreError::AuthenticationFailed {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn record_success(&mut self, address: &str) {
        if self.failures > 0 {
            info!(
                address,
                attempts = self.failures,
                "reconnected to Web-888"
            );
        } else if self.ever_connected {
            info!(address, "reconnected to Web-888");
        } else {
            info!(address, "connected to Web-888");
        }
        self.failures = 0;
        self.connected = true;
        self.ever_connected = true;
    }

    pub fn record_failure(&mut self, err: &CoreError) {
        self.connected = false;
        self.failures = self.failures.saturating_add(1);
        if let CoreError::AuthenticationFailed { message } = err {
            error!(error = %err, "authentication rejected, not retrying this password");
            self.auth_rejection = Some(message.clone());
        } else {
            warn!(error = %err, attempt = self.failures, "connect attempt failed");
        }
    }

    /// A new credential was installed: clear the latch and start over.
    pub fn reset_credentials(&mut self) {
        self.auth_rejection = None;
        self.failures = 0;
        self.connected = false;
    }

    /// The session was closed on purpose.
    pub fn mark_closed(&mut self) {
        self.connected = false;
    }
}
