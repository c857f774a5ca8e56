// Shared transport configuration for building the pooled reqwest::Client.
//
// The status client and the hybrid fetch issued from a WebSocket session
// share one client so keep-alive connections are reused across polls.

use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Default port of the Web-888 web server (both HTTP and WebSocket).
pub const DEFAULT_PORT: u16 = 8073;

/// Per-request cap for the `/status` endpoint.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            connect_timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: concat!("web888-monitor/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .pool_max_idle_per_host(1)
            .build()
            .map_err(Error::Transport)
    }
}

/// Address of one device: host plus port.
///
/// Builds the two endpoint URLs the device exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    host: String,
    port: u16,
}

impl DeviceAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `http://host:port/`
    pub fn base_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!("http://{}:{}/", self.host, self.port))?)
    }

    /// `http://host:port/status`
    pub fn status_url(&self) -> Result<Url, Error> {
        Ok(self.base_url()?.join("status")?)
    }

    /// `ws://host:port/kiwi/{nonce}/admin`
    ///
    /// The nonce must differ per connection or the device may hand the new
    /// socket an existing session.
    pub fn admin_url(&self, nonce: u64) -> Result<Url, Error> {
        Ok(Url::parse(&format!(
            "ws://{}:{}/kiwi/{nonce}/admin",
            self.host, self.port
        ))?)
    }
}

impl std::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Fresh per-connection nonce derived from the current time (microseconds).
pub fn connection_nonce() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_micros()).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoint_urls() {
        let addr = DeviceAddress::new("10.1.1.197", DEFAULT_PORT);
        assert_eq!(
            addr.status_url().unwrap().as_str(),
            "http://10.1.1.197:8073/status"
        );
        assert_eq!(
            addr.admin_url(1_700_000_000_000_000).unwrap().as_str(),
            "ws://10.1.1.197:8073/kiwi/1700000000000000/admin"
        );
        assert_eq!(addr.to_string(), "10.1.1.197:8073");
    }

    #[test]
    fn nonces_increase() {
        let a = connection_nonce();
        std::thread::sleep(Duration::from_millis(2));
        let b = connection_nonce();
        assert!(b > a);
    }

    #[test]
    fn invalid_host_is_rejected() {
        let addr = DeviceAddress::new("bad host", 80);
        assert!(matches!(addr.status_url(), Err(Error::InvalidUrl(_))));
    }
}
