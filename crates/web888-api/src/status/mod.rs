// HTTP client for the plaintext `/status` page.
//
// No authentication; one GET per poll over a pooled connection.

mod report;

pub use report::{
    FieldIssue, FieldValue, GpsCoordinates, StatusReport, coerce_coordinates, coerce_flag,
    coerce_float, coerce_int,
};

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{DeviceAddress, TransportConfig};

/// Fetches and parses the device's `/status` page.
#[derive(Debug, Clone)]
pub struct StatusClient {
    http: reqwest::Client,
    url: Url,
}

impl StatusClient {
    /// Build a client with its own pooled `reqwest::Client`.
    pub fn new(address: &DeviceAddress, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            url: address.status_url()?,
        })
    }

    /// Wrap an existing `reqwest::Client` so connections are shared.
    pub fn with_client(http: reqwest::Client, address: &DeviceAddress) -> Result<Self, Error> {
        Ok(Self {
            http,
            url: address.status_url()?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Raw body of `/status`.
    pub async fn fetch_raw(&self) -> Result<String, Error> {
        debug!("GET {}", self.url);

        let resp = self.http.get(self.url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        Ok(resp.text().await?)
    }

    /// Fetch and parse `/status`.
    pub async fn fetch(&self) -> Result<StatusReport, Error> {
        let body = self.fetch_raw().await?;
        let report = StatusReport::parse(&body);
        debug!(
            issues = report.issues.len(),
            unrecognized = report.unrecognized,
            "parsed status page"
        );
        Ok(report)
    }
}
