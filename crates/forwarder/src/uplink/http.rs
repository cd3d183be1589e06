//! HttpUplink - one POST per frame to the ingestion server

use std::time::Duration;

use contracts::{Uplink, UplinkConfig, UplinkError, Vin};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

/// Marks the body as a predictor-compressed sparse frame
pub const COMPRESSED_HEADER: &str = "X-Compressed";

/// Identifies the sending vehicle
pub const VIN_HEADER: &str = "X-Vehicle-VIN";

const NAME: &str = "http";

/// Uplink over plain HTTP
///
/// Stateless apart from the pooled client; every failure mode (connect, DNS,
/// timeout, non-2xx) collapses into one `UplinkError`.
pub struct HttpUplink {
    http: reqwest::Client,
    url: String,
    vin: Vin,
    timeout: Duration,
}

impl HttpUplink {
    /// Build from the uplink section of the agent config
    pub fn new(config: &UplinkConfig, vin: Vin) -> Result<Self, UplinkError> {
        Self::with_url(config.endpoint_url(), vin, config.timeout())
    }

    pub fn with_url(
        url: impl Into<String>,
        vin: Vin,
        timeout: Duration,
    ) -> Result<Self, UplinkError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| UplinkError::new(NAME, format!("client setup: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
            vin,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Uplink for HttpUplink {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(
        level = "debug",
        name = "http_uplink_post",
        skip(self, payload),
        fields(vin = %self.vin, bytes = payload.len())
    )]
    async fn post(&self, payload: &[u8]) -> Result<(), UplinkError> {
        let request = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, codec::CONTENT_TYPE)
            .header(COMPRESSED_HEADER, "true")
            .header(VIN_HEADER, self.vin.as_str())
            .body(payload.to_vec())
            .send();

        // The client timeout covers the request; this guard also bounds
        // anything the client does outside it.
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| UplinkError::new(NAME, format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| UplinkError::new(NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UplinkError::new(NAME, format!("server returned {status}")));
        }

        debug!(status = %status, "Frame accepted");
        Ok(())
    }
}
