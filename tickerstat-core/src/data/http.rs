//! `reqwest` blocking implementation of `HttpTransport`.

use super::source::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::NetworkError;
use std::time::Duration;
use tracing::debug;

/// Blocking HTTP client shared by every source.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, NetworkError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tickerstat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::Unreachable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        let mut builder = self.client.get(&request.url).query(&request.query);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let resp = builder
            .send()
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;
        let status = resp.status().as_u16();
        debug!(url = %request.url, status, "HTTP response");

        let body = resp
            .text()
            .map_err(|e| NetworkError::Unreachable(format!("failed to read body: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}
