//! HTTP client for the remote reader gateway.
//!
//! # Responsibilities
//! - Issue one GET per command with the command's query parameters
//! - Attach the authentication header to every call
//! - Enforce connect and request timeouts
//! - Reduce the response body to its first meaningful line
//!
//! # Design Decisions
//! - Failures never escape [`GatewayClient::call`]; they are logged and become `None`
//! - Any completed response is scanned, whatever its status; a non-success status
//!   is only logged
//! - No retries: a failed call degrades only that command

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::observability::metrics;

/// Body line meaning "no data".
pub const NULL_LINE: &str = "null";

/// Errors raised while building or using the gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Gateway URL did not parse.
    #[error("invalid gateway URL: {0}")]
    Url(#[from] url::ParseError),

    /// Auth header name or value is not valid HTTP.
    #[error("invalid auth header: {0}")]
    Header(String),

    /// HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(reqwest::Error),

    /// Connection, TLS, timeout or body read failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Client for the reader gateway, shared by every session.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    url: Url,
}

impl GatewayClient {
    /// Build a client from configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let url = Url::parse(&config.url)?;

        let name = HeaderName::from_bytes(config.auth_header_name.as_bytes())
            .map_err(|e| GatewayError::Header(e.to_string()))?;
        let mut value = HeaderValue::from_str(&config.auth_header_value)
            .map_err(|e| GatewayError::Header(e.to_string()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .no_proxy()
            .build()
            .map_err(GatewayError::Build)?;

        Ok(Self { http, url })
    }

    /// Send one GET with `query` and return the first meaningful body line.
    ///
    /// Returns `None` on any failure and when the body carries no data.
    pub async fn call(&self, query: &[(&str, &str)]) -> Option<String> {
        let start = Instant::now();
        tracing::debug!(url = %self.url, ?query, "Sending gateway request");

        match self.request(query).await {
            Ok(Some(line)) => {
                metrics::record_gateway_request("ok", start);
                Some(line)
            }
            Ok(None) => {
                tracing::debug!("Gateway returned no data");
                metrics::record_gateway_request("empty", start);
                None
            }
            Err(e) => {
                let timeout = matches!(&e, GatewayError::Request(inner) if inner.is_timeout());
                tracing::warn!(
                    url = %self.url,
                    error = %e,
                    timeout,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Gateway request failed"
                );
                metrics::record_gateway_request(if timeout { "timeout" } else { "error" }, start);
                None
            }
        }
    }

    async fn request(&self, query: &[(&str, &str)]) -> Result<Option<String>, GatewayError> {
        let response = self.http.get(self.url.clone()).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %self.url, %status, "Gateway answered with non-success status");
        }

        let body = response.text().await?;
        tracing::debug!(%status, body = %body.trim_end(), "Gateway response received");
        Ok(first_meaningful_line(&body).map(str::to_owned))
    }
}

/// First line that is neither empty nor exactly the `null` marker.
///
/// Only the line terminator (`\n` or `\r\n`) is removed; other whitespace is kept.
pub fn first_meaningful_line(body: &str) -> Option<&str> {
    body.lines().find(|line| !line.is_empty() && *line != NULL_LINE)
}
