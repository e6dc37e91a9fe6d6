//! Client side of the upstream data service.
//!
//! Every fanned-out call goes through the [`Upstream`] trait. The production
//! implementation is [`HttpUpstream`], which issues one `GET` against the
//! configured URL per call and returns the raw body of a 2xx response.
//! Interpreting that body is left to [`crate::extract`].

use crate::config::UpstreamConfig;
use async_trait::async_trait;
use http::StatusCode;
use hyper::body::Bytes;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Errors raised by a single upstream read
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(StatusCode),

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("invalid JSON body: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A read-only data source that can be called concurrently.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Performs one read and returns the body of a successful response.
    async fn fetch(&self) -> Result<Bytes, UpstreamError>;
}

#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    url: Url,
    timeout_duration: Duration,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout_duration: Duration::from_secs(config.http_timeout_secs),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send(&self) -> Result<Bytes, UpstreamError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        response.bytes().await.map_err(UpstreamError::Body)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self) -> Result<Bytes, UpstreamError> {
        // The timeout covers connecting, headers and the complete body
        timeout(self.timeout_duration, self.send())
            .await
            .map_err(|_| UpstreamError::Timeout {
                url: self.url.to_string(),
                timeout_secs: self.timeout_duration.as_secs(),
            })?
    }
}
