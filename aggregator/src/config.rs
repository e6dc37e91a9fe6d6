use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvalidConfig {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Upstream http_timeout_secs cannot be 0")]
    ZeroTimeout,

    #[error("Upstream URL must use http or https, got {0}")]
    UnsupportedScheme(String),
}

/// Gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener serving the aggregation endpoints
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// The data service every fanned-out call is sent to
    pub upstream: UpstreamConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.upstream.validate()
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.port == 0 {
            return Err(InvalidConfig::InvalidPort);
        }
        Ok(())
    }
}

fn default_http_timeout_secs() -> u64 {
    30
}

/// Upstream data service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// Full URL of the read endpoint, e.g. `http://localhost:3001/data`
    pub url: Url,
    /// Applies to each call separately, connect through body collection.
    /// A call that exceeds it settles as a failure.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.http_timeout_secs == 0 {
            return Err(InvalidConfig::ZeroTimeout);
        }
        match self.url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(InvalidConfig::UnsupportedScheme(other.to_string())),
        }
    }
}
