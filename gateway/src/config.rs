use aggregator::config::{Config as GatewayConfig, InvalidConfig};
use serde::Deserialize;
use std::fs::File;

fn default_prefix() -> String {
    "gateway".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            json: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.gateway.validate()?;

        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] InvalidConfig),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                level: debug
                json: true
                sentry_dsn: https://public@sentry.example.com/1
            gateway:
                listener:
                    host: 0.0.0.0
                    port: 3000
                admin_listener:
                    host: 127.0.0.1
                    port: 3002
                upstream:
                    url: http://localhost:3001/data
                    http_timeout_secs: 10
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(metrics.prefix, "gateway");

        assert_eq!(config.common.logging.level, "debug");
        assert!(config.common.logging.json);
        assert_eq!(
            config.common.logging.sentry_dsn.as_deref(),
            Some("https://public@sentry.example.com/1")
        );

        assert_eq!(config.gateway.listener.port, 3000);
        assert_eq!(config.gateway.upstream.http_timeout_secs, 10);
        assert_eq!(
            config.gateway.upstream.url.as_str(),
            "http://localhost:3001/data"
        );
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let yaml = r#"
            gateway:
                listener: {host: 0.0.0.0, port: 3000}
                admin_listener: {host: 127.0.0.1, port: 3002}
                upstream: {url: "http://localhost:3001/data"}
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert!(config.common.metrics.is_none());
        assert_eq!(config.common.logging, LoggingConfig::default());
        assert_eq!(config.gateway.upstream.http_timeout_secs, 30);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let yaml = r#"
            gateway:
                listener: {host: 0.0.0.0, port: 0}
                admin_listener: {host: 127.0.0.1, port: 3002}
                upstream: {url: "http://localhost:3001/data"}
            "#;
        let tmp = write_tmp_file(yaml);

        assert!(matches!(
            Config::from_file(tmp.path()).unwrap_err(),
            ConfigError::InvalidConfig(InvalidConfig::InvalidPort)
        ));
    }

    #[test]
    fn example_config_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("gateway.example.yaml");
        let config = Config::from_file(&path).expect("load example config");

        assert!(config.common.metrics.is_none());
        assert_eq!(config.gateway.admin_listener.port, 3002);
    }

    #[test]
    fn missing_file() {
        let err = Config::from_file(std::path::Path::new("/nonexistent/gateway.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
