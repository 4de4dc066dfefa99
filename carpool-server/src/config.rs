//! Server configuration, read from the environment.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::storage::{StorageKind, UnknownStorageKind};

/// Errors from reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid HOST {0:?}: expected an IP address")]
    InvalidHost(String),

    #[error("invalid PORT {0:?}: expected 0-65535")]
    InvalidPort(String),

    #[error("invalid LOG_FORMAT {0:?}: expected \"pretty\" or \"json\"")]
    InvalidLogFormat(String),

    #[error(transparent)]
    Storage(#[from] UnknownStorageKind),
}

/// How log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Configuration for the car pool server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: IpAddr,

    /// Port to bind.
    pub port: u16,

    /// Storage backend.
    pub storage: StorageKind,

    /// Log output format.
    pub log_format: LogFormat,

    /// `tracing` filter directive, e.g. `info` or `carpool_server=debug`.
    pub log_filter: String,
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    ///
    /// `HOST`, `PORT`, `STORAGE_TYPE`, `LOG_FORMAT` and `RUST_LOG`; anything
    /// unset keeps its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host
                .parse()
                .map_err(|_| ConfigError::InvalidHost(host.clone()))?;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        if let Some(storage) = lookup("STORAGE_TYPE") {
            config.storage = storage.parse()?;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.log_format = format.parse()?;
        }
        if let Some(filter) = lookup("RUST_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }

    /// The address to listen on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            storage: StorageKind::Memory,
            log_format: LogFormat::Pretty,
            log_filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn overrides_from_environment() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9091"),
            ("STORAGE_TYPE", "memory"),
            ("LOG_FORMAT", "json"),
            ("RUST_LOG", "carpool_server=debug"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9091");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_filter, "carpool_server=debug");
    }

    #[test]
    fn rejects_bad_values() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort("eighty".into()));

        let err = ServerConfig::from_lookup(lookup(&[("HOST", "localhost")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidHost("localhost".into()));

        let err = ServerConfig::from_lookup(lookup(&[("STORAGE_TYPE", "sql")])).unwrap_err();
        assert_eq!(err.to_string(), "unknown storage backend: sql");

        let err = ServerConfig::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogFormat(_)));
    }
}
