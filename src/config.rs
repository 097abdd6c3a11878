//! Backend and logging configuration
//!
//! Defaults can be overridden from the environment:
//! - `TABLEXPR_DEFAULT_LIMIT`: row cap for `execute` (`none` disables it)
//! - `TABLEXPR_DATABASE_NAME`: alias of the database opened by `connect`
//! - `TABLEXPR_SYNC_ON_WRITE`: fsync file images after each mutation
//! - `TABLEXPR_LOG_LEVEL`: filter used by [`init_tracing`]

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings shared by every backend connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Row cap applied to row-producing queries without an explicit limit
    pub default_limit: Option<u64>,

    /// Alias the connected resource is mounted under
    pub database_name: String,

    /// Sync on write (fsync)
    pub sync_on_write: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            default_limit: Some(10_000),
            database_name: "base".to_string(),
            sync_on_write: false,
        }
    }
}

impl BackendConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, then validate
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(limit) = lookup("TABLEXPR_DEFAULT_LIMIT") {
            config.default_limit = match limit.trim().to_lowercase().as_str() {
                "" | "none" | "off" => None,
                n => Some(n.parse().map_err(|_| {
                    Error::ConfigError(format!("Invalid TABLEXPR_DEFAULT_LIMIT: {}", limit))
                })?),
            };
        }
        if let Some(name) = lookup("TABLEXPR_DATABASE_NAME") {
            config.database_name = name;
        }
        if let Some(sync) = lookup("TABLEXPR_SYNC_ON_WRITE") {
            config.sync_on_write = sync
                .trim()
                .parse()
                .map_err(|_| Error::ConfigError("Invalid TABLEXPR_SYNC_ON_WRITE".to_string()))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_default_limit(mut self, limit: Option<u64>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == Some(0) {
            return Err(Error::ConfigError(
                "default_limit must be positive; use None to disable it".to_string(),
            ));
        }

        let name = &self.database_name;
        let plain = name
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !plain {
            return Err(Error::ConfigError(format!(
                "Invalid database name: {:?}",
                name
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("TABLEXPR_LOG_LEVEL") {
            config.level = level.trim().to_lowercase();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(Error::ConfigError(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }
}

/// Install a global `tracing` subscriber filtered at `config.level`.
///
/// `RUST_LOG` directives take precedence when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    config.validate()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| Error::ConfigError(format!("Failed to install subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BackendConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BackendConfig::default());
        assert_eq!(config.default_limit, Some(10_000));
        assert_eq!(config.database_name, "base");
    }

    #[test]
    fn test_env_overrides() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("TABLEXPR_DEFAULT_LIMIT", "none"),
            ("TABLEXPR_DATABASE_NAME", "main"),
            ("TABLEXPR_SYNC_ON_WRITE", "true"),
        ]))
        .unwrap();
        assert_eq!(config.default_limit, None);
        assert_eq!(config.database_name, "main");
        assert!(config.sync_on_write);

        let config =
            BackendConfig::from_lookup(lookup(&[("TABLEXPR_DEFAULT_LIMIT", "50")])).unwrap();
        assert_eq!(config.default_limit, Some(50));
    }

    #[test]
    fn test_validation() {
        assert!(BackendConfig::from_lookup(lookup(&[("TABLEXPR_DEFAULT_LIMIT", "many")])).is_err());
        assert!(BackendConfig::from_lookup(lookup(&[("TABLEXPR_SYNC_ON_WRITE", "maybe")])).is_err());
        assert!(BackendConfig::default().with_default_limit(Some(0)).validate().is_err());
        assert!(BackendConfig::default().with_database_name("my db").validate().is_err());

        let logging = LoggingConfig {
            level: "loud".to_string(),
        };
        assert!(logging.validate().is_err());
        assert!(LoggingConfig::default().validate().is_ok());
    }
}
