//! Configuration management for the shopping list.
//!
//! Loads configuration from environment variables with sensible defaults.

use basket_runtime::StoreConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the database file
pub const DATABASE_PATH_VAR: &str = "BASKET_DATABASE_PATH";
/// Environment variable naming the passphrase file
pub const SECRET_PATH_VAR: &str = "BASKET_SECRET_PATH";
/// Environment variable holding the log filter
pub const LOG_VAR: &str = "BASKET_LOG";
/// Environment variable holding the shutdown timeout in seconds
pub const SHUTDOWN_TIMEOUT_VAR: &str = "BASKET_SHUTDOWN_TIMEOUT_SECS";

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held an unusable value.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// A path setting is empty.
    #[error("{0} must not be empty")]
    EmptyPath(&'static str),

    /// The action broadcast buffer has no room.
    #[error("broadcast_capacity must be at least 1")]
    ZeroCapacity,

    /// A `.env` file exists but could not be read or parsed.
    #[error("Invalid env file {path}: {reason}")]
    EnvFile {
        /// File that failed
        path: String,
        /// What went wrong
        reason: String,
    },
}

/// Shopping list configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoppingConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// File holding the database passphrase
    pub secret_path: PathBuf,
    /// `tracing` filter directive (trace, debug, info, warn, error)
    pub log_filter: String,
    /// Produced actions buffered for slow observers
    pub broadcast_capacity: usize,
    /// How long shutdown waits for in-flight mutations
    pub shutdown_timeout: Duration,
}

impl Default for ShoppingConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("basket.db"),
            secret_path: PathBuf::from("basket.secret"),
            log_filter: "info".to_string(),
            broadcast_capacity: 16,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ShoppingConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the shutdown timeout is not a
    /// whole number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from environment variables, falling back to the
    /// `KEY=value` pairs of a dotenv file.
    ///
    /// Variables already set in the process win over the file. A missing
    /// file is not an error.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EnvFile`] if the file exists but cannot be parsed
    /// - [`ConfigError::InvalidValue`] as for [`from_env`](Self::from_env)
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let env_file_error = |reason: String| ConfigError::EnvFile {
            path: path.display().to_string(),
            reason,
        };

        let file_vars: HashMap<String, String> = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter
                .collect::<Result<_, _>>()
                .map_err(|e| env_file_error(e.to_string()))?,
            Err(e) if e.not_found() => HashMap::new(),
            Err(e) => return Err(env_file_error(e.to_string())),
        };

        Self::from_lookup(|key| env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(DATABASE_PATH_VAR) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(SECRET_PATH_VAR) {
            config.secret_path = PathBuf::from(path);
        }
        if let Some(filter) = lookup(LOG_VAR) {
            config.log_filter = filter;
        }
        if let Some(secs) = lookup(SHUTDOWN_TIMEOUT_VAR) {
            let parsed = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: SHUTDOWN_TIMEOUT_VAR,
                value: secs.clone(),
            })?;
            config.shutdown_timeout = Duration::from_secs(parsed);
        }

        Ok(config)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyPath`] if either path is empty
    /// - [`ConfigError::ZeroCapacity`] if the broadcast capacity is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("database_path"));
        }
        if self.secret_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("secret_path"));
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Set the database file
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Set the passphrase file
    #[must_use]
    pub fn with_secret_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secret_path = path.into();
        self
    }

    /// Set the log filter
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Runtime settings derived from this configuration
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_broadcast_capacity(self.broadcast_capacity)
            .with_shutdown_timeout(self.shutdown_timeout)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ShoppingConfig::default();
        assert_eq!(config.database_path, PathBuf::from("basket.db"));
        assert_eq!(config.secret_path, PathBuf::from("basket.secret"));
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.broadcast_capacity, 16);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let config = ShoppingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ShoppingConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = ShoppingConfig::from_lookup(lookup(&[
            (DATABASE_PATH_VAR, "/tmp/list.db"),
            (SECRET_PATH_VAR, "/tmp/list.secret"),
            (LOG_VAR, "debug"),
            (SHUTDOWN_TIMEOUT_VAR, " 12 "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/list.db"));
        assert_eq!(config.secret_path, PathBuf::from("/tmp/list.secret"));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(12));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let result = ShoppingConfig::from_lookup(lookup(&[(SHUTDOWN_TIMEOUT_VAR, "soon")]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                key: SHUTDOWN_TIMEOUT_VAR,
                value: "soon".to_string(),
            })
        );
    }

    fn scratch_env(label: &str, contents: &str) -> PathBuf {
        let suffix: u64 = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
            .try_into()
            .unwrap();
        let path = env::temp_dir().join(format!("basket-{label}-{suffix}.env"));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn env_file_fills_unset_variables() {
        let path = scratch_env(
            "fills",
            "BASKET_DATABASE_PATH=/srv/list.db\nBASKET_SHUTDOWN_TIMEOUT_SECS=9\n",
        );

        let config = ShoppingConfig::from_env_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/srv/list.db"));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(9));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn missing_env_file_keeps_defaults() {
        let path = env::temp_dir().join("basket-no-such-file.env");
        let config = ShoppingConfig::from_env_file(&path).unwrap();
        assert_eq!(config, ShoppingConfig::default());
    }

    #[test]
    fn malformed_env_file_is_rejected() {
        let path = scratch_env("malformed", "BASKET_LOG='unterminated\n");

        let result = ShoppingConfig::from_env_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(ConfigError::EnvFile { .. })));
    }

    #[test]
    fn validate_rejects_empty_paths_and_zero_capacity() {
        let config = ShoppingConfig::default().with_database_path("");
        assert_eq!(config.validate(), Err(ConfigError::EmptyPath("database_path")));

        let config = ShoppingConfig::default().with_secret_path("");
        assert_eq!(config.validate(), Err(ConfigError::EmptyPath("secret_path")));

        let config = ShoppingConfig::default().with_broadcast_capacity(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn builders_override_defaults() {
        let config = ShoppingConfig::default()
            .with_database_path("/var/lib/basket/list.db")
            .with_secret_path("/var/lib/basket/list.secret")
            .with_log_filter("basket_sqlite=debug");

        assert_eq!(config.database_path, PathBuf::from("/var/lib/basket/list.db"));
        assert_eq!(config.secret_path, PathBuf::from("/var/lib/basket/list.secret"));
        assert_eq!(config.log_filter, "basket_sqlite=debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn store_config_carries_runtime_settings() {
        let store = ShoppingConfig::default()
            .with_broadcast_capacity(4)
            .with_shutdown_timeout(Duration::from_millis(250))
            .store_config();
        assert_eq!(store.broadcast_capacity, 4);
        assert_eq!(store.shutdown_timeout, Duration::from_millis(250));
    }
}
