//! Server settings loaded from `airfleet.toml` and `AIRFLEET_*` variables

use airfleet_core::CacheFailureMode;
use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Optional settings file, looked up in the working directory
pub const CONFIG_FILE: &str = "airfleet";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    /// Whole-request budget for store and cache calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_database_path")]
    pub database_path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub backend: CacheBackend,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default)]
    pub failure_mode: CacheFailureMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_database_path() -> String {
    "data/airfleet.db".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_path: default_database_path(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: default_redis_url(),
            failure_mode: CacheFailureMode::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            store: StoreSettings::default(),
            cache: CacheSettings::default(),
            request_timeout_secs: default_request_timeout_secs(),
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Load from the optional settings file, then the environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("AIRFLEET")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Settings {
        ConfigBuilder::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.bind_address, "0.0.0.0:8080");
        assert_eq!(settings.store.backend, StoreBackend::Sqlite);
        assert_eq!(settings.cache.backend, CacheBackend::Memory);
        assert_eq!(settings.cache.failure_mode, CacheFailureMode::Surface);
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = parse("");
        assert_eq!(settings.store.database_path, "data/airfleet.db");
        assert_eq!(settings.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_file_overrides_nested_sections() {
        let settings = parse(
            r#"
            request_timeout_secs = 3
            log_format = "json"

            [store]
            backend = "memory"

            [cache]
            backend = "redis"
            failure_mode = "bypass"
            "#,
        );
        assert_eq!(settings.request_timeout_secs, 3);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(settings.cache.backend, CacheBackend::Redis);
        assert_eq!(settings.cache.failure_mode, CacheFailureMode::Bypass);
        assert_eq!(settings.cache.redis_url, "redis://127.0.0.1:6379");
    }
}
