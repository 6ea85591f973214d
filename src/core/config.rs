//! Environment-driven server configuration.
//!
//! Defaults are applied first, then overridden by `ENGRAM_*` variables. A
//! `.env` file is honored when present. Invalid values fail loading instead
//! of silently falling back.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer number of seconds")]
    InvalidDuration { key: &'static str },
    #[error("ENGRAM_ENV must be one of: production, development, test")]
    InvalidEnvironment,
}

/// Deployment environment, controlling log formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
    Test,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "production" => Ok(Self::Production),
            "development" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            _ => Err(ConfigError::InvalidEnvironment),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: String,
    pub shutdown_timeout: Duration,
    pub request_timeout: Duration,
    pub log_level: String,
    pub environment: Environment,
    /// When set, logs are also written to a daily-rolling file here.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let http_addr =
            trimmed_env("ENGRAM_HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let shutdown_timeout =
            duration_env("ENGRAM_SHUTDOWN_TIMEOUT_SECS")?.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);
        let request_timeout =
            duration_env("ENGRAM_REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let log_level = trimmed_env("ENGRAM_LOG_LEVEL")
            .map(|level| level.to_lowercase())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let environment = match trimmed_env("ENGRAM_ENV") {
            Some(value) => value.to_lowercase().parse()?,
            None => Environment::Production,
        };
        let log_dir = trimmed_env("ENGRAM_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            http_addr,
            shutdown_timeout,
            request_timeout,
            log_level,
            environment,
            log_dir,
        })
    }
}

fn trimmed_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn duration_env(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    match trimmed_env(key) {
        Some(raw) => parse_duration_secs(key, &raw).map(Some),
        None => Ok(None),
    }
}

fn parse_duration_secs(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw
        .parse()
        .map_err(|_| ConfigError::InvalidDuration { key })?;
    if secs == 0 {
        return Err(ConfigError::InvalidDuration { key });
    }
    Ok(Duration::from_secs(secs))
}
