//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Resolve backend URL, credentials, timeouts and logging settings.
//! - Fall back to documented defaults for unset values.
//!
//! # Invariants
//! - Unset values use defaults and are logged at `info`.
//! - Set-but-invalid values are errors, never silently replaced.

use crate::logging::default_log_level;
use log::info;
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_API_URL: &str = "LENDINGDESK_API_URL";
pub const ENV_ACCESS_TOKEN: &str = "LENDINGDESK_ACCESS_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "LENDINGDESK_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "LENDINGDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LENDINGDESK_LOG_DIR";

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.message)
    }
}

impl Error for ConfigError {}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend API root, e.g. `http://localhost:3000/api`.
    pub api_url: String,
    /// Pre-issued bearer token, if any.
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
    pub log_level: String,
    /// Rolling log directory; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        let api_url = var(ENV_API_URL).unwrap_or_else(|| {
            info!("{ENV_API_URL} not set, using default: {DEFAULT_API_URL}");
            defaults.api_url.clone()
        });
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError {
                key: ENV_API_URL,
                message: format!("`{api_url}` must start with http:// or https://"),
            });
        }

        let request_timeout_secs =
            try_load(var(ENV_TIMEOUT_SECS), ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)?;
        if request_timeout_secs == 0 {
            return Err(ConfigError {
                key: ENV_TIMEOUT_SECS,
                message: "timeout must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            api_url,
            access_token: var(ENV_ACCESS_TOKEN),
            request_timeout_secs,
            log_level: var(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: var(ENV_LOG_DIR).map(PathBuf::from),
        })
    }
}

fn try_load<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        Some(value) => value.parse().map_err(|err| ConfigError {
            key,
            message: format!("`{value}`: {err}"),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
