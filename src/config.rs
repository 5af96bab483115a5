//! Runtime configuration from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::network::protocol::WireFormat;
use crate::network::retry::RetryPolicy;
use crate::network::ws::DEFAULT_TIMEOUT;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but unparseable.
    #[error("{name}={value:?} is invalid: {reason}")]
    Invalid {
        /// Variable
        name: &'static str,
        /// Raw value
        value: String,
        /// Parse failure
        reason: String,
    },
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Where the persistence blob lives
    pub store_path: PathBuf,
    /// WebSocket service URL; loopback when absent
    pub remote_url: Option<String>,
    /// This device
    pub device_id: String,
    /// Display name
    pub player_name: String,
    /// Remote retry policy
    pub retry: RetryPolicy,
    /// Wire encoding
    pub wire_format: WireFormat,
    /// Per-call timeout
    pub remote_timeout: Duration,
    /// Log filter directive
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("pfb-state.json"),
            remote_url: None,
            device_id: uuid::Uuid::new_v4().to_string(),
            player_name: "player".to_string(),
            retry: RetryPolicy::default(),
            wire_format: WireFormat::Json,
            remote_timeout: DEFAULT_TIMEOUT,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Read `PFB_*` variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("PFB_STORE_PATH") {
            config.store_path = PathBuf::from(path);
        }
        config.remote_url = lookup("PFB_REMOTE_URL").filter(|url| !url.is_empty());
        if let Some(device_id) = lookup("PFB_DEVICE_ID") {
            config.device_id = device_id;
        }
        if let Some(name) = lookup("PFB_PLAYER_NAME") {
            config.player_name = name;
        }
        if let Some(attempts) = parse(&lookup, "PFB_RETRY_ATTEMPTS")? {
            config.retry.max_attempts = attempts;
        }
        if let Some(ms) = parse(&lookup, "PFB_RETRY_BASE_MS")? {
            config.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(&lookup, "PFB_RETRY_MAX_MS")? {
            config.retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(format) = parse(&lookup, "PFB_WIRE_FORMAT")? {
            config.wire_format = format;
        }
        if let Some(ms) = parse(&lookup, "PFB_REMOTE_TIMEOUT_MS")? {
            config.remote_timeout = Duration::from_millis(ms);
        }
        if let Some(filter) = lookup("PFB_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
