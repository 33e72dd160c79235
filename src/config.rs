// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without a trailing slash
    pub api_base_url: String,
    /// Directory holding the persisted credential slots
    pub credentials_dir: PathBuf,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url = env::var("FITCOACH_API_URL")
            .map(|v| normalize_base_url(&v))
            .map_err(|_| ConfigError::Missing("FITCOACH_API_URL"))?;
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "FITCOACH_API_URL",
                value: api_base_url,
            });
        }

        let credentials_dir = match env::var("FITCOACH_CREDENTIALS_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_credentials_dir()?,
        };

        let request_timeout = match env::var("FITCOACH_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    name: "FITCOACH_REQUEST_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_base_url,
            credentials_dir,
            request_timeout,
            user_agent: env::var("FITCOACH_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
        })
    }

    /// Config for tests, pointed at the given mock backend.
    pub fn test_default(api_base_url: &str) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url),
            credentials_dir: env::temp_dir().join("fitcoach-test"),
            request_timeout: Duration::from_secs(5),
            user_agent: default_user_agent(),
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn default_user_agent() -> String {
    format!("fitcoach-client/{}", env!("CARGO_PKG_VERSION"))
}

fn default_credentials_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|d| d.join("fitcoach"))
        .ok_or(ConfigError::Missing("FITCOACH_CREDENTIALS_DIR"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
