//! Application configuration.
//!
//! Settings come from environment variables (a `.env` file is loaded first when
//! present). Command-line flags may override some of them afterwards.

use std::env;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8001";
/// Turn requests include speech-to-text, an LLM call and speech synthesis.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `MOCKMATE_API_URL`: (Optional) Base URL of the interview service. Defaults to "http://127.0.0.1:8001".
    // *   `MOCKMATE_REQUEST_TIMEOUT_SECS`: (Optional) Per-request timeout. Defaults to 120.
    // *   `MOCKMATE_INPUT_DEVICE` / `MOCKMATE_OUTPUT_DEVICE`: (Optional) Audio device names. Default devices otherwise.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("MOCKMATE_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: "MOCKMATE_API_URL",
                value: api_url,
            });
        }

        let request_timeout = match lookup("MOCKMATE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "MOCKMATE_REQUEST_TIMEOUT_SECS",
                        value: raw,
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let input_device = lookup("MOCKMATE_INPUT_DEVICE").filter(|v| !v.trim().is_empty());
        let output_device = lookup("MOCKMATE_OUTPUT_DEVICE").filter(|v| !v.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            api_url,
            request_timeout,
            input_device,
            output_device,
            log_level,
        })
    }
}
