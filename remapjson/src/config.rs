//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables. Required values fail
//! with a [`ConfigError`]; malformed optional values fall back to defaults.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

const DEFAULT_PORT: u16 = 8080;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("BASE_URL is not a valid URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Address to listen on, `0.0.0.0:$PORT` unless `ADDR` is set
    pub addr: String,

    /// Public base URL that minted webhook URLs start with, without trailing slash
    pub base_url: String,

    /// Secret the sealing key is derived from
    pub secret: String,

    /// Basic Auth password for the management routes; `None` disables auth
    pub password: Option<String>,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Maximum accepted inbound body size in bytes
    pub max_body_bytes: usize,

    /// Maximum number of requests handled at once
    pub max_concurrent_requests: usize,

    /// Requests per second allowed per client address; 0 disables the limit
    pub rate_limit_rps: u32,

    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_grace_secs: u64,

    /// Debug logging, including outbound connection traces
    pub debug: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = non_empty("BASE_URL").ok_or(ConfigError::Missing("BASE_URL"))?;
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let secret = non_empty("SECRET").ok_or(ConfigError::Missing("SECRET"))?;

        let addr = non_empty("ADDR").unwrap_or_else(|| {
            let port: u16 = parse_or("PORT", lookup("PORT"), DEFAULT_PORT);
            format!("0.0.0.0:{port}")
        });

        Ok(Config {
            addr,
            base_url,
            secret,
            password: non_empty("PASSWORD"),
            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", lookup("REQUEST_TIMEOUT_MS"), 90_000),
            max_body_bytes: parse_or("MAX_BODY_BYTES", lookup("MAX_BODY_BYTES"), 1024 * 1024),
            max_concurrent_requests: parse_or::<usize>(
                "MAX_CONCURRENT_REQUESTS",
                lookup("MAX_CONCURRENT_REQUESTS"),
                1000,
            )
            .max(1),
            rate_limit_rps: parse_or("RATE_LIMIT_RPS", lookup("RATE_LIMIT_RPS"), 10),
            shutdown_grace_secs: parse_or("SHUTDOWN_GRACE_SECS", lookup("SHUTDOWN_GRACE_SECS"), 10),
            debug: parse_flag(lookup("DEBUG").as_deref()),
            log_json: parse_flag(lookup("LOG_JSON").as_deref()),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Build the public URL for a sealed token.
    pub fn webhook_url(&self, token: &str) -> String {
        format!("{}/wh/{}", self.base_url, token)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("base_url", &self.base_url)
            .field("secret", &"[redacted]")
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("rate_limit_rps", &self.rate_limit_rps)
            .field("shutdown_grace_secs", &self.shutdown_grace_secs)
            .field("debug", &self.debug)
            .field("log_json", &self.log_json)
            .finish()
    }
}

/// Parse a value, warning and falling back to `default` when it is malformed.
fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + fmt::Display,
{
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(var = name, value = %raw, default = %default, "config_invalid_value");
            default
        }
    }
}

/// Read a boolean flag straight from the environment.
///
/// Used for logging setup, which has to happen before the full config loads.
pub fn env_flag(name: &str) -> bool {
    parse_flag(env::var(name).ok().as_deref())
}

/// `1`, `true`, `yes` and `on` (any case) enable a flag.
fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
