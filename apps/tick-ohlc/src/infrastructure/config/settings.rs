//! Service Configuration Settings
//!
//! Configuration types for the service, loaded from environment variables.

use std::time::Duration;

use crate::domain::bucket::ONE_MINUTE_MS;
use crate::infrastructure::feed::WebhookSecret;

/// Origins allowed to call the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedOrigins {
    /// Any origin (`*`).
    #[default]
    Any,
    /// An explicit list of origins.
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parse a comma-separated origin list; `*` or blank means any origin.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let origins: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_owned)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Self::Any
        } else {
            Self::List(origins)
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// HTTP listen port.
    pub http_port: u16,
    /// Wall-clock budget for a single request.
    pub request_timeout: Duration,
    /// Largest accepted webhook body.
    pub max_body_bytes: usize,
    /// CORS allowed origins.
    pub allowed_origins: AllowedOrigins,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: 8080,
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 1024 * 1024,
            allowed_origins: AllowedOrigins::Any,
        }
    }
}

/// Trade store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// sqlx connection URL (`sqlite://...` or `postgres://...`).
    pub url: String,
    /// Connection pool size.
    pub max_connections: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://tick-ohlc.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Shared webhook signing secret.
    pub webhook_secret: WebhookSecret,
    /// Bucket width in milliseconds.
    pub window_ms: i64,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Trade store settings.
    pub store: StoreSettings,
}

impl ServiceConfig {
    /// Create a configuration with defaults and the given secret.
    #[must_use]
    pub fn new(webhook_secret: WebhookSecret) -> Self {
        Self {
            webhook_secret,
            window_ms: ONE_MINUTE_MS,
            server: ServerSettings::default(),
            store: StoreSettings::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or a
    /// value fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = parse_secret(std::env::var("ANTENNY_SECRET").ok())?;

        let window_ms = match std::env::var("TICK_OHLC_WINDOW_MS") {
            Ok(raw) => parse_window_ms(&raw)?,
            Err(_) => ONE_MINUTE_MS,
        };

        let defaults = ServerSettings::default();
        let server = ServerSettings {
            http_port: parse_env_u16("TICK_OHLC_HTTP_PORT", defaults.http_port),
            request_timeout: parse_env_duration_secs(
                "TICK_OHLC_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout,
            ),
            max_body_bytes: parse_env_usize("TICK_OHLC_MAX_BODY_BYTES", defaults.max_body_bytes),
            allowed_origins: std::env::var("TICK_OHLC_ALLOWED_ORIGINS")
                .map(|s| AllowedOrigins::parse(&s))
                .unwrap_or_default(),
        };

        let store_defaults = StoreSettings::default();
        let store = StoreSettings {
            url: parse_store_url(std::env::var("TICK_OHLC_STORE_URL").ok(), store_defaults.url)?,
            max_connections: parse_env_u32(
                "TICK_OHLC_STORE_MAX_CONNECTIONS",
                store_defaults.max_connections,
            ),
        };

        Ok(Self {
            webhook_secret: secret,
            window_ms,
            server,
            store,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has an unusable value.
    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

fn parse_secret(raw: Option<String>) -> Result<WebhookSecret, ConfigError> {
    let secret = raw
        .map(WebhookSecret::new)
        .ok_or_else(|| ConfigError::MissingEnvVar("ANTENNY_SECRET".to_string()))?;

    if secret.is_empty() {
        return Err(ConfigError::EmptyValue("ANTENNY_SECRET".to_string()));
    }
    Ok(secret)
}

fn parse_store_url(raw: Option<String>, default: String) -> Result<String, ConfigError> {
    match raw {
        Some(url) if url.trim().is_empty() => {
            Err(ConfigError::EmptyValue("TICK_OHLC_STORE_URL".to_string()))
        }
        Some(url) => Ok(url.trim().to_string()),
        None => Ok(default),
    }
}

fn parse_window_ms(raw: &str) -> Result<i64, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: "TICK_OHLC_WINDOW_MS".to_string(),
            value: raw.to_string(),
        })
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}
