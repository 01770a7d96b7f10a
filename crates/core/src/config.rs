//! Environment-driven configuration (SPEC_FULL.md §4.11, §6).
//!
//! Parsed once at process start into an immutable struct; nothing downstream
//! reads `std::env` directly. Secrets are redacted from `Debug`.

use std::env;
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub cors_origins: Vec<String>,
    pub min_word_count: usize,
    pub too_fast_seconds: i64,
    pub ip_hash_salt: String,
    pub max_body_bytes: usize,
    pub reward_amount: i64,
    pub reward_cooldown: Duration,
    pub payment_required: bool,
    pub bind_addr: String,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
    pub images_dir: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    /// Reads configuration from the process environment. `DATABASE_URL` is
    /// the only required key; everything else falls back to the default
    /// documented in SPEC_FULL.md §6.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let min_word_count = parse_or_default("MIN_WORD_COUNT", 60)?;
        let too_fast_seconds = parse_or_default("TOO_FAST_SECONDS", 5)?;
        let ip_hash_salt = env::var("IP_HASH_SALT").unwrap_or_else(|_| "local-salt".to_string());
        let max_body_bytes = parse_or_default("MAX_BODY_BYTES", 65_536)?;
        let reward_amount = parse_or_default("REWARD_AMOUNT", 10)?;
        let reward_cooldown_secs: u64 = parse_or_default("REWARD_COOLDOWN_SECONDS", 86_400)?;
        let payment_required = parse_bool_or_default("PAYMENT_REQUIRED", true)?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let request_timeout_secs: u64 = parse_or_default("REQUEST_TIMEOUT_SECONDS", 15)?;
        let log_format = match env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()).as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };
        let images_dir = env::var("IMAGES_DIR").unwrap_or_else(|_| "./images".to_string());

        Ok(Config {
            database_url,
            secret_key,
            cors_origins,
            min_word_count,
            too_fast_seconds,
            ip_hash_salt,
            max_body_bytes,
            reward_amount,
            reward_cooldown: Duration::from_secs(reward_cooldown_secs),
            payment_required,
            bind_addr,
            request_timeout: Duration::from_secs(request_timeout_secs),
            log_format,
            images_dir,
        })
    }

    pub fn allow_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &redact_connection_string(&self.database_url))
            .field("secret_key", &"<redacted>")
            .field("cors_origins", &self.cors_origins)
            .field("min_word_count", &self.min_word_count)
            .field("too_fast_seconds", &self.too_fast_seconds)
            .field("ip_hash_salt", &"<redacted>")
            .field("max_body_bytes", &self.max_body_bytes)
            .field("reward_amount", &self.reward_amount)
            .field("reward_cooldown", &self.reward_cooldown)
            .field("payment_required", &self.payment_required)
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout", &self.request_timeout)
            .field("images_dir", &self.images_dir)
            .finish()
    }
}

fn redact_connection_string(url: &str) -> String {
    match url.find('@') {
        Some(at) => match url.find("://") {
            Some(scheme_end) => format!("{}://<redacted>{}", &url[..scheme_end], &url[at..]),
            None => "<redacted>".to_string(),
        },
        None => url.to_string(),
    }
}

fn parse_or_default<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_bool_or_default(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
        Err(_) => Ok(default),
    }
}
