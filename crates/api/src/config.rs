//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EMPORIUM_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `EMPORIUM_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; not needed with the memory store)
//!
//! ## Optional
//! - `EMPORIUM_STORE` - `postgres` (default) or `memory`
//! - `EMPORIUM_HOST` - Bind address (default: 127.0.0.1)
//! - `EMPORIUM_PORT` - Listen port (default: 5000)
//! - `EMPORIUM_TOKEN_TTL_HOURS` - Bearer token lifetime (default: 24)
//! - `EMPORIUM_CORS_ORIGINS` - Comma-separated allowed origins (default: any)
//! - `EMPORIUM_CATALOG_ADMIN_ONLY` - Restrict product changes to admins (default: false)
//! - `EMPORIUM_RATE_LIMIT` - Rate limit auth endpoints (default: true)
//! - `EMPORIUM_TRUST_PROXY_HEADERS` - Key the rate limit on `X-Forwarded-For`/`X-Real-IP`
//!   instead of the peer address; only behind a proxy that sets them (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which backend holds shop data.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// `PostgreSQL` at the given URL.
    Postgres { database_url: SecretString },
    /// Process memory; everything is lost on restart.
    Memory,
}

/// API application configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ApiConfig {
    /// Storage backend
    pub store: StoreConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token signing secret
    pub jwt_secret: SecretString,
    /// Bearer token lifetime
    pub token_ttl: Duration,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    /// Whether product create/delete needs the admin role
    pub catalog_admin_only: bool,
    /// Whether auth endpoints are rate limited
    pub rate_limit: bool,
    /// Whether the rate limiter trusts client IP headers from a proxy
    pub trust_proxy_headers: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = match self.store {
            StoreConfig::Postgres { .. } => "postgres",
            StoreConfig::Memory => "memory",
        };
        f.debug_struct("ApiConfig")
            .field("store", &store)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("cors_origins", &self.cors_origins)
            .field("catalog_admin_only", &self.catalog_admin_only)
            .field("rate_limit", &self.rate_limit)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store = match get_env_or_default("EMPORIUM_STORE", "postgres").as_str() {
            "postgres" => StoreConfig::Postgres {
                database_url: get_database_url("EMPORIUM_DATABASE_URL")?,
            },
            "memory" => StoreConfig::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "EMPORIUM_STORE".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        let host = parse_env("EMPORIUM_HOST", "127.0.0.1")?;
        let port = parse_env("EMPORIUM_PORT", "5000")?;
        let jwt_secret = get_validated_secret("EMPORIUM_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "EMPORIUM_JWT_SECRET")?;
        let ttl_hours: u64 = parse_env("EMPORIUM_TOKEN_TTL_HOURS", "24")?;
        if ttl_hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "EMPORIUM_TOKEN_TTL_HOURS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            store,
            host,
            port,
            jwt_secret,
            token_ttl: Duration::from_secs(ttl_hours.saturating_mul(3600)),
            cors_origins: parse_list(&get_env_or_default("EMPORIUM_CORS_ORIGINS", "")),
            catalog_admin_only: parse_env("EMPORIUM_CATALOG_ADMIN_ONLY", "false")?,
            rate_limit: parse_env("EMPORIUM_RATE_LIMIT", "true")?,
            trust_proxy_headers: parse_env("EMPORIUM_TRUST_PROXY_HEADERS", "false")?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration for tests and local demos: memory store, no rate
    /// limiting, no Sentry.
    #[must_use]
    pub fn for_memory_store(jwt_secret: SecretString) -> Self {
        Self {
            store: StoreConfig::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            jwt_secret,
            token_ttl: Duration::from_secs(24 * 3600),
            cors_origins: Vec::new(),
            catalog_admin_only: false,
            rate_limit: false,
            trust_proxy_headers: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
