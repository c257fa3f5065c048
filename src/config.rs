//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Document Store
//!
//! - `MONGODB_URI`: Connection string (default: `mongodb://localhost:27017`).
//!   `memory://` selects the in-process store, useful for local development.
//! - `MONGODB_DATABASE`: Database name (default: `portfolio`)
//! - `DB_RECONNECT_INTERVAL_SECS`: Fixed delay between connection attempts (default: 5)
//!
//! # Security Configuration
//!
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated list of allowed origins (default: `*` for dev)
//! - `CONTACT_RATE_LIMIT_MAX`: Contact submissions per window per client (default: 5)
//! - `CONTACT_RATE_LIMIT_WINDOW_SECS`: Rate limit window (default: 900)
//! - `MAX_REQUEST_BODY_SIZE`: Body limit in bytes (default: 10240)
//! - `CSRF_COOKIE_SECURE`: Mark the CSRF secret cookie `Secure` (default: false)

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, AppResult};

/// URI scheme that selects the in-process document store.
pub const MEMORY_STORE_SCHEME: &str = "memory://";

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 5000)
    pub port: u16,

    // =========================================================================
    // Document Store Configuration
    // =========================================================================
    /// MongoDB connection string, or `memory://` for the in-process store
    pub mongodb_uri: String,

    /// Database holding the `contacts` and `projects` collections
    pub database_name: String,

    /// Fixed delay between initial connection attempts (default: 5 seconds)
    pub reconnect_interval: Duration,

    /// Connection attempts before giving up (0 = retry forever)
    pub max_connect_attempts: u32,

    /// Bound on every store operation, including server selection (default: 10 seconds)
    pub operation_timeout: Duration,

    /// Interval for background store pings
    pub health_check_interval: Duration,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Contact submissions allowed per window per client (0 = disabled)
    pub contact_rate_limit_max: u32,

    /// Window over which `contact_rate_limit_max` applies
    pub contact_rate_limit_window: Duration,

    // =========================================================================
    // Request Limits
    // =========================================================================
    /// Maximum request body size in bytes (default: 10 KiB)
    pub max_request_body_size: usize,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Allowed CORS origins. "*" allows any origin.
    pub cors_allowed_origins: Vec<String>,

    /// Trusted proxy CIDR ranges. Forwarding headers are only honored when
    /// the socket peer falls inside one of them. Empty = trust all.
    pub trusted_proxies: Vec<String>,

    /// Name of the cookie holding the CSRF secret
    pub csrf_cookie_name: String,

    /// Whether the CSRF cookie carries the `Secure` attribute
    pub csrf_cookie_secure: bool,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Log output format: "text" or "json"
    pub log_format: String,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any value fails to parse or the
    /// resulting configuration is inconsistent.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 5000)?,

            // Document store
            mongodb_uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database_name: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "portfolio".to_string()),
            reconnect_interval: Duration::from_secs(Self::parse_env(
                "DB_RECONNECT_INTERVAL_SECS",
                5,
            )?),
            max_connect_attempts: Self::parse_env("DB_MAX_CONNECT_ATTEMPTS", 0)?,
            operation_timeout: Duration::from_secs(Self::parse_env(
                "DB_OPERATION_TIMEOUT_SECS",
                10,
            )?),
            health_check_interval: Duration::from_secs(Self::parse_env(
                "HEALTH_CHECK_INTERVAL_SECS",
                30,
            )?),

            // Rate limiting
            contact_rate_limit_max: Self::parse_env("CONTACT_RATE_LIMIT_MAX", 5)?,
            contact_rate_limit_window: Duration::from_secs(Self::parse_env(
                "CONTACT_RATE_LIMIT_WINDOW_SECS",
                15 * 60,
            )?),

            // Request limits
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 10 * 1024)?,

            // Security
            cors_allowed_origins: Self::parse_list("CORS_ALLOWED_ORIGINS", "*"),
            trusted_proxies: Self::parse_list("TRUSTED_PROXIES", ""),
            csrf_cookie_name: env::var("CSRF_COOKIE_NAME").unwrap_or_else(|_| "_csrf".to_string()),
            csrf_cookie_secure: Self::parse_env("CSRF_COOKIE_SECURE", false)?,

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.reconnect_interval.is_zero() {
            return Err(AppError::ConfigError(
                "DB_RECONNECT_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.operation_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "DB_OPERATION_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.rate_limiting_enabled() && self.contact_rate_limit_window.is_zero() {
            return Err(AppError::ConfigError(
                "CONTACT_RATE_LIMIT_WINDOW_SECS must be greater than 0 when rate limiting is enabled"
                    .to_string(),
            ));
        }

        if self.csrf_cookie_name.is_empty() || !self.csrf_cookie_name.chars().all(is_cookie_tchar)
        {
            return Err(AppError::ConfigError(format!(
                "CSRF_COOKIE_NAME '{}' is not a valid cookie name",
                self.csrf_cookie_name
            )));
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(AppError::ConfigError(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            )));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if contact rate limiting is enabled.
    pub fn rate_limiting_enabled(&self) -> bool {
        self.contact_rate_limit_max > 0
    }

    /// Whether the in-process store was requested instead of MongoDB.
    pub fn uses_memory_store(&self) -> bool {
        self.mongodb_uri.starts_with(MEMORY_STORE_SCHEME)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        self.metrics_enabled()
            .then(|| std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }

    /// The MongoDB URI with any password masked, for logging.
    ///
    /// Unparsable URIs are returned as a placeholder rather than verbatim.
    pub fn redacted_mongodb_uri(&self) -> String {
        match Url::parse(&self.mongodb_uri) {
            Ok(mut url) => {
                if url.password().is_some() {
                    // set_password only fails for cannot-be-a-base URLs, which have no password
                    let _ = url.set_password(Some("****"));
                }
                url.to_string()
            }
            Err(_) => "<unparsable uri>".to_string(),
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .trim()
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse a comma-separated list, dropping empty entries.
    fn parse_list(name: &str, default: &str) -> Vec<String> {
        split_list(&env::var(name).unwrap_or_else(|_| default.to_string()))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// RFC 6265 cookie-name characters (an RFC 7230 token).
fn is_cookie_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: "portfolio".to_string(),
            reconnect_interval: Duration::from_secs(5),
            max_connect_attempts: 0, // retry forever
            operation_timeout: Duration::from_secs(10),
            health_check_interval: Duration::from_secs(30),
            contact_rate_limit_max: 5,
            contact_rate_limit_window: Duration::from_secs(15 * 60),
            max_request_body_size: 10 * 1024,
            cors_allowed_origins: vec!["*".to_string()],
            trusted_proxies: vec![],
            csrf_cookie_name: "_csrf".to_string(),
            csrf_cookie_secure: false,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            metrics_port: 9090,
        }
    }
}
