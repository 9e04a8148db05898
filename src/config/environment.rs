// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into a typed ServerConfig with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use rsvp_core::payload::AllowedFields;

/// Environment variable names
pub mod env_keys {
    /// Bind address
    pub const HOST: &str = "HOST";
    /// HTTP port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Log level
    pub const RUST_LOG: &str = "RUST_LOG";
    /// Admin username
    pub const ADMIN_USER: &str = "ADMIN_USER";
    /// Admin password
    pub const ADMIN_PASS: &str = "ADMIN_PASS";
    /// Redirect target for unused tokens
    pub const FULL_INVITE_URL: &str = "FULL_INVITE_URL";
    /// Redirect target for everything else
    pub const FALLBACK_URL: &str = "FALLBACK_URL";
    /// Base URL for generated invite links
    pub const INVITE_BASE_URL: &str = "INVITE_BASE_URL";
    /// Comma-separated reply payload field allow-list
    pub const REPLY_ALLOWED_FIELDS: &str = "REPLY_ALLOWED_FIELDS";
    /// Reply rate limit window in seconds
    pub const REPLY_RATE_LIMIT_WINDOW_SECS: &str = "REPLY_RATE_LIMIT_WINDOW_SECS";
    /// Reply rate limit request count per window
    pub const REPLY_RATE_LIMIT_MAX: &str = "REPLY_RATE_LIMIT_MAX";
    /// Interval between expired-window sweeps
    pub const RATE_LIMIT_SWEEP_INTERVAL_SECS: &str = "RATE_LIMIT_SWEEP_INTERVAL_SECS";
    /// Document store location
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Comma-separated CORS origins, `*` for any
    pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
    /// Maximum request body size
    pub const MAX_REQUEST_BODY_BYTES: &str = "MAX_REQUEST_BODY_BYTES";
}

/// Default values
pub mod defaults {
    /// Bind address
    pub const HOST: &str = "127.0.0.1";
    /// HTTP port
    pub const HTTP_PORT: u16 = 5999;
    /// Redirect target for unused tokens
    pub const FULL_INVITE_URL: &str = "https://youtube.com";
    /// Redirect target for everything else
    pub const FALLBACK_URL: &str = "https://twitch.com";
    /// Base URL for generated invite links
    pub const INVITE_BASE_URL: &str = "https://ash-wedding/token";
    /// Five minute reply window
    pub const REPLY_RATE_LIMIT_WINDOW_SECS: u64 = 300;
    /// Replies allowed per window
    pub const REPLY_RATE_LIMIT_MAX: u32 = 10;
    /// Expired-window sweep interval
    pub const RATE_LIMIT_SWEEP_INTERVAL_SECS: u64 = 60;
    /// Document store location
    pub const DATABASE_URL: &str = "sqlite:./data/rsvp.db";
    /// CORS origins
    pub const CORS_ALLOWED_ORIGINS: &str = "*";
    /// Request body limit
    pub const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;
}

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Normal operation
    #[default]
    Info,
    /// Verbose
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback to `Info`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Live deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback to `Development`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Testing => "testing",
        };
        f.write_str(name)
    }
}

/// Type-safe document store location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database file
    SQLite {
        /// File path
        path: PathBuf,
    },
    /// In-memory `SQLite` database, lost on shutdown
    SQLiteMemory,
    /// Process-local document maps, lost on shutdown
    InMemory,
}

impl DatabaseUrl {
    /// Parse a `DATABASE_URL` value
    ///
    /// `memory` selects the in-process store, `sqlite::memory:` an in-memory
    /// `SQLite` database and `sqlite:<path>` (or a bare path) a database file.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty value
    pub fn parse_url(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("DATABASE_URL must not be empty");
        }
        if s == "memory" {
            return Ok(Self::InMemory);
        }
        let path = s.strip_prefix("sqlite:").unwrap_or(s);
        if path == ":memory:" {
            Ok(Self::SQLiteMemory)
        } else if path.is_empty() {
            bail!("DATABASE_URL has no SQLite path: {s}")
        } else {
            Ok(Self::SQLite {
                path: PathBuf::from(path),
            })
        }
    }

    /// Convert to a connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::SQLiteMemory => "sqlite::memory:".to_owned(),
            Self::InMemory => "memory".to_owned(),
        }
    }

    /// Whether records are lost on shutdown
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        matches!(self, Self::SQLiteMemory | Self::InMemory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/rsvp.db"),
        }
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_connection_string())
    }
}

/// Admin Basic-Auth credentials
///
/// Either value may be absent, in which case admin endpoints fail closed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AdminCredentials {
    /// Expected username
    pub username: Option<String>,
    /// Expected password
    pub password: Option<String>,
}

impl AdminCredentials {
    /// Credentials with both values set
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Both values, when configured
    #[must_use]
    pub fn pair(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }

    /// Whether the admin panel can be used at all
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.pair().is_some()
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// The two redirect targets used by token resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectConfig {
    /// Target for unused tokens
    pub full_invite_url: String,
    /// Target for used and unknown tokens
    pub fallback_url: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            full_invite_url: defaults::FULL_INVITE_URL.to_owned(),
            fallback_url: defaults::FALLBACK_URL.to_owned(),
        }
    }
}

/// Fixed-window limits for the reply endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Window length in seconds
    pub window_secs: u64,
    /// Requests allowed per window
    pub max_requests: u32,
    /// Interval between sweeps of expired windows
    pub sweep_interval_secs: u64,
}

impl RateLimitConfig {
    /// Window length
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Sweep interval
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: defaults::REPLY_RATE_LIMIT_WINDOW_SECS,
            max_requests: defaults::REPLY_RATE_LIMIT_MAX,
            sweep_interval_secs: defaults::RATE_LIMIT_SWEEP_INTERVAL_SECS,
        }
    }
}

/// Reply endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplyConfig {
    /// Fields a guest may send
    pub allowed_fields: AllowedFields,
    /// Throttling for the endpoint
    pub rate_limit: RateLimitConfig,
}

/// CORS settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// Comma-separated origins, `*` for any
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: defaults::CORS_ALLOWED_ORIGINS.to_owned(),
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Log level
    pub log_level: LogLevel,
    /// Document store location
    pub database_url: DatabaseUrl,
    /// Admin Basic-Auth credentials
    pub admin: AdminCredentials,
    /// Redirect targets
    pub redirects: RedirectConfig,
    /// Base URL for invite links printed by the generator
    pub invite_base_url: String,
    /// Reply endpoint settings
    pub reply: ReplyConfig,
    /// CORS settings
    pub cors: CorsConfig,
    /// Maximum accepted request body size
    pub max_request_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_owned(),
            http_port: defaults::HTTP_PORT,
            environment: Environment::default(),
            log_level: LogLevel::default(),
            database_url: DatabaseUrl::default(),
            admin: AdminCredentials::default(),
            redirects: RedirectConfig::default(),
            invite_base_url: defaults::INVITE_BASE_URL.to_owned(),
            reply: ReplyConfig::default(),
            cors: CorsConfig::default(),
            max_request_body_bytes: defaults::MAX_REQUEST_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric value does not parse, a redirect URL is
    /// not an absolute URL, or a rate limit setting is zero.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            host: env_var_or(env_keys::HOST, defaults::HOST),
            http_port: parse_env(env_keys::HTTP_PORT, defaults::HTTP_PORT)?,
            environment: Environment::from_str_or_default(&env_var_or(
                env_keys::ENVIRONMENT,
                "development",
            )),
            log_level: LogLevel::from_str_or_default(&env_var_or(env_keys::RUST_LOG, "info")),
            database_url: DatabaseUrl::parse_url(&env_var_or(
                env_keys::DATABASE_URL,
                defaults::DATABASE_URL,
            ))?,
            admin: AdminCredentials {
                username: non_empty_env(env_keys::ADMIN_USER),
                password: non_empty_env(env_keys::ADMIN_PASS),
            },
            redirects: RedirectConfig {
                full_invite_url: parse_redirect(
                    env_keys::FULL_INVITE_URL,
                    defaults::FULL_INVITE_URL,
                )?,
                fallback_url: parse_redirect(env_keys::FALLBACK_URL, defaults::FALLBACK_URL)?,
            },
            invite_base_url: env_var_or(env_keys::INVITE_BASE_URL, defaults::INVITE_BASE_URL),
            reply: ReplyConfig {
                allowed_fields: parse_allowed_fields(
                    env::var(env_keys::REPLY_ALLOWED_FIELDS).ok().as_deref(),
                ),
                rate_limit: RateLimitConfig {
                    window_secs: parse_env(
                        env_keys::REPLY_RATE_LIMIT_WINDOW_SECS,
                        defaults::REPLY_RATE_LIMIT_WINDOW_SECS,
                    )?,
                    max_requests: parse_env(
                        env_keys::REPLY_RATE_LIMIT_MAX,
                        defaults::REPLY_RATE_LIMIT_MAX,
                    )?,
                    sweep_interval_secs: parse_env(
                        env_keys::RATE_LIMIT_SWEEP_INTERVAL_SECS,
                        defaults::RATE_LIMIT_SWEEP_INTERVAL_SECS,
                    )?,
                },
            },
            cors: CorsConfig {
                allowed_origins: env_var_or(
                    env_keys::CORS_ALLOWED_ORIGINS,
                    defaults::CORS_ALLOWED_ORIGINS,
                ),
            },
            max_request_body_bytes: parse_env(
                env_keys::MAX_REQUEST_BODY_BYTES,
                defaults::MAX_REQUEST_BODY_BYTES,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error if a rate limit setting is zero
    pub fn validate(&self) -> Result<()> {
        let limits = &self.reply.rate_limit;
        if limits.window_secs == 0 {
            bail!("{} must be greater than zero", env_keys::REPLY_RATE_LIMIT_WINDOW_SECS);
        }
        if limits.max_requests == 0 {
            bail!("{} must be greater than zero", env_keys::REPLY_RATE_LIMIT_MAX);
        }
        if limits.sweep_interval_secs == 0 {
            bail!("{} must be greater than zero", env_keys::RATE_LIMIT_SWEEP_INTERVAL_SECS);
        }
        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "RSVP Server Configuration:\n\
             - Bind: {}:{}\n\
             - Environment: {}\n\
             - Log Level: {}\n\
             - Database: {}\n\
             - Admin Panel: {}\n\
             - Full Invite URL: {}\n\
             - Fallback URL: {}\n\
             - Reply Fields: {}\n\
             - Reply Rate Limit: {} requests / {}s\n\
             - CORS Origins: {}",
            self.host,
            self.http_port,
            self.environment,
            self.log_level,
            self.database_url,
            if self.admin.is_configured() {
                "Enabled"
            } else {
                "Disabled (credentials not configured)"
            },
            self.redirects.full_invite_url,
            self.redirects.fallback_url,
            self.reply.allowed_fields.iter().collect::<Vec<_>>().join(", "),
            self.reply.rate_limit.max_requests,
            self.reply.rate_limit.window_secs,
            self.cors.allowed_origins,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Environment variable with blank values treated as unset
fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn parse_redirect(key: &str, default: &str) -> Result<String> {
    let raw = env_var_or(key, default);
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid {key} value: {raw}"))?;
    if url.cannot_be_a_base() {
        bail!("{key} must be an absolute URL, got {raw}");
    }
    Ok(raw.trim().to_owned())
}

/// Parse a comma-separated field list, falling back to the defaults when blank
#[must_use]
pub fn parse_allowed_fields(raw: Option<&str>) -> AllowedFields {
    let names: Vec<&str> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        AllowedFields::default()
    } else {
        AllowedFields::new(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_parsing() {
        assert_eq!(DatabaseUrl::parse_url("memory").unwrap(), DatabaseUrl::InMemory);
        assert_eq!(
            DatabaseUrl::parse_url("sqlite::memory:").unwrap(),
            DatabaseUrl::SQLiteMemory
        );
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:./data/rsvp.db").unwrap(),
            DatabaseUrl::SQLite {
                path: PathBuf::from("./data/rsvp.db")
            }
        );
        assert!(DatabaseUrl::parse_url("  ").is_err());
        assert!(DatabaseUrl::parse_url("sqlite:").is_err());
    }

    #[test]
    fn test_allowed_fields_parsing() {
        let fields = parse_allowed_fields(Some(" rsvp , songRequest,,"));
        assert!(fields.contains("rsvp"));
        assert!(fields.contains("songRequest"));
        assert!(!fields.contains("allergies"));

        assert_eq!(parse_allowed_fields(Some("  ")), AllowedFields::default());
        assert_eq!(parse_allowed_fields(None), AllowedFields::default());
    }

    #[test]
    fn test_admin_credentials_debug_redacts_password() {
        let creds = AdminCredentials::new("admin", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_admin_credentials_require_both_values() {
        let partial = AdminCredentials {
            username: Some("admin".to_owned()),
            password: None,
        };
        assert!(!partial.is_configured());
        assert!(AdminCredentials::new("a", "b").is_configured());
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let mut config = ServerConfig::default();
        config.reply.rate_limit.window_secs = 0;
        assert!(config.validate().is_err());
        assert!(ServerConfig::default().validate().is_ok());
    }
}
