// ABOUTME: Environment-based configuration for the UnlockEd server
// ABOUTME: Parses ports, database, logging, session, encryption and OIDC settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Server configuration
//!
//! All settings come from environment variables (optionally seeded from a
//! `.env` file by the binary). [`ServerConfig::from_source`] takes a lookup
//! function so the parsing can be exercised without touching the process
//! environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::database::generate_encryption_key;
use crate::errors::{AppError, AppResult};

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8080;
/// Default on-disk database
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/unlocked.db";
/// Database used when `APP_ENV=testing`
pub const TESTING_DATABASE_URL: &str = "sqlite::memory:";
/// Default session lifetime
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
/// Default outbound HTTP timeout
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Password given to the bootstrap admin account when none is configured
pub const DEFAULT_ADMIN_PASSWORD: &str = "ChangeMe!";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests (in-memory database)
    Testing,
}

impl Environment {
    /// Parse from `APP_ENV`, unknown values fall back to development
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Whether this is the testing environment
    #[must_use]
    pub const fn is_testing(self) -> bool {
        matches!(self, Self::Testing)
    }

    /// Whether this is production
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Testing => "testing",
        })
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Append logs to this file instead of stdout
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

/// Database settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `sqlx` connection URL
    pub url: String,
}

/// Session and password settings
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    /// Session lifetime in hours
    pub session_ttl_hours: i64,
    /// Bcrypt work factor
    pub bcrypt_cost: u32,
    /// Password for the bootstrap admin account
    pub default_admin_password: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("default_admin_password", &"[REDACTED]")
            .finish()
    }
}

/// Identity provider endpoints used for OIDC client registration
#[derive(Clone, PartialEq, Eq, Default)]
pub struct OidcConfig {
    /// Hydra admin API base URL
    pub hydra_admin_url: String,
    /// Bearer token for the Hydra admin API
    pub hydra_admin_token: String,
    /// Hydra public (OAuth2) base URL
    pub hydra_public_url: String,
    /// Public URL of this application
    pub app_url: String,
    /// Public URL of the frontend
    pub frontend_url: String,
    /// Timeout for each outbound request
    pub http_timeout: Duration,
}

impl OidcConfig {
    /// Hydra admin URL without trailing slash
    #[must_use]
    pub fn hydra_admin_base(&self) -> &str {
        self.hydra_admin_url.trim_end_matches('/')
    }

    /// Hydra public URL without trailing slash
    #[must_use]
    pub fn hydra_public_base(&self) -> &str {
        self.hydra_public_url.trim_end_matches('/')
    }
}

impl fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OidcConfig")
            .field("hydra_admin_url", &self.hydra_admin_url)
            .field("hydra_admin_token", &"[REDACTED]")
            .field("hydra_public_url", &self.hydra_public_url)
            .field("app_url", &self.app_url)
            .field("frontend_url", &self.frontend_url)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

/// Complete server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// HTTP listen port
    pub http_port: u16,
    /// Database settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Session settings
    pub auth: AuthConfig,
    /// 32-byte AES-256-GCM key for secrets at rest
    pub encryption_key: Vec<u8>,
    /// Identity provider settings
    pub oidc: OidcConfig,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("environment", &self.environment)
            .field("http_port", &self.http_port)
            .field("database", &self.database)
            .field("logging", &self.logging)
            .field("auth", &self.auth)
            .field("encryption_key", &"[REDACTED]")
            .field("oidc", &self.oidc)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but malformed, or if a
    /// production deployment is missing a required secret
    pub fn from_env() -> AppResult<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`]
    pub fn from_source<F>(get: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let environment = lookup("APP_ENV")
            .map(|v| Environment::from_str_or_default(&v))
            .unwrap_or_default();

        let http_port = parse_or("HTTP_PORT", lookup("HTTP_PORT"), DEFAULT_HTTP_PORT)?;

        let database = DatabaseConfig {
            url: if environment.is_testing() {
                TESTING_DATABASE_URL.to_owned()
            } else {
                lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned())
            },
        };

        let logging = LoggingConfig {
            level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
            format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            file: lookup("LOG_FILE").map(PathBuf::from),
        };

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => {
                return Err(AppError::config("JWT_SECRET must be set in production"));
            }
            None => {
                warn!("JWT_SECRET not set, generating an ephemeral session secret");
                STANDARD.encode(generate_encryption_key())
            }
        };

        let auth = AuthConfig {
            jwt_secret,
            session_ttl_hours: parse_or(
                "SESSION_TTL_HOURS",
                lookup("SESSION_TTL_HOURS"),
                DEFAULT_SESSION_TTL_HOURS,
            )?,
            bcrypt_cost: parse_or("BCRYPT_COST", lookup("BCRYPT_COST"), bcrypt::DEFAULT_COST)?,
            default_admin_password: lookup("DEFAULT_ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_owned()),
        };

        let encryption_key = match lookup("ENCRYPTION_KEY") {
            Some(encoded) => decode_encryption_key(&encoded)?,
            None if environment.is_production() => {
                return Err(AppError::config("ENCRYPTION_KEY must be set in production"));
            }
            None => {
                warn!("ENCRYPTION_KEY not set, secrets stored this run will not survive a restart");
                generate_encryption_key().to_vec()
            }
        };

        let oidc = OidcConfig {
            hydra_admin_url: lookup("HYDRA_ADMIN_URL").unwrap_or_default(),
            hydra_admin_token: lookup("HYDRA_ADMIN_TOKEN").unwrap_or_default(),
            hydra_public_url: lookup("HYDRA_PUBLIC_URL").unwrap_or_default(),
            app_url: lookup("APP_URL").unwrap_or_default(),
            frontend_url: lookup("FRONTEND_URL").unwrap_or_default(),
            http_timeout: Duration::from_secs(parse_or(
                "HTTP_TIMEOUT_SECS",
                lookup("HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        };

        Ok(Self {
            environment,
            http_port,
            database,
            logging,
            auth,
            encryption_key,
            oidc,
        })
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> AppResult<T> {
    value.map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|_| AppError::config(format!("Invalid value for {key}: {raw}")))
    })
}

fn decode_encryption_key(encoded: &str) -> AppResult<Vec<u8>> {
    let key = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::config(format!("ENCRYPTION_KEY is not valid base64: {e}")))?;
    if key.len() != 32 {
        return Err(AppError::config(format!(
            "ENCRYPTION_KEY must decode to 32 bytes, got {}",
            key.len()
        )));
    }
    Ok(key)
}
