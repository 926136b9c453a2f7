use std::fmt::Display;
use std::str::FromStr;

use axum::http::HeaderValue;
use shortlink_core::codec::Universe;
use shortlink_core::idgen::IdSpace;
use shortlink_core::session::SECS_PER_DAY;

/// Default shortcode alphabet: digits, then lower-case, then upper-case letters.
pub const DEFAULT_UNIVERSE: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Longest session lifetime accepted, in days.
pub const MAX_SESSION_AGE_DAYS: i64 = 3650;

/// Shortest cookie secret accepted, in bytes.
pub const MIN_COOKIE_SECRET_LEN: usize = 32;

/// A missing or unparseable configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Session cookie settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session lifetime in days (default: `7`).
    pub max_age_days: i64,
    /// HMAC key for the session cookie. Never logged.
    pub cookie_secret: String,
    /// Add the `Secure` attribute to the cookie (default: `false`).
    pub secure_cookies: bool,
}

impl SessionConfig {
    pub fn max_age_secs(&self) -> i64 {
        self.max_age_days * SECS_PER_DAY
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the cookie secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// SQLite connection string (default: `sqlite://shortlink.db`).
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Shortcode alphabet and maximum length.
    pub id_space: IdSpace,
    pub session: SessionConfig,
    /// Minimum password length at registration (default: `8`).
    pub password_min_length: usize,
    /// How often expired sessions are purged (default: `3600`).
    pub session_reaper_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                        | Default                  |
    /// |--------------------------------|--------------------------|
    /// | `HOST`                         | `0.0.0.0`                |
    /// | `PORT`                         | `3000`                   |
    /// | `DATABASE_URL`                 | `sqlite://shortlink.db`  |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                     |
    /// | `SHORTCODE_UNIVERSE`           | `0-9a-zA-Z`              |
    /// | `SHORTCODE_LENGTH`             | `6`                      |
    /// | `SESSION_MAX_AGE_DAYS`         | `7`                      |
    /// | `COOKIE_SECRET`                | required, >= 32 bytes    |
    /// | `SECURE_COOKIES`               | `false`                  |
    /// | `PASSWORD_MIN_LENGTH`          | `8`                      |
    /// | `SESSION_REAPER_INTERVAL_SECS` | `3600`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "PORT", 3000u16)?;
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://shortlink.db".into());

        let cors_raw = lookup("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:5173".into());
        let cors_origins: Vec<String> = cors_raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            if let Err(e) = origin.parse::<HeaderValue>() {
                return Err(invalid("CORS_ORIGINS", origin, e));
            }
        }

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;

        let universe_raw = lookup("SHORTCODE_UNIVERSE").unwrap_or_else(|| DEFAULT_UNIVERSE.into());
        let universe =
            Universe::new(&universe_raw).map_err(|e| invalid("SHORTCODE_UNIVERSE", &universe_raw, e))?;
        let shortcode_length = parse_or(&lookup, "SHORTCODE_LENGTH", 6u32)?;
        let id_space = IdSpace::new(universe, shortcode_length)
            .map_err(|e| invalid("SHORTCODE_LENGTH", &shortcode_length.to_string(), e))?;

        let max_age_days = parse_or(&lookup, "SESSION_MAX_AGE_DAYS", 7i64)?;
        if max_age_days <= 0 {
            return Err(invalid(
                "SESSION_MAX_AGE_DAYS",
                &max_age_days.to_string(),
                "must be positive",
            ));
        }
        if max_age_days > MAX_SESSION_AGE_DAYS {
            return Err(invalid(
                "SESSION_MAX_AGE_DAYS",
                &max_age_days.to_string(),
                format!("must be at most {MAX_SESSION_AGE_DAYS}"),
            ));
        }
        let cookie_secret = lookup("COOKIE_SECRET").ok_or(ConfigError::Missing {
            name: "COOKIE_SECRET",
        })?;
        if cookie_secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "COOKIE_SECRET",
                value: "<redacted>".into(),
                reason: format!("must be at least {MIN_COOKIE_SECRET_LEN} bytes"),
            });
        }
        let secure_cookies = parse_or(&lookup, "SECURE_COOKIES", false)?;

        let password_min_length = parse_or(&lookup, "PASSWORD_MIN_LENGTH", 8usize)?;
        let session_reaper_interval_secs =
            parse_or(&lookup, "SESSION_REAPER_INTERVAL_SECS", 3600u64)?;
        if session_reaper_interval_secs == 0 {
            return Err(invalid(
                "SESSION_REAPER_INTERVAL_SECS",
                "0",
                "must be positive",
            ));
        }

        Ok(Self {
            host,
            port,
            database_url,
            cors_origins,
            request_timeout_secs,
            id_space,
            session: SessionConfig {
                max_age_days,
                cookie_secret,
                secure_cookies,
            },
            password_min_length,
            session_reaper_interval_secs,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| invalid(name, &raw, e)),
    }
}

fn invalid(name: &'static str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
