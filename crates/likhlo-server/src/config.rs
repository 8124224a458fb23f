use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me", "secret"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is unset or still a placeholder")]
    MissingSecret,

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub token_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingSecret);
        }

        let database_path = lookup("DATABASE_URL")
            .unwrap_or_else(|| "likhlo.db".into())
            .into();
        let host = lookup("LIKHLO_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or("LIKHLO_PORT", lookup("LIKHLO_PORT"), 3000u16)?;
        let ttl_hours = parse_or("LIKHLO_TOKEN_TTL_HOURS", lookup("LIKHLO_TOKEN_TTL_HOURS"), 720i64)?;
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "LIKHLO_TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
            });
        }

        Ok(Self {
            database_path,
            jwt_secret,
            host,
            port,
            token_ttl: chrono::Duration::hours(ttl_hours),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            var: "LIKHLO_HOST",
            value: raw,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { var, value }),
    }
}
