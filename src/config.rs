//! Application settings read from the environment (and `.env` when present).

use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/figurines";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub url: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub uploads_dir: PathBuf,
    /// `local` turns on query logging.
    pub env: String,
    pub frontend_url: Option<String>,
    pub currency_sign: String,
    pub seed_admin: Option<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = get("APP_PORT").ok_or(ConfigError::Missing("APP_PORT"))?;
        let port = port.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
            key: "APP_PORT",
            message: e.to_string(),
        })?;
        let url = get("APP_URL").ok_or(ConfigError::Missing("APP_URL"))?;
        let jwt_secret = get("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                message: format!("expected a positive integer, got '{}'", v),
            })?,
            None => 5,
        };
        let jwt_ttl_secs = match get("JWT_TTL_SECS") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "JWT_TTL_SECS",
                message: format!("expected seconds, got '{}'", v),
            })?,
            None => 3600,
        };

        let seed_admin = match (get("SEED_ADMIN_EMAIL"), get("SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(AppConfig {
            port,
            url,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            db_max_connections,
            jwt_secret,
            jwt_ttl_secs,
            uploads_dir: PathBuf::from(get("UPLOADS_DIR").unwrap_or_else(|| "uploads".into())),
            env: get("APP_ENV").unwrap_or_else(|| "production".into()),
            frontend_url: get("FRONTEND_URL"),
            currency_sign: get("CURRENCY_SIGN").unwrap_or_else(|| "RON".into()),
            seed_admin,
        })
    }

    pub fn is_local(&self) -> bool {
        self.env == "local"
    }
}
