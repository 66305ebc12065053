// Application configuration
// Loaded once at startup from environment variables (optionally via a .env file)

use secrecy::{ExposeSecret, SecretString};
use std::str::FromStr;

/// Default token lifetime: 7 days
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Default minimum password length enforced at registration
pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Which store implementation backs users and customers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasswordHashConfig {
    /// OWASP minimum for Argon2id: 19 MiB, 2 iterations, 1 lane
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
        }
    }
}

/// Runtime configuration injected into the application state at startup
#[derive(Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<SecretString>,
    pub database_max_connections: u32,
    pub jwt_secret: SecretString,
    pub token_ttl_secs: i64,
    pub password_min_length: usize,
    pub password_hash: PasswordHashConfig,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// `JWT_SECRET` has no default: a missing or blank secret is an error.
    /// `DATABASE_URL` is only required for the postgres backend.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = match get("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>().map_err(|reason| ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                reason,
            })?,
            None => StorageBackend::Postgres,
        };

        let database_url = get("DATABASE_URL").map(SecretString::from);
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = get("JWT_SECRET")
            .map(SecretString::from)
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl_secs = parse_or(&get, "JWT_EXPIRATION_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        if token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRATION_SECS",
                reason: "must be positive".to_string(),
            });
        }

        let password_min_length =
            parse_or(&get, "PASSWORD_MIN_LENGTH", DEFAULT_PASSWORD_MIN_LENGTH)?;
        if password_min_length == 0 {
            return Err(ConfigError::Invalid {
                name: "PASSWORD_MIN_LENGTH",
                reason: "must be at least 1".to_string(),
            });
        }

        let defaults = PasswordHashConfig::default();
        let password_hash = PasswordHashConfig {
            memory_kib: parse_or(&get, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&get, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 5000)?,
            storage,
            database_url,
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            token_ttl_secs,
            password_min_length,
            password_hash,
            cors_allowed_origins,
        };

        if config.jwt_secret.expose_secret().len() < 32 {
            tracing::warn!("JWT_SECRET is shorter than 32 characters; use a longer secret in production");
        }

        Ok(config)
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
