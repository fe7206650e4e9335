use sea_orm::ConnectOptions;
use std::time::Duration;
use tracing::log::LevelFilter;

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_parse_or, env_required};

/// Connection pool for the catalog database.
///
/// Every catalog write holds one pooled connection for the length of its
/// transaction, so `max_connections` bounds concurrent writes.
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    /// Wait for a free pooled connection before failing the request
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    /// Log every statement through sqlx at debug level
    pub log_statements: bool,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout: Duration::from_secs(8),
            acquire_timeout: Duration::from_secs(8),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(1800),
            log_statements: false,
        }
    }

    pub fn into_connect_options(self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.url);
        options
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .sqlx_logging(self.log_statements)
            .sqlx_logging_level(LevelFilter::Debug);
        options
    }
}

#[cfg(feature = "config")]
fn env_secs(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    env_parse_or(key, default.as_secs()).map(Duration::from_secs)
}

/// `DATABASE_URL` is required. Pool knobs: `DB_MAX_CONNECTIONS` (20),
/// `DB_MIN_CONNECTIONS` (2), `DB_CONNECT_TIMEOUT_SECS` (8),
/// `DB_ACQUIRE_TIMEOUT_SECS` (8), `DB_IDLE_TIMEOUT_SECS` (300),
/// `DB_MAX_LIFETIME_SECS` (1800), `DB_SQLX_LOGGING` (false).
#[cfg(feature = "config")]
impl FromEnv for PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base = Self::new(env_required("DATABASE_URL")?);

        Ok(Self {
            max_connections: env_parse_or("DB_MAX_CONNECTIONS", base.max_connections)?,
            min_connections: env_parse_or("DB_MIN_CONNECTIONS", base.min_connections)?,
            connect_timeout: env_secs("DB_CONNECT_TIMEOUT_SECS", base.connect_timeout)?,
            acquire_timeout: env_secs("DB_ACQUIRE_TIMEOUT_SECS", base.acquire_timeout)?,
            idle_timeout: env_secs("DB_IDLE_TIMEOUT_SECS", base.idle_timeout)?,
            max_lifetime: env_secs("DB_MAX_LIFETIME_SECS", base.max_lifetime)?,
            log_statements: env_parse_or("DB_SQLX_LOGGING", base.log_statements)?,
            ..base
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_defaults() {
        let config = PostgresConfig::new("postgres://localhost/catalog");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.acquire_timeout, Duration::from_secs(8));
        assert!(!config.log_statements);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_pool_knobs_from_env() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/catalog")),
                ("DB_MAX_CONNECTIONS", Some("50")),
                ("DB_ACQUIRE_TIMEOUT_SECS", Some("2")),
                ("DB_SQLX_LOGGING", Some("true")),
            ],
            || {
                let config = PostgresConfig::from_env().unwrap();
                assert_eq!(config.url, "postgres://localhost/catalog");
                assert_eq!(config.max_connections, 50);
                assert_eq!(config.min_connections, 2);
                assert_eq!(config.acquire_timeout, Duration::from_secs(2));
                assert!(config.log_statements);
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_database_url_is_required() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = PostgresConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_unparsable_pool_size_names_the_variable() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/catalog")),
                ("DB_MAX_CONNECTIONS", Some("lots")),
            ],
            || {
                let err = PostgresConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
            },
        );
    }
}
