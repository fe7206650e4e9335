//! Configuration for Products API

use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_parse_or, server::ServerConfig};
use database::postgres::PostgresConfig;
use domain_products::CatalogConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub environment: Environment,
    /// Apply pending migrations before serving (`RUN_MIGRATIONS`, default true)
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app: app_info!(),
            database: PostgresConfig::from_env()?,
            server: ServerConfig::from_env()?,
            catalog: CatalogConfig::from_env()?,
            environment: Environment::from_env(),
            run_migrations: env_parse_or("RUN_MIGRATIONS", true)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_products::SkuScope;

    #[test]
    fn test_requires_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/catalog")),
                ("RUN_MIGRATIONS", None),
                ("CATALOG_SKU_SCOPE", None),
                ("PORT", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.run_migrations);
                assert_eq!(config.catalog.sku_scope, SkuScope::Global);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.app.name, "products_api");
            },
        );
    }

    #[test]
    fn test_migrations_can_be_disabled() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/catalog")),
                ("RUN_MIGRATIONS", Some("false")),
            ],
            || {
                assert!(!Config::from_env().unwrap().run_migrations);
            },
        );
    }
}
