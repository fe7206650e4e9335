use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::PostgresConfig;
use crate::common::{Backoff, retry_with_backoff};

/// Open the pool with a single attempt.
pub async fn connect_from_config(config: PostgresConfig) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(config.into_connect_options()).await?;
    info!("Connected to PostgreSQL");
    Ok(db)
}

/// Open the pool, backing off while the database is still starting.
///
/// `None` uses [`Backoff::default`].
pub async fn connect_from_config_with_retry(
    config: PostgresConfig,
    backoff: Option<Backoff>,
) -> Result<DatabaseConnection, DbErr> {
    let policy = backoff.unwrap_or_default();
    retry_with_backoff(|| connect_from_config(config.clone()), &policy).await
}

/// Apply every pending migration of `M`.
pub async fn run_migrations<M: MigratorTrait>(
    db: &DatabaseConnection,
    app_name: &str,
) -> Result<(), DbErr> {
    info!(app = app_name, "Applying pending migrations");
    M::up(db, None).await?;
    info!(app = app_name, "Schema is up to date");
    Ok(())
}
