//! Postgres pool for the notifier.
//!
//! Every connection is tagged with the service name and carries a statement
//! timeout, so a stuck query cannot hold a sweep (and its claim leases)
//! open indefinitely.

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

pub type DbPool = PgPool;

/// `application_name` reported in `pg_stat_activity`
pub const APPLICATION_NAME: &str = "order-notifier";

pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    log::info!("Connecting to database...");

    let statement_timeout_ms = config.statement_timeout.as_millis();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query("SET timezone = 'UTC'").execute(&mut *conn).await?;
                sqlx::query(&format!("SET application_name = '{}'", APPLICATION_NAME))
                    .execute(&mut *conn)
                    .await?;
                sqlx::query(&format!("SET statement_timeout = {}", statement_timeout_ms))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;

    log::info!(
        "Database pool ready (max: {}, min: {}, statement timeout: {:?})",
        config.max_connections,
        config.min_connections,
        config.statement_timeout
    );

    Ok(pool)
}

/// Applies the notifier schema: settings, collaborator tables and the
/// notification outbox
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await?;

    log::info!("Database migrations completed successfully");
    Ok(())
}

/// Readiness probe: the outbox table must be reachable, not just the server
pub async fn health_check(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1 FROM whatsapp_notifications LIMIT 1")
        .execute(pool)
        .await
        .is_ok()
}
