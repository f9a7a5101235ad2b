use std::{future::Future, time::Duration};

use anyhow::Result;
use sea_orm::{DatabaseConnection, SqlxPostgresConnector};
use sqlx::postgres::PgPoolOptions;

use crate::error::{AppError, AppResult};

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

/// Upper bound for every store call.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(QUERY_TIMEOUT)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Wrap an existing sqlx pool in a SeaORM connection so both share connections.
pub fn orm_from_pool(pool: &DbPool) -> OrmConn {
    SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone())
}

/// Run a store call under [`QUERY_TIMEOUT`]. Expiry is reported as
/// [`AppError::Timeout`] and is never retried.
pub async fn bounded<T, E, F>(fut: F) -> AppResult<T>
where
    F: Future<Output = Result<T, E>>,
    AppError: From<E>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::Timeout),
    }
}

/// Apply `migrations/` through sqlx, which records each file in `_sqlx_migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
