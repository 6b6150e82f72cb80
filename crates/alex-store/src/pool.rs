use alex_domain::{Error, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Builds the Postgres connection pool and applies pending migrations.
/// Grounded on the original's class-level singleton pool, adapted to an
/// owned `PgPool` handed to `PostgresStore` at construction instead of a
/// lazily-initialized classmethod.
pub async fn connect(uri: &str, min: u32, max: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .min_connections(min)
        .max_connections(max)
        .connect(uri)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

    tracing::info!(pool_min = min, pool_max = max, "postgres pool created");
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}
