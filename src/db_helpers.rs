use std::time::Duration;

use sqlx::{pool::PoolConnection, postgres::PgPoolOptions, postgres::PgRow, Arguments};

use crate::{config, errors};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_BALANCE_RECORDS: &str = r"CREATE TABLE IF NOT EXISTS balance_records (
    id SERIAL PRIMARY KEY,
    address TEXT NOT NULL,
    token_address TEXT NULL,
    balance TEXT NOT NULL,
    balance_eth TEXT NOT NULL,
    fetched_at TIMESTAMP NOT NULL
)";

// Tables created before token balances were stored have no token_address column
const ADD_TOKEN_ADDRESS: &str =
    "ALTER TABLE balance_records ADD COLUMN IF NOT EXISTS token_address TEXT NULL";

pub type DBConnection = PoolConnection<sqlx::Postgres>;

/// Builds the pool without touching the database, so the server comes up even when it is down.
pub fn connect_lazy(config: &config::Config) -> crate::Result<sqlx::Pool<sqlx::Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_lazy(&config.database_url)?;
    Ok(pool)
}

pub async fn ensure_schema(pool: &sqlx::Pool<sqlx::Postgres>) -> crate::Result<()> {
    let mut conn = acquire(pool).await?;
    for statement in [CREATE_BALANCE_RECORDS, ADD_TOKEN_ADDRESS] {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    tracing::info!(target: crate::LOGGER_MSG, "Database schema is up to date");
    Ok(())
}

/// The connection goes back to the pool when the handle drops.
pub(crate) async fn acquire(pool: &sqlx::Pool<sqlx::Postgres>) -> crate::Result<DBConnection> {
    pool.acquire().await.map_err(|e| {
        tracing::warn!(target: crate::LOGGER_MSG, "Failed to acquire DB connection: {}", e);
        errors::ErrorKind::DBError(format!("Database connection failed: {}", e)).into()
    })
}

pub(crate) async fn check_connection(pool: &sqlx::Pool<sqlx::Postgres>) -> crate::Result<()> {
    let mut conn = acquire(pool).await?;
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    Ok(())
}

pub(crate) async fn select<T: Send + Unpin + for<'r> sqlx::FromRow<'r, PgRow>>(
    conn: &mut sqlx::PgConnection,
    query: &str,
    substitution_items: &[String],
) -> crate::Result<Vec<T>> {
    tracing::info!(
        target: crate::LOGGER_MSG,
        "DB request:\n{}\nParams:{}",
        query,
        substitution_items.join(", ")
    );

    let mut args = sqlx::postgres::PgArguments::default();
    for item in substitution_items {
        args.add(item);
    }

    sqlx::query_as_with::<_, T, _>(query, args)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            tracing::warn!(
                target: crate::LOGGER_MSG,
                "Failed SELECT:\n{}\nParams:{}\nError: {}",
                query,
                substitution_items.join(", "),
                e
            );
            errors::ErrorKind::from(e).into()
        })
}
