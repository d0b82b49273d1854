pub mod models;
pub mod write;

use std::time::Duration;

use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config;
use crate::filter::{SqlParam, SqlResult};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Process-wide connection pool, created lazily from DATABASE_URL.
pub async fn pool() -> Result<PgPool, DatabaseError> {
    let pool = POOL
        .get_or_try_init(|| async {
            let url = std::env::var("DATABASE_URL")
                .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
            let cfg = &config::config().database;
            let pool = PgPoolOptions::new()
                .max_connections(cfg.max_connections)
                .acquire_timeout(Duration::from_secs(cfg.connection_timeout_secs))
                .connect(&url)
                .await?;
            info!("created database pool");
            Ok::<PgPool, DatabaseError>(pool)
        })
        .await?;
    Ok(pool.clone())
}

/// Pings the pool to ensure connectivity.
pub async fn health_check() -> Result<(), DatabaseError> {
    let pool = pool().await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(())
}

pub async fn fetch_all_as<'e, T, E>(executor: E, sql: &SqlResult) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    E: sqlx::PgExecutor<'e>,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in &sql.params {
        q = bind_param_as(q, p);
    }
    Ok(q.fetch_all(executor).await?)
}

pub async fn fetch_optional_as<'e, T, E>(
    executor: E,
    sql: &SqlResult,
) -> Result<Option<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    E: sqlx::PgExecutor<'e>,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in &sql.params {
        q = bind_param_as(q, p);
    }
    Ok(q.fetch_optional(executor).await?)
}

pub async fn fetch_one_as<'e, T, E>(executor: E, sql: &SqlResult) -> Result<T, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    E: sqlx::PgExecutor<'e>,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in &sql.params {
        q = bind_param_as(q, p);
    }
    Ok(q.fetch_one(executor).await?)
}

/// Runs a count query built by the filter layer; expects a `count` column.
pub async fn fetch_count<'e, E>(executor: E, sql: &SqlResult) -> Result<i64, DatabaseError>
where
    E: sqlx::PgExecutor<'e>,
{
    let mut q = sqlx::query(&sql.query);
    for p in &sql.params {
        q = bind_param(q, p);
    }
    let row = q.fetch_one(executor).await?;
    let count: i64 = row.try_get("count")?;
    Ok(count)
}

pub async fn execute<'e, E>(executor: E, sql: &SqlResult) -> Result<u64, DatabaseError>
where
    E: sqlx::PgExecutor<'e>,
{
    let mut q = sqlx::query(&sql.query);
    for p in &sql.params {
        q = bind_param(q, p);
    }
    Ok(q.execute(executor).await?.rows_affected())
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match p {
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Float(f) => q.bind(*f),
        SqlParam::Text(s) => q.bind(s.as_deref()),
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::Timestamp(t) => q.bind(*t),
        SqlParam::Json(v) => q.bind(v.clone()),
    }
}

fn bind_param_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match p {
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Float(f) => q.bind(*f),
        SqlParam::Text(s) => q.bind(s.as_deref()),
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::Timestamp(t) => q.bind(*t),
        SqlParam::Json(v) => q.bind(v.clone()),
    }
}
