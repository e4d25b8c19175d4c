//! Postgres persistence for rank tracking.
//!
//! Pool setup and migrations live here; each table has its own module.

pub mod collection_runs;
pub mod keywords;
pub mod products;
pub mod rank_errors;
pub mod rank_history;

pub use collection_runs::{
    complete_collection_run, create_collection_run, fail_collection_run, get_collection_run,
    start_collection_run, CollectionRunRow, RunTotals,
};
pub use keywords::list_tracked_keywords;
pub use products::{get_product_by_external_id, list_active_products, ProductRow};
pub use rank_errors::{insert_rank_check_error, list_recent_rank_check_errors, RankCheckErrorRow};
pub use rank_history::{
    insert_rank_result, insert_rank_results, list_rank_history, RankHistoryRow,
};

use std::time::Duration;

use rankwatch_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/rankwatch-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Pool sizing. Built from [`AppConfig`] so the database settings are read
/// from the environment in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl From<&AppConfig> for PoolConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("collection run {id} is not in '{expected_status}' status")]
    InvalidCollectionRunTransition {
        id: i64,
        expected_status: &'static str,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Opens a pool against `database_url` with the given sizing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the connection cannot be established.
async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Opens the pool described by `config` and applies pending migrations.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the connection fails, or
/// [`DbError::Migration`] if a migration fails.
pub async fn connect(config: &AppConfig) -> Result<PgPool, DbError> {
    let pool = connect_pool(&config.database_url, PoolConfig::from(config)).await?;
    let applied = run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "database migrations applied");
    }
    Ok(pool)
}

/// Runs all pending migrations and returns how many were applied.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if any migration fails.
async fn run_migrations(pool: &PgPool) -> Result<usize, DbError> {
    // On a fresh database the bookkeeping table does not exist yet.
    let before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migrations(pool).await;
    Ok(usize::try_from((after - before).max(0)).unwrap_or(0))
}

async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Converts an unsigned counter to the `INTEGER` column type, saturating.
pub(crate) fn to_db_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
