//! Database operations for `rank_history`.
//!
//! Rows are append-only. A product's batch is written with
//! [`insert_rank_results`] inside one transaction so readers never see half
//! of a product's keywords for a run.

use chrono::{DateTime, Utc};
use rankwatch_core::RankResult;
use sqlx::{PgExecutor, PgPool};

use crate::{to_db_int, DbError};

/// A row from the `rank_history` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankHistoryRow {
    pub id: i64,
    pub product_external_id: String,
    pub keyword: String,
    /// `NULL` when the product was not found within `rank_limit`.
    pub rank: Option<i32>,
    pub rank_limit: i32,
    pub checked_at: DateTime<Utc>,
    pub api_calls: i32,
}

impl RankHistoryRow {
    #[must_use]
    pub fn rank_u32(&self) -> Option<u32> {
        self.rank.and_then(|r| u32::try_from(r).ok())
    }
}

async fn insert_row<'e, E>(
    executor: E,
    product_external_id: &str,
    rank_limit: u32,
    result: &RankResult,
) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO rank_history \
             (product_external_id, keyword, rank, rank_limit, checked_at, api_calls) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(product_external_id)
    .bind(&result.keyword)
    .bind(result.rank.map(to_db_int))
    .bind(to_db_int(rank_limit))
    .bind(result.checked_at)
    .bind(to_db_int(result.api_calls_used))
    .execute(executor)
    .await?;

    Ok(())
}

/// Inserts a single rank observation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_rank_result(
    pool: &PgPool,
    product_external_id: &str,
    rank_limit: u32,
    result: &RankResult,
) -> Result<(), DbError> {
    insert_row(pool, product_external_id, rank_limit, result).await
}

/// Inserts every observation of one product's batch in a single transaction.
///
/// Either all rows become visible or none do. Returns the number of rows
/// written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction cannot be opened, any insert
/// fails, or the commit fails. Nothing is written in that case.
pub async fn insert_rank_results(
    pool: &PgPool,
    product_external_id: &str,
    rank_limit: u32,
    results: &[RankResult],
) -> Result<u64, DbError> {
    if results.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for result in results {
        insert_row(&mut *tx, product_external_id, rank_limit, result).await?;
    }
    tx.commit().await?;

    Ok(results.len() as u64)
}

/// Returns the most recent `limit` observations for one (product, keyword)
/// pair, oldest first, so consecutive rows can be compared directly.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_rank_history(
    pool: &PgPool,
    product_external_id: &str,
    keyword: &str,
    limit: i64,
) -> Result<Vec<RankHistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, RankHistoryRow>(
        "SELECT id, product_external_id, keyword, rank, rank_limit, checked_at, api_calls \
         FROM ( \
             SELECT id, product_external_id, keyword, rank, rank_limit, checked_at, api_calls \
             FROM rank_history \
             WHERE product_external_id = $1 AND keyword = $2 \
             ORDER BY checked_at DESC, id DESC \
             LIMIT $3 \
         ) recent \
         ORDER BY checked_at ASC, id ASC",
    )
    .bind(product_external_id)
    .bind(keyword)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
