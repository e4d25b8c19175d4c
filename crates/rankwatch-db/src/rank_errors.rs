//! Durable error log for failed rank probes (`rank_check_errors`).

use chrono::{DateTime, Utc};
use rankwatch_core::ErrorLogEntry;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `rank_check_errors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankCheckErrorRow {
    pub id: i64,
    pub keyword: String,
    pub product_external_id: String,
    pub error_code: String,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}

/// Appends one entry to the error log.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_rank_check_error(pool: &PgPool, entry: &ErrorLogEntry) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO rank_check_errors \
             (keyword, product_external_id, error_code, error_message, created_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&entry.keyword)
    .bind(&entry.product_id)
    .bind(&entry.error_code)
    .bind(&entry.error_message)
    .bind(entry.timestamp)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the most recent `limit` error log entries, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_rank_check_errors(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<RankCheckErrorRow>, DbError> {
    let rows = sqlx::query_as::<_, RankCheckErrorRow>(
        "SELECT id, keyword, product_external_id, error_code, error_message, created_at \
         FROM rank_check_errors \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
