use sqlx::PgPool;

use crate::DbError;

/// Returns the active tracked keywords for a product, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_tracked_keywords(pool: &PgPool, product_id: i64) -> Result<Vec<String>, DbError> {
    let keywords = sqlx::query_scalar::<_, String>(
        "SELECT keyword FROM tracked_keywords \
         WHERE product_id = $1 AND is_active = TRUE \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(keywords)
}
