//! Collaborator seams between the tracker and durable storage.
//!
//! [`RankRepository`] supplies work and accepts results; [`ErrorSink`]
//! records probes that exhausted their retries. [`PgStore`] implements both
//! on top of `rankwatch-db`.

use async_trait::async_trait;
use rankwatch_core::{ErrorLogEntry, RankResult, TrackedProduct};
use rankwatch_db::{DbError, ProductRow};
use sqlx::PgPool;

#[async_trait]
pub trait RankRepository: Send + Sync {
    /// Active products that carry a search-engine identity, in processing order.
    async fn active_products(&self) -> Result<Vec<TrackedProduct>, DbError>;

    async fn tracked_keywords(&self, product: &TrackedProduct) -> Result<Vec<String>, DbError>;

    /// Persists one product's batch so that every row becomes visible at once.
    async fn save_batch(
        &self,
        product_external_id: &str,
        rank_limit: u32,
        results: &[RankResult],
    ) -> Result<u64, DbError>;
}

#[async_trait]
pub trait ErrorSink: Send + Sync {
    async fn record(&self, entry: &ErrorLogEntry) -> Result<(), DbError>;
}

/// Postgres-backed [`RankRepository`] and [`ErrorSink`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Looks up one active, trackable product by its search-engine identity.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn product_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<TrackedProduct>, DbError> {
        let row = rankwatch_db::get_product_by_external_id(&self.pool, external_id).await?;
        Ok(row.filter(|r| r.is_active).and_then(trackable))
    }
}

fn trackable(row: ProductRow) -> Option<TrackedProduct> {
    let external_id = row.external_id.filter(|id| !id.trim().is_empty())?;
    Some(TrackedProduct {
        id: row.id,
        external_id,
        name: row.name,
        representative_keyword: row.representative_keyword.filter(|k| !k.trim().is_empty()),
    })
}

#[async_trait]
impl RankRepository for PgStore {
    async fn active_products(&self) -> Result<Vec<TrackedProduct>, DbError> {
        let rows = rankwatch_db::list_active_products(&self.pool).await?;

        let products = rows
            .into_iter()
            .filter_map(|row| {
                let (id, name) = (row.id, row.name.clone());
                let product = trackable(row);
                if product.is_none() {
                    tracing::warn!(
                        product_id = id,
                        name = %name,
                        "product has no external_id; not trackable"
                    );
                }
                product
            })
            .collect();

        Ok(products)
    }

    async fn tracked_keywords(&self, product: &TrackedProduct) -> Result<Vec<String>, DbError> {
        rankwatch_db::list_tracked_keywords(&self.pool, product.id).await
    }

    async fn save_batch(
        &self,
        product_external_id: &str,
        rank_limit: u32,
        results: &[RankResult],
    ) -> Result<u64, DbError> {
        rankwatch_db::insert_rank_results(&self.pool, product_external_id, rank_limit, results)
            .await
    }
}

#[async_trait]
impl ErrorSink for PgStore {
    async fn record(&self, entry: &ErrorLogEntry) -> Result<(), DbError> {
        rankwatch_db::insert_rank_check_error(&self.pool, entry).await
    }
}
