use rankwatch_db::DbError;
use thiserror::Error;

/// Failures that abort a whole collection run.
///
/// Keyword- and product-level failures never surface here; they are
/// absorbed into degraded results and the run's `failed_products` count.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("failed to load active products: {0}")]
    ProductList(#[source] DbError),
}
