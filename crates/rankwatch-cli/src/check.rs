use std::sync::Arc;

use rankwatch_core::{AppConfig, RankCheckConfig};
use rankwatch_tracker::{BudgetAllocator, PgStore};

/// Probes one keyword for one product with retries and prints the result.
/// Nothing is written to rank history; an exhausted probe is still logged
/// to the error table.
///
/// # Errors
///
/// Returns an error if the search client cannot be built or the probe fails.
pub(crate) async fn run_check(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    keyword: &str,
    product: &str,
) -> anyhow::Result<()> {
    let budget = Arc::new(BudgetAllocator::new(config.budget));
    let store = Arc::new(PgStore::new(pool.clone()));
    let checker = crate::build_checker(&store, config, budget)?;

    let retries = checker.retry_policy().max_retries;
    let result = checker
        .with_retry(keyword, product, &RankCheckConfig::from(config), retries)
        .await?;

    match result.rank {
        Some(rank) => println!(
            "'{keyword}': product {product} ranked #{rank} ({} calls)",
            result.api_calls_used
        ),
        None => println!(
            "'{keyword}': product {product} not found within top {} ({} calls)",
            config.rank_check_limit, result.api_calls_used
        ),
    }
    Ok(())
}
