//! `collect` command and the run-recording wrapper shared with the scheduler.

use std::sync::Arc;

use rankwatch_core::{AppConfig, DailyCollectionResult, TrackedProduct};
use rankwatch_db::RunTotals;
use rankwatch_tracker::{BudgetAllocator, DailyCollector, PgStore};

use crate::fail_run_best_effort;

const RUN_TYPE: &str = "rankings";

/// Collects ranks once and prints the run summary and budget status.
///
/// With `product_filter` only that product is collected; it must exist, be
/// active, and carry an external id. `dry_run` probes without writing rank
/// history or a collection run record.
///
/// # Errors
///
/// Returns an error if the filtered product cannot be resolved, the search
/// client cannot be built, the product list cannot be loaded, or the run
/// record cannot be created.
pub(crate) async fn run_collect(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    product_filter: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let products = match product_filter {
        Some(external_id) => Some(vec![load_product(pool, external_id).await?]),
        None => None,
    };

    let budget = Arc::new(BudgetAllocator::new(config.budget));
    let collector = crate::build_collector(pool, config, budget)?.dry_run(dry_run);

    let summary = run_collection(pool, &collector, products.as_deref(), "cli", !dry_run).await?;

    if dry_run {
        println!("dry-run: nothing was written");
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("{}", serde_json::to_string_pretty(&collector.budget().status())?);
    Ok(())
}

async fn load_product(pool: &sqlx::PgPool, external_id: &str) -> anyhow::Result<TrackedProduct> {
    PgStore::new(pool.clone())
        .product_by_external_id(external_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no active product with external id '{external_id}'"))
}

/// Runs one collection, recording it in `collection_runs` when `record_run`
/// is set (`queued -> running -> succeeded|failed`).
///
/// `products` restricts the run to an explicit list; `None` collects every
/// active product.
pub(crate) async fn run_collection(
    pool: &sqlx::PgPool,
    collector: &DailyCollector,
    products: Option<&[TrackedProduct]>,
    trigger_source: &str,
    record_run: bool,
) -> anyhow::Result<DailyCollectionResult> {
    if !record_run {
        return collect(collector, products).await;
    }

    let run = rankwatch_db::create_collection_run(pool, RUN_TYPE, trigger_source).await?;
    if let Err(e) = rankwatch_db::start_collection_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let summary = finish_run(pool, run.id, collect(collector, products).await).await?;
    tracing::info!(run_id = run.id, public_id = %run.public_id, "rankings run recorded");
    Ok(summary)
}

/// Moves a `running` run to its terminal status from the collection outcome.
///
/// A run whose completion cannot be recorded is marked failed so it never
/// stays `running`.
pub(crate) async fn finish_run(
    pool: &sqlx::PgPool,
    run_id: i64,
    outcome: anyhow::Result<DailyCollectionResult>,
) -> anyhow::Result<DailyCollectionResult> {
    match outcome {
        Ok(summary) => {
            if let Err(e) =
                rankwatch_db::complete_collection_run(pool, run_id, RunTotals::from(&summary)).await
            {
                fail_run_best_effort(pool, run_id, format!("{e:#}")).await;
                return Err(e.into());
            }
            Ok(summary)
        }
        Err(e) => {
            fail_run_best_effort(pool, run_id, format!("{e:#}")).await;
            Err(e)
        }
    }
}

async fn collect(
    collector: &DailyCollector,
    products: Option<&[TrackedProduct]>,
) -> anyhow::Result<DailyCollectionResult> {
    match products {
        Some(products) => Ok(collector.collect_products(products).await),
        None => Ok(collector.collect_daily_rankings().await?),
    }
}
