//! Long-running daily collection driven by `tokio-cron-scheduler`.
//!
//! One [`BudgetAllocator`] lives for the whole process so every scheduled
//! run draws from the same self-resetting daily budget.

use std::sync::Arc;

use rankwatch_core::AppConfig;
use rankwatch_tracker::{BudgetAllocator, DailyCollector};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::collect::run_collection;

/// Registers the daily job on `config.collect_cron` and blocks until ctrl-c.
///
/// # Errors
///
/// Returns an error if the collector cannot be built, the cron expression is
/// invalid, or the scheduler fails to start or shut down.
pub(crate) async fn run_schedule(pool: PgPool, config: Arc<AppConfig>) -> anyhow::Result<()> {
    let budget = Arc::new(BudgetAllocator::new(config.budget));
    let collector = Arc::new(crate::build_collector(&pool, &config, budget)?);

    let mut scheduler = JobScheduler::new().await?;
    register_collect_job(&scheduler, pool, collector, &config.collect_cron).await?;
    scheduler.start().await?;
    tracing::info!(cron = %config.collect_cron, "scheduler: started; waiting for ctrl-c");

    tokio::signal::ctrl_c().await?;
    tracing::info!("scheduler: shutting down");
    scheduler.shutdown().await?;
    Ok(())
}

async fn register_collect_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    collector: Arc<DailyCollector>,
    cron: &str,
) -> anyhow::Result<()> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = pool.clone();
        let collector = Arc::clone(&collector);

        Box::pin(async move {
            tracing::info!("scheduler: starting daily rank collection");
            match run_collection(&pool, &collector, None, "scheduler", true).await {
                Ok(summary) => tracing::info!(
                    products = summary.total_products,
                    keywords = summary.total_keywords,
                    api_calls = summary.total_api_calls,
                    skipped = summary.skipped_products,
                    failed = summary.failed_products,
                    "scheduler: daily rank collection complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: daily rank collection failed"),
            }

            match serde_json::to_string(&collector.budget().status()) {
                Ok(status) => tracing::info!(budget = %status, "scheduler: budget status"),
                Err(e) => {
                    tracing::warn!(error = %e, "scheduler: failed to serialize budget status");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
