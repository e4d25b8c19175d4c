//! Daily collection across every active product.
//!
//! Products are processed one after another. Before each product the
//! `ranking` budget is consulted; once it refuses, the remaining products
//! are skipped for this run. A product whose keyword lookup or persistence
//! fails is counted and the run moves on. Only failing to load the product
//! list aborts the run.

use std::sync::Arc;

use rankwatch_core::{BudgetFeature, DailyCollectionResult, RankCheckConfig, TrackedProduct};
use tokio::time::Instant;

use crate::budget::BudgetAllocator;
use crate::checker::RankChecker;
use crate::error::TrackerError;
use crate::store::RankRepository;

pub struct DailyCollector {
    checker: RankChecker,
    repository: Arc<dyn RankRepository>,
    config: RankCheckConfig,
    dry_run: bool,
}

impl DailyCollector {
    #[must_use]
    pub fn new(
        checker: RankChecker,
        repository: Arc<dyn RankRepository>,
        config: RankCheckConfig,
    ) -> Self {
        Self {
            checker,
            repository,
            config,
            dry_run: false,
        }
    }

    /// Probe and report without writing rank history.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn budget(&self) -> &Arc<BudgetAllocator> {
        self.checker.budget()
    }

    #[must_use]
    pub fn checker(&self) -> &RankChecker {
        &self.checker
    }

    /// Collects ranks for every active product.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::ProductList`] if the active products cannot be
    /// loaded. Every later failure is absorbed into the returned totals.
    pub async fn collect_daily_rankings(&self) -> Result<DailyCollectionResult, TrackerError> {
        let products = self
            .repository
            .active_products()
            .await
            .map_err(TrackerError::ProductList)?;

        Ok(self.collect_products(&products).await)
    }

    /// Collects ranks for an explicit product list, in order.
    pub async fn collect_products(&self, products: &[TrackedProduct]) -> DailyCollectionResult {
        let started = Instant::now();
        let mut summary = DailyCollectionResult::default();
        tracing::info!(
            products = products.len(),
            dry_run = self.dry_run,
            "daily collection starting"
        );

        for (index, product) in products.iter().enumerate() {
            if !self.budget().can_make_call(BudgetFeature::Ranking) {
                let remaining = products.len() - index;
                summary.skipped_products = u32::try_from(remaining).unwrap_or(u32::MAX);
                tracing::warn!(
                    skipped = remaining,
                    next_product = %product.external_id,
                    "ranking budget exhausted; stopping collection"
                );
                break;
            }

            let keywords = match self.resolve_keywords(product).await {
                Ok(keywords) => keywords,
                Err(e) => {
                    summary.failed_products += 1;
                    tracing::error!(
                        product = %product.external_id,
                        error = %e,
                        "failed to load tracked keywords; skipping product"
                    );
                    continue;
                }
            };

            if keywords.is_empty() {
                tracing::info!(
                    product = %product.external_id,
                    "no tracked or representative keyword; skipping product"
                );
                continue;
            }

            let batch = self
                .checker
                .collect_product_ranks(&product.external_id, &keywords, &self.config)
                .await;
            summary.total_api_calls = summary.total_api_calls.saturating_add(batch.total_api_calls);

            if !self.dry_run {
                let observed: Vec<_> = batch
                    .results
                    .iter()
                    .filter(|r| !r.is_degraded())
                    .cloned()
                    .collect();
                if let Err(e) = self
                    .repository
                    .save_batch(&product.external_id, self.config.rank_check_limit, &observed)
                    .await
                {
                    summary.failed_products += 1;
                    tracing::error!(
                        product = %product.external_id,
                        error = %e,
                        "failed to persist rank batch; continuing with next product"
                    );
                    continue;
                }
            }

            summary.total_products += 1;
            summary.total_keywords = summary
                .total_keywords
                .saturating_add(u32::try_from(keywords.len()).unwrap_or(u32::MAX));
        }

        summary.execution_time_ms =
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            products = summary.total_products,
            keywords = summary.total_keywords,
            api_calls = summary.total_api_calls,
            skipped = summary.skipped_products,
            failed = summary.failed_products,
            execution_time_ms = summary.execution_time_ms,
            "daily collection complete"
        );
        summary
    }

    /// Tracked keywords, else the representative keyword, else nothing.
    async fn resolve_keywords(
        &self,
        product: &TrackedProduct,
    ) -> Result<Vec<String>, rankwatch_db::DbError> {
        let keywords = self.repository.tracked_keywords(product).await?;
        if !keywords.is_empty() {
            return Ok(keywords);
        }
        Ok(product.representative_keyword.iter().cloned().collect())
    }
}

impl std::fmt::Debug for DailyCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyCollector")
            .field("checker", &self.checker)
            .field("config", &self.config)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}
