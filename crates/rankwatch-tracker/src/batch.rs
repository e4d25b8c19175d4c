//! Sequential per-product collection over a keyword list.

use chrono::Utc;
use rankwatch_core::{BatchRankResult, RankCheckConfig, RankResult};
use tokio::time::Instant;

use crate::checker::RankChecker;

impl RankChecker {
    /// Probes every keyword for one product, one at a time and in order.
    ///
    /// Always yields exactly one result per keyword. A keyword whose probe
    /// fails after retries gets a degraded entry (`rank: None`,
    /// `api_calls_used: 0`) and the batch moves on. `total_api_calls` counts
    /// calls of successful probes only. The keyword delay is applied between
    /// keywords and skipped after the last one.
    pub async fn collect_product_ranks(
        &self,
        product_id: &str,
        keywords: &[String],
        config: &RankCheckConfig,
    ) -> BatchRankResult {
        let started = Instant::now();
        let mut results = Vec::with_capacity(keywords.len());
        let mut total_api_calls: u32 = 0;

        for (index, keyword) in keywords.iter().enumerate() {
            match self
                .with_retry(keyword, product_id, config, self.retry.max_retries)
                .await
            {
                Ok(result) => {
                    total_api_calls = total_api_calls.saturating_add(result.api_calls_used);
                    results.push(result);
                }
                Err(e) => {
                    tracing::warn!(
                        product_id,
                        keyword = %keyword,
                        error = %e,
                        "keyword probe failed; recording degraded result"
                    );
                    results.push(RankResult::degraded(keyword, product_id, Utc::now()));
                }
            }

            if index + 1 < keywords.len() && !self.keyword_delay.is_zero() {
                tokio::time::sleep(self.keyword_delay).await;
            }
        }

        let execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            product_id,
            keywords = keywords.len(),
            total_api_calls,
            execution_time_ms,
            "product batch complete"
        );

        BatchRankResult {
            results,
            total_api_calls,
            execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rankwatch_core::RankCheckConfig;

    use crate::testing::{checker, FakeFailure, FakeSearch};

    fn config() -> RankCheckConfig {
        RankCheckConfig {
            rank_check_limit: 300,
            display_per_request: 100,
            rate_limit_delay_ms: 0,
        }
    }

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| (*k).to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn failing_keyword_yields_degraded_entry_and_batch_continues() {
        let search = Arc::new(
            FakeSearch::new()
                .with_target_at("k1", "P-1", 3)
                .with_target_at("k2", "P-1", 3)
                .with_target_at("k3", "P-1", 150)
                .with_target_at("k4", "P-1", 7)
                .with_target_at("k5", "P-1", 280),
        );
        search.fail_always("k2", FakeFailure::Status(429));
        let (checker, _, store) = checker(search);

        let batch = checker
            .collect_product_ranks("P-1", &keywords(&["k1", "k2", "k3", "k4", "k5"]), &config())
            .await;

        assert_eq!(batch.results.len(), 5);
        let order: Vec<&str> = batch.results.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(order, ["k1", "k2", "k3", "k4", "k5"]);

        let degraded = &batch.results[1];
        assert_eq!(degraded.rank, None);
        assert_eq!(degraded.api_calls_used, 0);

        let ranks: Vec<Option<u32>> = batch.results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [Some(3), None, Some(150), Some(7), Some(280)]);
        assert_eq!(batch.total_api_calls, 1 + 2 + 1 + 3);
        assert_eq!(store.logged_errors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keyword_delay_applies_between_keywords_only() {
        let search = Arc::new(
            FakeSearch::new()
                .with_target_at("a", "P-1", 1)
                .with_target_at("b", "P-1", 1)
                .with_target_at("c", "P-1", 1),
        );
        let (checker, _, _) = checker(search);
        let checker = checker.with_keyword_delay(Duration::from_millis(500));

        let batch = checker
            .collect_product_ranks("P-1", &keywords(&["a", "b", "c"]), &config())
            .await;

        assert_eq!(batch.execution_time_ms, 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_keyword_list_makes_no_calls() {
        let search = Arc::new(FakeSearch::new());
        let (checker, _, _) = checker(search.clone());

        let batch = checker.collect_product_ranks("P-1", &[], &config()).await;

        assert!(batch.results.is_empty());
        assert_eq!(batch.total_api_calls, 0);
        assert_eq!(search.call_count(), 0);
    }
}
