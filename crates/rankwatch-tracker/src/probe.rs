//! Paginated rank probe with early exit.

use std::time::Duration;

use chrono::Utc;
use rankwatch_core::{BudgetFeature, RankCheckConfig, RankResult};
use rankwatch_search::SearchError;

use crate::checker::RankChecker;

impl RankChecker {
    /// Scans result pages for `keyword` until `product_id` appears or the
    /// scan depth is reached.
    ///
    /// Every page request is charged to the `ranking` budget as soon as it
    /// returns, successful or not. The last page is shortened so that no
    /// position beyond `rank_check_limit` is requested. No retries happen
    /// here; see [`RankChecker::with_retry`].
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidRequest`] without calling the search API
    /// when `rank_check_limit` is zero; a successful result always carries at
    /// least one call. Otherwise returns the first [`SearchError`] raised by
    /// the search client. Calls made before the failure stay recorded in the
    /// budget.
    pub async fn probe(
        &self,
        keyword: &str,
        product_id: &str,
        config: &RankCheckConfig,
    ) -> Result<RankResult, SearchError> {
        if config.rank_check_limit == 0 {
            return Err(SearchError::InvalidRequest {
                reason: "rank_check_limit must be at least 1".to_owned(),
            });
        }

        let display = config.display_per_request.max(1);
        let page_delay = Duration::from_millis(config.rate_limit_delay_ms);
        let mut api_calls: u32 = 0;
        let mut start: u32 = 1;

        while start <= config.rank_check_limit {
            if api_calls > 0 && !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }

            let page_size = display.min(config.rank_check_limit - start + 1);
            let outcome = self.client.search(keyword, start, page_size).await;
            api_calls += 1;
            self.budget.record_call(BudgetFeature::Ranking, 1);
            let page = outcome?;

            let found = (start..)
                .zip(page.items.iter().take(page_size as usize))
                .find(|(_, item)| item.external_id == product_id)
                .map(|(rank, _)| rank);

            if let Some(rank) = found {
                tracing::debug!(keyword, product_id, rank, api_calls, "probe: product found");
                return Ok(RankResult {
                    keyword: keyword.to_owned(),
                    product_id: product_id.to_owned(),
                    rank: Some(rank),
                    checked_at: Utc::now(),
                    api_calls_used: api_calls,
                });
            }

            match start.checked_add(display) {
                Some(next) => start = next,
                None => break,
            }
        }

        tracing::debug!(
            keyword,
            product_id,
            limit = config.rank_check_limit,
            api_calls,
            "probe: product not within scan depth"
        );
        Ok(RankResult {
            keyword: keyword.to_owned(),
            product_id: product_id.to_owned(),
            rank: None,
            checked_at: Utc::now(),
            api_calls_used: api_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rankwatch_core::{BudgetFeature, RankCheckConfig};
    use rankwatch_search::SearchError;
    use tokio::time::Instant;

    use crate::testing::{checker, FakeFailure, FakeSearch};

    fn config(limit: u32, display: u32, delay_ms: u64) -> RankCheckConfig {
        RankCheckConfig {
            rank_check_limit: limit,
            display_per_request: display,
            rate_limit_delay_ms: delay_ms,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn finds_product_on_third_page_with_three_calls() {
        let search = Arc::new(FakeSearch::new().with_target_at("linen shirt", "P-1", 250));
        let (checker, budget, _) = checker(search.clone());

        let result = checker
            .probe("linen shirt", "P-1", &config(300, 100, 0))
            .await
            .unwrap();

        assert_eq!(result.rank, Some(250));
        assert_eq!(result.api_calls_used, 3);
        assert_eq!(search.starts("linen shirt"), vec![1, 101, 201]);
        assert_eq!(budget.status().feature(BudgetFeature::Ranking).used, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn call_count_tracks_page_of_rank() {
        for (position, expected_calls) in [(1, 1), (99, 1), (100, 1), (101, 2), (300, 3)] {
            let search = Arc::new(FakeSearch::new().with_target_at("mug", "P-1", position));
            let (checker, _, _) = checker(search);

            let result = checker
                .probe("mug", "P-1", &config(300, 100, 0))
                .await
                .unwrap();

            assert_eq!(result.rank, Some(position));
            assert_eq!(result.api_calls_used, expected_calls, "position {position}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn absent_product_scans_every_page_once() {
        let search = Arc::new(FakeSearch::new().with_target_at("mug", "OTHER", 1));
        let (checker, budget, _) = checker(search.clone());

        let result = checker
            .probe("mug", "P-1", &config(250, 100, 0))
            .await
            .unwrap();

        assert_eq!(result.rank, None);
        assert_eq!(result.api_calls_used, 3);
        assert_eq!(
            search.requests("mug"),
            vec![(1, 100), (101, 100), (201, 50)],
            "last page is clipped to the scan depth"
        );
        assert_eq!(budget.status().total.used, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn product_beyond_scan_depth_is_not_reported() {
        // Position 260 lies past the scan depth of 250.
        let search = Arc::new(FakeSearch::new().with_target_at("mug", "P-1", 260));
        let (checker, _, _) = checker(search);

        let result = checker
            .probe("mug", "P-1", &config(250, 100, 0))
            .await
            .unwrap();

        assert_eq!(result.rank, None);
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_pages_but_not_before_first() {
        let search = Arc::new(FakeSearch::new().with_target_at("mug", "P-1", 250));
        let (checker, _, _) = checker(search);

        let started = Instant::now();
        checker
            .probe("mug", "P-1", &config(300, 100, 100))
            .await
            .unwrap();

        assert_eq!(started.elapsed().as_millis(), 200);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_propagates_and_keeps_calls_recorded() {
        let search = Arc::new(FakeSearch::new().with_target_at("mug", "P-1", 250));
        search.fail_at("mug", 101, FakeFailure::Status(503));
        let (checker, budget, _) = checker(search);

        let err = checker
            .probe("mug", "P-1", &config(300, 100, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::ServerError { status: 503, .. }));
        assert_eq!(budget.status().feature(BudgetFeature::Ranking).used, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_scan_depth_is_rejected_before_any_call() {
        let search = Arc::new(FakeSearch::new().with_target_at("mug", "P-1", 1));
        let (checker, budget, _) = checker(search.clone());

        let err = checker
            .probe("mug", "P-1", &config(0, 100, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::InvalidRequest { .. }));
        assert!(search.requests("mug").is_empty());
        assert_eq!(budget.status().total.used, 0);
    }
}
