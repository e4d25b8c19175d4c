//! Bounded retry around [`RankChecker::probe`].
//!
//! Only congestion failures are retried: HTTP 429 backs off exponentially and
//! 5xx backs off linearly. Everything else fails on the first attempt. A
//! probe that is still failing after `max_retries` extra attempts is written
//! to the error sink before the error is returned.

use std::time::Duration;

use chrono::Utc;
use rankwatch_core::{ErrorLogEntry, RankCheckConfig, RankResult};
use rankwatch_search::{FailureClass, SearchError};

use crate::checker::{RankChecker, RetryPolicy};

impl RetryPolicy {
    /// Wait before retry number `attempt + 1`, or `None` if `class` is not
    /// retried at all. `attempt` starts at 0.
    #[must_use]
    pub fn backoff(&self, class: FailureClass, attempt: u32) -> Option<Duration> {
        match class {
            FailureClass::RateLimited => {
                let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
                Some(self.base_delay.saturating_mul(factor))
            }
            FailureClass::ServerError => {
                Some(self.base_delay.saturating_mul(attempt.saturating_add(1)))
            }
            FailureClass::Permanent => None,
        }
    }
}

impl RankChecker {
    /// Runs [`probe`](Self::probe), retrying transient failures up to
    /// `max_retries` additional times.
    ///
    /// # Errors
    ///
    /// Returns the last [`SearchError`] when a permanent failure occurs or
    /// when retries are exhausted. Only the exhausted case is recorded in
    /// the error sink.
    pub async fn with_retry(
        &self,
        keyword: &str,
        product_id: &str,
        config: &RankCheckConfig,
        max_retries: u32,
    ) -> Result<RankResult, SearchError> {
        let mut attempt: u32 = 0;
        loop {
            let err = match self.probe(keyword, product_id, config).await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };

            let Some(delay) = self.retry.backoff(err.class(), attempt) else {
                tracing::warn!(keyword, product_id, error = %err, "probe failed permanently");
                return Err(err);
            };

            if attempt >= max_retries {
                tracing::error!(
                    keyword,
                    product_id,
                    attempts = attempt + 1,
                    error = %err,
                    "probe retries exhausted"
                );
                self.log_exhausted(keyword, product_id, &err).await;
                return Err(err);
            }

            tracing::warn!(
                keyword,
                product_id,
                attempt = attempt + 1,
                max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "probe failed; backing off before retry"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn log_exhausted(&self, keyword: &str, product_id: &str, err: &SearchError) {
        let entry = ErrorLogEntry {
            keyword: keyword.to_owned(),
            product_id: product_id.to_owned(),
            error_code: err.error_code(),
            error_message: err.to_string(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.errors.record(&entry).await {
            tracing::warn!(keyword, product_id, error = %e, "failed to write rank check error log");
        }
    }
}
