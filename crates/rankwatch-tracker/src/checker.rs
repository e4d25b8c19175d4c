//! [`RankChecker`] bundles the collaborators shared by the probe, retry, and
//! batch stages. Each stage lives in its own module as an `impl` block.

use std::sync::Arc;
use std::time::Duration;

use rankwatch_core::AppConfig;
use rankwatch_search::SearchClient;

use crate::budget::BudgetAllocator;
use crate::store::ErrorSink;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_KEYWORD_DELAY_MS: u64 = 500;

/// Bounded retry settings for transient search failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }
}

impl From<&AppConfig> for RetryPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

/// Runs rank probes against one search client, charging a shared budget and
/// reporting exhausted probes to an error sink.
pub struct RankChecker {
    pub(crate) client: Arc<dyn SearchClient>,
    pub(crate) budget: Arc<BudgetAllocator>,
    pub(crate) errors: Arc<dyn ErrorSink>,
    pub(crate) retry: RetryPolicy,
    pub(crate) keyword_delay: Duration,
}

impl RankChecker {
    #[must_use]
    pub fn new(
        client: Arc<dyn SearchClient>,
        budget: Arc<BudgetAllocator>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            client,
            budget,
            errors,
            retry: RetryPolicy::default(),
            keyword_delay: Duration::from_millis(DEFAULT_KEYWORD_DELAY_MS),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Pause between consecutive keywords of one batch.
    #[must_use]
    pub fn with_keyword_delay(mut self, delay: Duration) -> Self {
        self.keyword_delay = delay;
        self
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    #[must_use]
    pub fn budget(&self) -> &Arc<BudgetAllocator> {
        &self.budget
    }
}

impl std::fmt::Debug for RankChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankChecker")
            .field("retry", &self.retry)
            .field("keyword_delay", &self.keyword_delay)
            .finish_non_exhaustive()
    }
}
