//! Rank tracking domain types shared by the tracker, persistence, and CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app_config::AppConfig;

/// Outcome of one probe for a (keyword, product) pair.
///
/// `rank` is `None` exactly when the product was not found within the scan
/// depth. A completed probe always makes at least one call, since a zero scan
/// depth is rejected up front. Only a result synthesized for a keyword whose
/// probe failed carries `api_calls_used: 0`; see [`RankResult::is_degraded`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankResult {
    pub keyword: String,
    pub product_id: String,
    /// 1-based position in the search results.
    pub rank: Option<u32>,
    pub checked_at: DateTime<Utc>,
    pub api_calls_used: u32,
}

impl RankResult {
    /// Placeholder entry for a keyword whose probe exhausted its retries.
    #[must_use]
    pub fn degraded(keyword: &str, product_id: &str, checked_at: DateTime<Utc>) -> Self {
        Self {
            keyword: keyword.to_owned(),
            product_id: product_id.to_owned(),
            rank: None,
            checked_at,
            api_calls_used: 0,
        }
    }

    /// `true` when no probe call succeeded for this entry.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.api_calls_used == 0
    }
}

/// Scan parameters for one probe invocation. Never mutated once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankCheckConfig {
    /// Deepest absolute position that will be scanned.
    pub rank_check_limit: u32,
    pub display_per_request: u32,
    /// Pause before every page request after the first.
    pub rate_limit_delay_ms: u64,
}

impl RankCheckConfig {
    /// Number of page requests a scan that never finds the product will make.
    #[must_use]
    pub fn max_pages(&self) -> u32 {
        self.rank_check_limit.div_ceil(self.display_per_request.max(1))
    }
}

impl Default for RankCheckConfig {
    fn default() -> Self {
        Self {
            rank_check_limit: 300,
            display_per_request: 100,
            rate_limit_delay_ms: 100,
        }
    }
}

impl From<&AppConfig> for RankCheckConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            rank_check_limit: config.rank_check_limit,
            display_per_request: config.display_per_request,
            rate_limit_delay_ms: config.rate_limit_delay_ms,
        }
    }
}

/// All keyword results for one product in one run, in input keyword order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRankResult {
    pub results: Vec<RankResult>,
    pub total_api_calls: u32,
    pub execution_time_ms: u64,
}

/// Totals for one daily collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyCollectionResult {
    pub total_products: u32,
    pub total_keywords: u32,
    pub total_api_calls: u32,
    pub execution_time_ms: u64,
    /// Products left unprocessed because the ranking budget ran out.
    pub skipped_products: u32,
    /// Products whose keyword lookup or persistence failed.
    pub failed_products: u32,
}

/// Durable record of a probe that exhausted its retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorLogEntry {
    pub keyword: String,
    pub product_id: String,
    pub error_code: String,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

/// An active product that can be looked up in the search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedProduct {
    pub id: i64,
    /// The product's identifier inside search results.
    pub external_id: String,
    pub name: String,
    /// Fallback keyword used when no tracked keywords are configured.
    pub representative_keyword: Option<String>,
}
