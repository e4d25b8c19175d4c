//! Budget feature tags and per-feature daily limits.
//!
//! The allocator that enforces these limits lives in `rankwatch-tracker`;
//! this module only carries the vocabulary shared with configuration and
//! reporting.

use serde::{Deserialize, Serialize};

/// A consumer category drawing from the shared daily search-call quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetFeature {
    Ranking,
    ColorAnalysis,
    /// Shared overflow pool any other feature may spend from.
    Reserve,
}

impl BudgetFeature {
    pub const ALL: [BudgetFeature; 3] = [
        BudgetFeature::Ranking,
        BudgetFeature::ColorAnalysis,
        BudgetFeature::Reserve,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetFeature::Ranking => "ranking",
            BudgetFeature::ColorAnalysis => "color_analysis",
            BudgetFeature::Reserve => "reserve",
        }
    }
}

impl std::fmt::Display for BudgetFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily call limits: one aggregate cap plus a nominal allocation per feature.
///
/// The per-feature limits do not have to sum to `daily_limit`; the aggregate
/// cap is checked independently by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub daily_limit: u32,
    pub ranking_limit: u32,
    pub color_analysis_limit: u32,
    pub reserve_limit: u32,
}

impl BudgetConfig {
    #[must_use]
    pub fn limit_for(&self, feature: BudgetFeature) -> u32 {
        match feature {
            BudgetFeature::Ranking => self.ranking_limit,
            BudgetFeature::ColorAnalysis => self.color_analysis_limit,
            BudgetFeature::Reserve => self.reserve_limit,
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_limit: 25_000,
            ranking_limit: 20_000,
            color_analysis_limit: 3_000,
            reserve_limit: 2_000,
        }
    }
}
