pub mod app_config;
pub mod budget;
pub mod change;
pub mod config;
pub mod rank;

pub use app_config::{AppConfig, Environment};
pub use budget::{BudgetConfig, BudgetFeature};
pub use change::{classify_rank_change, ChangeThresholds, RankChange};
pub use config::{load_app_config, load_app_config_from_env};
pub use rank::{
    BatchRankResult, DailyCollectionResult, ErrorLogEntry, RankCheckConfig, RankResult,
    TrackedProduct,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
