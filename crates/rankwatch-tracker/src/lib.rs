//! Rank tracking under a shared daily search-call budget.
//!
//! - [`BudgetAllocator`]: per-feature daily call counters with reserve overflow.
//! - [`RankChecker`]: paginated probe, bounded retry, and per-product batches.
//! - [`DailyCollector`]: runs every active product through the checker and
//!   persists the results.

pub mod batch;
pub mod budget;
pub mod checker;
pub mod error;
pub mod orchestrator;
pub mod probe;
pub mod retry;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use budget::{
    BudgetAllocator, BudgetStatus, Clock, FeatureUsage, ManualClock, SystemClock, Usage,
};
pub use checker::{RankChecker, RetryPolicy};
pub use error::TrackerError;
pub use orchestrator::DailyCollector;
pub use store::{ErrorSink, PgStore, RankRepository};
