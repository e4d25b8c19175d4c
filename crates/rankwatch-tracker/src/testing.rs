//! In-memory collaborators for the tracker's unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rankwatch_core::{BudgetConfig, ErrorLogEntry, RankResult, TrackedProduct};
use rankwatch_db::DbError;
use rankwatch_search::{SearchClient, SearchError, SearchItem, SearchPage};

use crate::budget::{BudgetAllocator, ManualClock};
use crate::checker::RankChecker;
use crate::store::{ErrorSink, RankRepository};

#[derive(Debug, Clone, Copy)]
pub(crate) enum FakeFailure {
    Status(u16),
    Malformed,
}

impl FakeFailure {
    fn to_error(self) -> SearchError {
        match self {
            FakeFailure::Status(status) => {
                SearchError::from_status(status, format!("scripted HTTP {status}"))
            }
            FakeFailure::Malformed => SearchError::Deserialize {
                context: "scripted".to_string(),
                source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
            },
        }
    }
}

#[derive(Debug)]
struct Script {
    keyword: String,
    start: Option<u32>,
    failure: FakeFailure,
    /// `None` fails forever.
    remaining: Option<u32>,
}

/// Search engine whose results are generated on demand: each keyword has at
/// most one target product at a fixed position, every other slot is filler.
/// Keywords without a target return empty pages.
#[derive(Debug, Default)]
pub(crate) struct FakeSearch {
    targets: HashMap<String, (String, u32)>,
    scripts: Mutex<Vec<Script>>,
    calls: Mutex<Vec<(String, u32, u32)>>,
}

impl FakeSearch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_target_at(mut self, keyword: &str, product_id: &str, position: u32) -> Self {
        self.targets
            .insert(keyword.to_string(), (product_id.to_string(), position));
        self
    }

    fn script(
        &self,
        keyword: &str,
        start: Option<u32>,
        failure: FakeFailure,
        remaining: Option<u32>,
    ) {
        self.scripts.lock().unwrap().push(Script {
            keyword: keyword.to_string(),
            start,
            failure,
            remaining,
        });
    }

    /// Fails the next `times` calls for `keyword`, whatever page they ask for.
    pub(crate) fn fail_next(&self, keyword: &str, failure: FakeFailure, times: u32) {
        self.script(keyword, None, failure, Some(times));
    }

    pub(crate) fn fail_always(&self, keyword: &str, failure: FakeFailure) {
        self.script(keyword, None, failure, None);
    }

    /// Fails the first request for `keyword` starting at `start`.
    pub(crate) fn fail_at(&self, keyword: &str, start: u32, failure: FakeFailure) {
        self.script(keyword, Some(start), failure, Some(1));
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn requests(&self, keyword: &str) -> Vec<(u32, u32)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| k == keyword)
            .map(|(_, start, display)| (*start, *display))
            .collect()
    }

    pub(crate) fn starts(&self, keyword: &str) -> Vec<u32> {
        self.requests(keyword).into_iter().map(|(s, _)| s).collect()
    }

    fn scripted_failure(&self, keyword: &str, start: u32) -> Option<SearchError> {
        let mut scripts = self.scripts.lock().unwrap();
        let index = scripts.iter().position(|s| {
            s.keyword == keyword
                && s.start.is_none_or(|st| st == start)
                && s.remaining != Some(0)
        })?;
        let script = &mut scripts[index];
        if let Some(remaining) = script.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(script.failure.to_error())
    }
}

#[async_trait]
impl SearchClient for FakeSearch {
    async fn search(
        &self,
        query: &str,
        start: u32,
        display: u32,
    ) -> Result<SearchPage, SearchError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), start, display));

        if let Some(err) = self.scripted_failure(query, start) {
            return Err(err);
        }

        let Some((target, position)) = self.targets.get(query) else {
            return Ok(SearchPage {
                total: 0,
                items: Vec::new(),
            });
        };

        let items = (start..start + display)
            .map(|pos| SearchItem {
                external_id: if pos == *position {
                    target.clone()
                } else {
                    format!("filler-{pos}")
                },
                title: None,
            })
            .collect();

        Ok(SearchPage { total: 1_000, items })
    }
}

/// Repository and error sink backed by plain collections.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub(crate) products: Vec<TrackedProduct>,
    pub(crate) keywords: HashMap<i64, Vec<String>>,
    pub(crate) fail_products: bool,
    pub(crate) fail_keywords_for: HashSet<i64>,
    pub(crate) fail_save_for: HashSet<String>,
    pub(crate) fail_error_log: bool,
    pub(crate) saved: Mutex<Vec<(String, u32, Vec<RankResult>)>>,
    pub(crate) errors: Mutex<Vec<ErrorLogEntry>>,
}

impl MemoryStore {
    pub(crate) fn saved_batches(&self) -> Vec<(String, u32, Vec<RankResult>)> {
        self.saved.lock().unwrap().clone()
    }

    pub(crate) fn logged_errors(&self) -> Vec<ErrorLogEntry> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl RankRepository for MemoryStore {
    async fn active_products(&self) -> Result<Vec<TrackedProduct>, DbError> {
        if self.fail_products {
            return Err(DbError::NotFound);
        }
        Ok(self.products.clone())
    }

    async fn tracked_keywords(&self, product: &TrackedProduct) -> Result<Vec<String>, DbError> {
        if self.fail_keywords_for.contains(&product.id) {
            return Err(DbError::NotFound);
        }
        Ok(self.keywords.get(&product.id).cloned().unwrap_or_default())
    }

    async fn save_batch(
        &self,
        product_external_id: &str,
        rank_limit: u32,
        results: &[RankResult],
    ) -> Result<u64, DbError> {
        if self.fail_save_for.contains(product_external_id) {
            return Err(DbError::NotFound);
        }
        self.saved.lock().unwrap().push((
            product_external_id.to_string(),
            rank_limit,
            results.to_vec(),
        ));
        Ok(results.len() as u64)
    }
}

#[async_trait]
impl ErrorSink for MemoryStore {
    async fn record(&self, entry: &ErrorLogEntry) -> Result<(), DbError> {
        if self.fail_error_log {
            return Err(DbError::NotFound);
        }
        self.errors.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

pub(crate) fn test_budget(config: BudgetConfig) -> Arc<BudgetAllocator> {
    let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    Arc::new(BudgetAllocator::with_clock(
        config,
        Arc::new(ManualClock::new(today)),
    ))
}

/// Checker with default retry policy, no keyword delay, and a roomy budget.
pub(crate) fn checker_with(
    search: Arc<FakeSearch>,
    store: Arc<MemoryStore>,
    budget: BudgetConfig,
) -> (RankChecker, Arc<BudgetAllocator>) {
    let budget = test_budget(budget);
    let checker = RankChecker::new(search, budget.clone(), store)
        .with_keyword_delay(std::time::Duration::ZERO);
    (checker, budget)
}

pub(crate) fn checker_with_store(
    search: Arc<FakeSearch>,
    store: Arc<MemoryStore>,
) -> (RankChecker, Arc<BudgetAllocator>) {
    checker_with(search, store, BudgetConfig::default())
}

pub(crate) fn checker(
    search: Arc<FakeSearch>,
) -> (RankChecker, Arc<BudgetAllocator>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let (checker, budget) = checker_with_store(search, store.clone());
    (checker, budget, store)
}
