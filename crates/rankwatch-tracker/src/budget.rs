//! Daily search-call budget shared by every feature that talks to the
//! search API.
//!
//! [`BudgetAllocator`] keeps in-memory counters per [`BudgetFeature`] and
//! resets them the first time it is touched on a new calendar day. The
//! admission check ([`BudgetAllocator::can_make_call`]) is advisory and the
//! accounting ([`BudgetAllocator::record_call`]) is unconditional: callers
//! check before a unit of work and record every call they actually make.
//! [`BudgetAllocator::try_record_call`] performs both under one lock for
//! callers that need admission and accounting to be a single step.
//!
//! Once a feature has used its own allocation, further calls spill into the
//! `reserve` pool. A feature may keep going while `reserve` has headroom and
//! the aggregate daily limit has not been reached.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};
use rankwatch_core::{BudgetConfig, BudgetFeature};
use serde::Serialize;

/// Source of "today" for daily rollover.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to. Used to simulate day boundaries.
#[derive(Debug)]
pub struct ManualClock {
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.today.lock().unwrap_or_else(PoisonError::into_inner) = date;
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    ranking: u32,
    color_analysis: u32,
    reserve: u32,
}

impl Counters {
    fn get(&self, feature: BudgetFeature) -> u32 {
        match feature {
            BudgetFeature::Ranking => self.ranking,
            BudgetFeature::ColorAnalysis => self.color_analysis,
            BudgetFeature::Reserve => self.reserve,
        }
    }

    fn get_mut(&mut self, feature: BudgetFeature) -> &mut u32 {
        match feature {
            BudgetFeature::Ranking => &mut self.ranking,
            BudgetFeature::ColorAnalysis => &mut self.color_analysis,
            BudgetFeature::Reserve => &mut self.reserve,
        }
    }

    fn total(&self) -> u32 {
        self.ranking
            .saturating_add(self.color_analysis)
            .saturating_add(self.reserve)
    }
}

#[derive(Debug)]
struct BudgetState {
    used: Counters,
    reset_date: NaiveDate,
}

/// Usage of one counter as reported by [`BudgetAllocator::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
}

impl Usage {
    fn new(used: u32, limit: u32) -> Self {
        Self {
            used,
            limit,
            remaining: limit.saturating_sub(used),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureUsage {
    pub feature: BudgetFeature,
    #[serde(flatten)]
    pub usage: Usage,
}

/// Snapshot of all counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub features: Vec<FeatureUsage>,
    pub total: Usage,
    pub reset_date: NaiveDate,
}

impl BudgetStatus {
    #[must_use]
    pub fn feature(&self, feature: BudgetFeature) -> Usage {
        self.features
            .iter()
            .find(|f| f.feature == feature)
            .map_or(Usage::new(0, 0), |f| f.usage)
    }
}

/// Self-resetting daily call budget.
///
/// Construct one per process and share it by `Arc` with every caller that
/// spends search calls.
pub struct BudgetAllocator {
    config: BudgetConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<BudgetState>,
}

impl BudgetAllocator {
    #[must_use]
    pub fn new(config: BudgetConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(config: BudgetConfig, clock: Arc<dyn Clock>) -> Self {
        let reset_date = clock.today();
        Self {
            config,
            clock,
            state: Mutex::new(BudgetState {
                used: Counters::default(),
                reset_date,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Locks the state, zeroing every counter first if the date changed.
    fn state(&self) -> MutexGuard<'_, BudgetState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let today = self.clock.today();
        if state.reset_date != today {
            tracing::info!(
                previous = %state.reset_date,
                %today,
                used = state.used.total(),
                "budget: new day, resetting call counters"
            );
            state.used = Counters::default();
            state.reset_date = today;
        }
        state
    }

    fn admits(&self, used: &Counters, feature: BudgetFeature) -> bool {
        if used.total() >= self.config.daily_limit {
            return false;
        }
        if used.get(feature) < self.config.limit_for(feature) {
            return true;
        }
        feature != BudgetFeature::Reserve && used.reserve < self.config.reserve_limit
    }

    fn apply(&self, used: &mut Counters, feature: BudgetFeature, count: u32) {
        let limit = self.config.limit_for(feature);
        let next = used.get(feature).saturating_add(count);

        if feature != BudgetFeature::Reserve && next > limit {
            let overflow = next - limit;
            *used.get_mut(feature) = limit;
            used.reserve = used.reserve.saturating_add(overflow);
            tracing::debug!(
                %feature,
                overflow,
                reserve_used = used.reserve,
                "budget: spilled into reserve"
            );
        } else {
            *used.get_mut(feature) = next;
        }
    }

    /// Whether `feature` may spend another call right now.
    ///
    /// `false` once the aggregate daily limit is reached. Otherwise `true` if
    /// the feature is under its own limit, or if it is not `reserve` and the
    /// reserve pool still has headroom.
    #[must_use]
    pub fn can_make_call(&self, feature: BudgetFeature) -> bool {
        let state = self.state();
        self.admits(&state.used, feature)
    }

    /// Records `count` calls made on behalf of `feature`.
    ///
    /// Never refuses: the portion that exceeds the feature's own limit is
    /// charged to `reserve`. Callers check [`can_make_call`](Self::can_make_call)
    /// beforehand.
    pub fn record_call(&self, feature: BudgetFeature, count: u32) {
        let mut state = self.state();
        self.apply(&mut state.used, feature, count);
    }

    /// Admission check and accounting as one step. Returns `false` without
    /// recording anything when [`can_make_call`](Self::can_make_call) would.
    pub fn try_record_call(&self, feature: BudgetFeature, count: u32) -> bool {
        let mut state = self.state();
        if !self.admits(&state.used, feature) {
            return false;
        }
        self.apply(&mut state.used, feature, count);
        true
    }

    #[must_use]
    pub fn status(&self) -> BudgetStatus {
        let state = self.state();
        let features = BudgetFeature::ALL
            .iter()
            .map(|&feature| FeatureUsage {
                feature,
                usage: Usage::new(state.used.get(feature), self.config.limit_for(feature)),
            })
            .collect();

        BudgetStatus {
            features,
            total: Usage::new(state.used.total(), self.config.daily_limit),
            reset_date: state.reset_date,
        }
    }
}

impl std::fmt::Debug for BudgetAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BudgetAllocator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
