//! Classification of consecutive rank observations into alertable events.
//!
//! Alerting itself happens elsewhere; this is the derivation rule applied to
//! two neighbouring rows of the persisted rank history.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankChange {
    /// Previously absent, now ranked.
    Enter,
    /// Previously ranked, now absent.
    Exit,
    /// Moved up by at least the surge threshold.
    Surge,
    /// Moved down by at least the drop threshold.
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeThresholds {
    pub surge: u32,
    pub drop: u32,
}

impl Default for ChangeThresholds {
    fn default() -> Self {
        Self {
            surge: 10,
            drop: 10,
        }
    }
}

/// Classifies the move from `previous` to `current`.
///
/// Ranks are 1-based, so a smaller number is better. Returns `None` when the
/// pair stays absent, or when the movement is below both thresholds.
#[must_use]
pub fn classify_rank_change(
    previous: Option<u32>,
    current: Option<u32>,
    thresholds: ChangeThresholds,
) -> Option<RankChange> {
    match (previous, current) {
        (None, Some(_)) => Some(RankChange::Enter),
        (Some(_), None) => Some(RankChange::Exit),
        (Some(prev), Some(curr)) if curr < prev && prev - curr >= thresholds.surge => {
            Some(RankChange::Surge)
        }
        (Some(prev), Some(curr)) if curr > prev && curr - prev >= thresholds.drop => {
            Some(RankChange::Drop)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: ChangeThresholds = ChangeThresholds { surge: 10, drop: 5 };

    #[test]
    fn absent_to_present_is_enter() {
        assert_eq!(classify_rank_change(None, Some(40), T), Some(RankChange::Enter));
    }

    #[test]
    fn present_to_absent_is_exit() {
        assert_eq!(classify_rank_change(Some(3), None, T), Some(RankChange::Exit));
    }

    #[test]
    fn absent_twice_is_nothing() {
        assert_eq!(classify_rank_change(None, None, T), None);
    }

    #[test]
    fn improvement_at_threshold_is_surge() {
        assert_eq!(classify_rank_change(Some(30), Some(20), T), Some(RankChange::Surge));
    }

    #[test]
    fn small_improvement_is_nothing() {
        assert_eq!(classify_rank_change(Some(30), Some(25), T), None);
    }

    #[test]
    fn worsening_uses_drop_threshold() {
        assert_eq!(classify_rank_change(Some(10), Some(15), T), Some(RankChange::Drop));
        assert_eq!(classify_rank_change(Some(10), Some(14), T), None);
    }

    #[test]
    fn unchanged_rank_is_nothing() {
        assert_eq!(classify_rank_change(Some(7), Some(7), T), None);
    }
}
