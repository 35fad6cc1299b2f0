//! Soft-constraint configuration, score weights and schedule quality metrics.

use crate::models::error::ScheduleError;
use crate::models::phase::PhaseSchedulingConstraints;
use serde::{Deserialize, Serialize};

/// Soft constraints supplied with every generation request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSet {
    pub avoid_repeats: bool,
    pub balance_matches: bool,
    pub avoid_back_to_back: bool,
    pub auto_referee: bool,
    /// When set, free slots are filled with extra pairings until every team reaches this count.
    pub target_matches_per_team: Option<u32>,
    pub rest_days_between_matches: Option<u32>,
    pub max_matches_per_team_per_day: Option<u32>,
    /// Swap home/away so each team's home count stays level.
    pub balance_home_away: bool,
}

impl ConstraintSet {
    /// Fill unset limits from a phase's scheduling constraints. Request values win.
    pub fn with_phase_constraints(mut self, phase: &PhaseSchedulingConstraints) -> Self {
        if self.rest_days_between_matches.is_none() {
            self.rest_days_between_matches = phase.rest_days_between_matches;
        }
        if self.max_matches_per_team_per_day.is_none() {
            self.max_matches_per_team_per_day = phase.matches_per_day;
        }
        self.balance_home_away |= phase.home_away_balance;
        self
    }

    /// Reject values that cannot describe a schedule.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.target_matches_per_team == Some(0) {
            return Err(ScheduleError::InvalidConstraint(
                "target_matches_per_team must be at least 1".to_string(),
            ));
        }
        if self.max_matches_per_team_per_day == Some(0) {
            return Err(ScheduleError::InvalidConstraint(
                "max_matches_per_team_per_day must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Weights for the composite score. Lower score is better.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub unscheduled: f64,
    pub repeat: f64,
    pub back_to_back: f64,
    pub rest: f64,
    pub daily_cap: f64,
    pub unfilled_slot: f64,
    pub imbalance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            unscheduled: 10_000.0,
            repeat: 1_000.0,
            back_to_back: 500.0,
            rest: 250.0,
            daily_cap: 250.0,
            unfilled_slot: 1.0,
            imbalance: 10.0,
        }
    }
}

/// Quality metrics of one candidate schedule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleQuality {
    /// Ordered fixtures scheduled more than once (each extra occurrence counts one).
    pub repeat_violations: usize,
    /// Team appearances in adjacent time slots on the same day.
    pub back_to_back_violations: usize,
    pub rest_violations: usize,
    pub daily_cap_violations: usize,
    pub unfilled_slots: usize,
    /// Pairings that found no feasible slot.
    pub unscheduled_pairings: usize,
    /// Population standard deviation of per-team match counts.
    pub match_imbalance_std_dev: f64,
}

impl ScheduleQuality {
    /// Weighted sum. A soft-constraint term only counts when that constraint is enabled.
    pub fn score(&self, weights: &ScoreWeights, constraints: &ConstraintSet) -> f64 {
        let mut score = weights.unscheduled * self.unscheduled_pairings as f64
            + weights.unfilled_slot * self.unfilled_slots as f64;
        if constraints.avoid_repeats {
            score += weights.repeat * self.repeat_violations as f64;
        }
        if constraints.avoid_back_to_back {
            score += weights.back_to_back * self.back_to_back_violations as f64;
        }
        if constraints.rest_days_between_matches.is_some() {
            score += weights.rest * self.rest_violations as f64;
        }
        if constraints.max_matches_per_team_per_day.is_some() {
            score += weights.daily_cap * self.daily_cap_violations as f64;
        }
        if constraints.balance_matches {
            score += weights.imbalance * self.match_imbalance_std_dev;
        }
        score
    }
}

/// Search budget and scoring for the multi-attempt optimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub attempts: usize,
    /// Seed of attempt 1; each further attempt derives its own seed from it.
    pub base_seed: u64,
    /// Worker threads for attempts. None = rayon's global pool.
    pub workers: Option<usize>,
    pub weights: ScoreWeights,
}

pub const DEFAULT_ATTEMPTS: usize = 20;
pub const DEFAULT_BASE_SEED: u64 = 0x5EED_1EA6_0E00_0001;

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base_seed: DEFAULT_BASE_SEED,
            workers: None,
            weights: ScoreWeights::default(),
        }
    }
}

/// Reported next to the chosen schedule so the caller can see how it was picked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub attempts_run: usize,
    pub best_attempt_index: usize,
    pub best_seed: u64,
    pub best_score: f64,
    /// Score of attempt 0 (unshuffled order), for comparison.
    pub baseline_score: f64,
    pub quality: ScheduleQuality,
}
