//! Standings table configuration and rows.

use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};

/// Points awarded per result.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PointsConfig {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

/// Criteria applied in order to separate teams level on points.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreaker {
    /// Points, then goal difference, in the mini-league among the tied teams.
    HeadToHead,
    GoalDifference,
    GoalsScored,
    /// Fewer conceded ranks higher.
    GoalsAgainst,
    Wins,
    /// Fewer disciplinary points ranks higher.
    FairPlay,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandingsConfig {
    pub points: PointsConfig,
    pub tie_breakers: Vec<TieBreaker>,
}

impl Default for StandingsConfig {
    fn default() -> Self {
        Self {
            points: PointsConfig::default(),
            tie_breakers: vec![
                TieBreaker::HeadToHead,
                TieBreaker::GoalDifference,
                TieBreaker::GoalsScored,
            ],
        }
    }
}

/// One team's line in the table.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team_id: TeamId,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub points: u32,
    pub penalty_points: u32,
}

impl StandingsRow {
    pub fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            ..Self::default()
        }
    }

    /// Add one result from this team's point of view.
    pub fn record(&mut self, scored: u32, conceded: u32, penalty: u32, points: &PointsConfig) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.goal_difference = self.goals_for as i64 - self.goals_against as i64;
        self.penalty_points += penalty;
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.wins += 1;
                self.points += points.win;
            }
            std::cmp::Ordering::Equal => {
                self.draws += 1;
                self.points += points.draw;
            }
            std::cmp::Ordering::Less => {
                self.losses += 1;
                self.points += points.loss;
            }
        }
    }
}
