//! Match (game), Pairing and ProposedMatch.

use crate::models::error::ScheduleError;
use crate::models::phase::PhaseId;
use crate::models::team::{TeamId, VenueId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a persisted match.
pub type MatchId = Uuid;

/// Identifier of the competition a match belongs to.
pub type CompetitionId = Uuid;

/// Identifier of a season.
pub type SeasonId = Uuid;

/// Lifecycle of a persisted match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
    Postponed,
    Cancelled,
}

/// Two teams drawn to play each other, not yet bound to a time or venue.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub home: TeamId,
    pub away: TeamId,
}

impl Pairing {
    pub fn new(home: TeamId, away: TeamId) -> Self {
        Self { home, away }
    }

    /// Same teams with home and away swapped.
    pub fn mirrored(self) -> Self {
        Self {
            home: self.away,
            away: self.home,
        }
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.home == team || self.away == team
    }

    /// Order-independent key: the same for (A, B) and (B, A).
    pub fn unordered_key(&self) -> (TeamId, TeamId) {
        if self.home <= self.away {
            (self.home, self.away)
        } else {
            (self.away, self.home)
        }
    }
}

/// A match in a dry-run schedule. Disposable: never referenced by id.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProposedMatch {
    pub stage_id: PhaseId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    #[serde(default)]
    pub referee_team_id: Option<TeamId>,
    pub venue_id: VenueId,
    pub scheduled_at: NaiveDateTime,
}

/// A persisted match row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub competition_id: CompetitionId,
    pub season_id: SeasonId,
    pub stage_id: PhaseId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    #[serde(default)]
    pub referee_team_id: Option<TeamId>,
    #[serde(default)]
    pub venue_id: Option<VenueId>,
    #[serde(default)]
    pub scheduled_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub home_score: u32,
    #[serde(default)]
    pub away_score: u32,
    /// Disciplinary points (cards etc.); lower is better for fair play.
    #[serde(default)]
    pub home_penalty_points: u32,
    #[serde(default)]
    pub away_penalty_points: u32,
    /// Knockout round, starting at 1. Always 1 outside knockout phases.
    #[serde(default = "first_round")]
    pub round: u32,
    /// Completed by closing the phase rather than played.
    #[serde(default)]
    pub forfeited: bool,
}

fn first_round() -> u32 {
    1
}

impl Match {
    /// Create a scheduled match with zero scores. Fails if both sides are the same team.
    pub fn new(
        competition_id: CompetitionId,
        season_id: SeasonId,
        stage_id: impl Into<PhaseId>,
        home_team_id: TeamId,
        away_team_id: TeamId,
    ) -> Result<Self, ScheduleError> {
        if home_team_id == away_team_id {
            return Err(ScheduleError::SameTeam(home_team_id));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            competition_id,
            season_id,
            stage_id: stage_id.into(),
            home_team_id,
            away_team_id,
            referee_team_id: None,
            venue_id: None,
            scheduled_at: None,
            status: MatchStatus::Scheduled,
            home_score: 0,
            away_score: 0,
            home_penalty_points: 0,
            away_penalty_points: 0,
            round: 1,
            forfeited: false,
        })
    }

    /// Turn an accepted proposal into a real row (fresh id, `scheduled`, zero scores).
    pub fn from_proposed(
        competition_id: CompetitionId,
        season_id: SeasonId,
        proposed: &ProposedMatch,
    ) -> Result<Self, ScheduleError> {
        let mut m = Self::new(
            competition_id,
            season_id,
            proposed.stage_id.clone(),
            proposed.home_team_id,
            proposed.away_team_id,
        )?;
        m.referee_team_id = proposed.referee_team_id;
        m.venue_id = Some(proposed.venue_id);
        m.scheduled_at = Some(proposed.scheduled_at);
        Ok(m)
    }

    /// Builder used by tests and imports: a completed match with a final score.
    pub fn completed_with(mut self, home_score: u32, away_score: u32) -> Self {
        self.home_score = home_score;
        self.away_score = away_score;
        self.status = MatchStatus::Completed;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Completed with a real result. Forfeits close a phase but never count in a table.
    pub fn is_played(&self) -> bool {
        self.is_completed() && !self.forfeited
    }

    pub fn pairing(&self) -> Pairing {
        Pairing::new(self.home_team_id, self.away_team_id)
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.home_team_id == team || self.away_team_id == team
    }
}
