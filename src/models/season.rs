//! Season: roster, venues, format phases and persisted matches.

use crate::models::draw::{Group, KnockoutDraw};
use crate::models::error::ScheduleError;
use crate::models::game::{CompetitionId, Match, MatchId, MatchStatus, SeasonId};
use crate::models::handler::{HandlerSettings, TournamentHandler};
use crate::models::phase::{PhaseConfig, PhaseId};
use crate::models::team::{Team, TeamId, Venue, VenueId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// One season of a competition. This is the in-memory match store the scheduling
/// core reads from; phase status is always derived from `matches`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub competition_id: CompetitionId,
    pub name: String,
    pub handler: TournamentHandler,
    /// Copied from the handler at creation, ordered by `order`.
    pub phases: Vec<PhaseConfig>,
    pub settings: HandlerSettings,
    pub teams: Vec<Team>,
    pub venues: Vec<Venue>,
    pub matches: Vec<Match>,
    /// Group draw of each group_assignment phase.
    pub groups: HashMap<PhaseId, Vec<Group>>,
    /// Teams that advanced into a phase, in seed order.
    pub qualified: HashMap<PhaseId, Vec<TeamId>>,
    /// Round-1 bracket of each knockout phase; later rounds follow from results.
    #[serde(default)]
    pub brackets: HashMap<PhaseId, KnockoutDraw>,
    /// Phases closed by an administrator. Closing is final.
    #[serde(default)]
    pub closed_phases: HashSet<PhaseId>,
}

impl Season {
    /// Create an empty season using the handler's phases and default settings.
    pub fn new(name: impl Into<String>, competition_id: CompetitionId, handler: TournamentHandler) -> Self {
        let mut phases = handler.phases();
        phases.sort_by_key(|p| p.order);
        Self {
            id: Uuid::new_v4(),
            competition_id,
            name: name.into(),
            handler,
            phases,
            settings: handler.default_settings(),
            teams: Vec::new(),
            venues: Vec::new(),
            matches: Vec::new(),
            groups: HashMap::new(),
            qualified: HashMap::new(),
            brackets: HashMap::new(),
            closed_phases: HashSet::new(),
        }
    }

    pub fn team_ids(&self) -> Vec<TeamId> {
        self.teams.iter().map(|t| t.id).collect()
    }

    pub fn venue_ids(&self) -> Vec<VenueId> {
        self.venues.iter().map(|v| v.id).collect()
    }

    pub fn has_team(&self, id: TeamId) -> bool {
        self.teams.iter().any(|t| t.id == id)
    }

    /// Add a team. Names must be unique (case-insensitive).
    pub fn add_team(&mut self, name: impl Into<String>) -> Result<TeamId, ScheduleError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(ScheduleError::InvalidConstraint("team name is empty".to_string()));
        }
        if self.teams.iter().any(|t| t.name.eq_ignore_ascii_case(name)) {
            return Err(ScheduleError::DuplicateTeamName(name.to_string()));
        }
        let team = Team::new(name);
        let id = team.id;
        self.teams.push(team);
        Ok(id)
    }

    /// Remove a team that has no matches yet.
    pub fn remove_team(&mut self, id: TeamId) -> Result<(), ScheduleError> {
        let idx = self
            .teams
            .iter()
            .position(|t| t.id == id)
            .ok_or(ScheduleError::TeamNotFound(id))?;
        if self.matches.iter().any(|m| m.involves(id)) {
            return Err(ScheduleError::InvalidConstraint(
                "team already has matches this season".to_string(),
            ));
        }
        self.teams.remove(idx);
        Ok(())
    }

    pub fn add_venue(&mut self, name: impl Into<String>) -> VenueId {
        let venue = Venue::new(name);
        let id = venue.id;
        self.venues.push(venue);
        id
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Result<&mut Match, ScheduleError> {
        self.matches
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ScheduleError::MatchNotFound(id))
    }

    pub fn stage_matches<'a>(&'a self, phase_id: &'a str) -> impl Iterator<Item = &'a Match> + 'a {
        self.matches.iter().filter(move |m| m.stage_id == phase_id)
    }

    /// Enter a final score. Completed matches are left alone (see `correct_result`).
    pub fn record_result(&mut self, id: MatchId, home_score: u32, away_score: u32) -> Result<(), ScheduleError> {
        let m = self.get_match_mut(id)?;
        if m.is_completed() {
            return Err(ScheduleError::MatchAlreadyCompleted(id));
        }
        if m.status == MatchStatus::Cancelled {
            return Err(ScheduleError::InvalidConstraint("match is cancelled".to_string()));
        }
        m.home_score = home_score;
        m.away_score = away_score;
        m.status = MatchStatus::Completed;
        Ok(())
    }

    /// Explicit correction of a completed match's score. A corrected forfeit becomes a
    /// played result.
    pub fn correct_result(&mut self, id: MatchId, home_score: u32, away_score: u32) -> Result<(), ScheduleError> {
        let m = self.get_match_mut(id)?;
        if !m.is_completed() {
            return Err(ScheduleError::InvalidConstraint(
                "only completed matches can be corrected".to_string(),
            ));
        }
        m.home_score = home_score;
        m.away_score = away_score;
        m.forfeited = false;
        Ok(())
    }

    /// Set disciplinary points (used by the fair-play tie-break).
    pub fn set_penalty_points(&mut self, id: MatchId, home: u32, away: u32) -> Result<(), ScheduleError> {
        let m = self.get_match_mut(id)?;
        m.home_penalty_points = home;
        m.away_penalty_points = away;
        Ok(())
    }

    /// Postpone, cancel, start or reschedule a match. Completion goes through `record_result`.
    pub fn set_match_status(&mut self, id: MatchId, status: MatchStatus) -> Result<(), ScheduleError> {
        let m = self.get_match_mut(id)?;
        if m.is_completed() {
            return Err(ScheduleError::MatchAlreadyCompleted(id));
        }
        if status == MatchStatus::Completed {
            return Err(ScheduleError::InvalidConstraint(
                "record a result to complete a match".to_string(),
            ));
        }
        m.status = status;
        Ok(())
    }
}
