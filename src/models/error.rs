//! Errors returned by scheduling, standings and phase operations.

use crate::models::game::MatchId;
use crate::models::phase::PhaseId;
use crate::models::team::TeamId;

/// Errors that can occur while generating or progressing a schedule.
///
/// All of these are input-validation failures: retrying the same input
/// reproduces the same error. Soft-constraint violations are never errors,
/// they are reported in the schedule quality instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScheduleError {
    /// Fewer than 2 teams (or fewer than 2 per group) supplied.
    InsufficientTeams { found: usize },
    /// Knockout bracket size is not 2, 4, 8, 16 or 32, or too small for the teams.
    InvalidBracketSize { size: usize },
    /// More pairings than slots: no attempt can place them all.
    InsufficientSlots { pairings: usize, slots: usize },
    /// A configuration value could not be used (bad time string, zero duration, ...).
    InvalidConstraint(String),
    /// A match or pairing with the same team on both sides.
    SameTeam(TeamId),
    /// `handler_key` does not name a known tournament format.
    UnknownHandler(String),
    /// No phase with this id in the season's format.
    UnknownPhase(PhaseId),
    /// The phase already has matches; generate again only after removing them.
    PhaseAlreadyScheduled(PhaseId),
    /// The phase is completed/closed and can no longer change through the state machine.
    PhaseClosed(PhaseId),
    /// An earlier phase still has unfinished matches.
    PhaseNotCurrent(PhaseId),
    /// Advancement asked for before the phase finished.
    PhaseNotCompleted(PhaseId),
    MatchNotFound(MatchId),
    /// Completed matches change only through an explicit correction.
    MatchAlreadyCompleted(MatchId),
    TeamNotFound(TeamId),
    /// Team names are unique per season (case-insensitive).
    DuplicateTeamName(String),
    /// The same team appears twice in an input list.
    DuplicateTeam(TeamId),
    /// Manual knockout placement does not fill every bracket slot exactly once.
    InvalidPlacement(String),
    /// Knockout match without a winner (unplayed or drawn).
    UnresolvedKnockoutMatch(MatchId),
    /// The next knockout round waits for the current one to finish.
    RoundInProgress { phase: PhaseId, round: u32 },
    /// Writing an export (CSV) failed.
    Export(String),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::InsufficientTeams { found } => {
                write!(f, "Need at least 2 teams to generate pairings (found {})", found)
            }
            ScheduleError::InvalidBracketSize { size } => {
                write!(f, "Unsupported knockout bracket size {} (use 2, 4, 8, 16 or 32)", size)
            }
            ScheduleError::InsufficientSlots { pairings, slots } => write!(
                f,
                "Not enough slots: {} pairings but only {} slots available",
                pairings, slots
            ),
            ScheduleError::InvalidConstraint(msg) => write!(f, "Invalid constraint: {}", msg),
            ScheduleError::SameTeam(_) => write!(f, "A team cannot play against itself"),
            ScheduleError::UnknownHandler(key) => write!(f, "Unknown tournament format '{}'", key),
            ScheduleError::UnknownPhase(id) => write!(f, "Unknown phase '{}'", id),
            ScheduleError::PhaseAlreadyScheduled(id) => {
                write!(f, "Phase '{}' already has matches", id)
            }
            ScheduleError::PhaseClosed(id) => write!(f, "Phase '{}' is already completed", id),
            ScheduleError::PhaseNotCurrent(id) => {
                write!(f, "Phase '{}' cannot start before earlier phases are completed", id)
            }
            ScheduleError::PhaseNotCompleted(id) => {
                write!(f, "Phase '{}' is not completed yet", id)
            }
            ScheduleError::MatchNotFound(_) => write!(f, "Match not found"),
            ScheduleError::MatchAlreadyCompleted(_) => {
                write!(f, "Match is already completed; use a correction to change it")
            }
            ScheduleError::TeamNotFound(_) => write!(f, "Team not found"),
            ScheduleError::DuplicateTeamName(name) => {
                write!(f, "A team named '{}' already exists", name)
            }
            ScheduleError::DuplicateTeam(_) => write!(f, "A team is listed more than once"),
            ScheduleError::InvalidPlacement(msg) => write!(f, "Invalid bracket placement: {}", msg),
            ScheduleError::UnresolvedKnockoutMatch(_) => {
                write!(f, "Knockout match has no winner yet")
            }
            ScheduleError::RoundInProgress { phase, round } => {
                write!(f, "Round {} of phase '{}' is still being played", round, phase)
            }
            ScheduleError::Export(msg) => write!(f, "Export failed: {}", msg),
        }
    }
}

impl std::error::Error for ScheduleError {}
