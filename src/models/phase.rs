//! Phase configuration and derived phase status.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Identifier of a phase within a season (also the `stage_id` on matches), e.g. "regular_season".
pub type PhaseId = String;

/// How a phase produces its pairings.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchGenerationType {
    RoundRobin,
    SwissPairing,
    Knockout,
    GroupAssignment,
}

/// Which end of a table advancing teams are taken from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancementSource {
    #[default]
    Top,
    Bottom,
}

/// Which teams of a completed phase seed the destination phase.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AdvancementRules {
    /// Teams taken per source group (or from the whole table when `source_group` is None
    /// and the phase has no groups).
    pub count: usize,
    #[serde(default)]
    pub source: AdvancementSource,
    /// Restrict to one group by name ("A", "B", ...). None = every group.
    #[serde(default)]
    pub source_group: Option<String>,
    pub destination_phase: PhaseId,
}

/// Per-phase scheduling limits (turned into slot availability and soft constraints).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PhaseSchedulingConstraints {
    #[serde(default)]
    pub allowed_weekdays: Vec<Weekday>,
    /// Kick-off times as "HH:MM".
    #[serde(default)]
    pub time_slots: Vec<String>,
    /// Per team, per day.
    #[serde(default)]
    pub matches_per_day: Option<u32>,
    #[serde(default)]
    pub rest_days_between_matches: Option<u32>,
    #[serde(default)]
    pub home_away_balance: bool,
}

/// One stage of a season's competition format.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub id: PhaseId,
    pub name: String,
    /// Phases are totally ordered by this key.
    pub order: u32,
    pub generation: MatchGenerationType,
    #[serde(default)]
    pub advancement: Option<AdvancementRules>,
    #[serde(default)]
    pub is_terminal: bool,
    #[serde(default)]
    pub constraints: Option<PhaseSchedulingConstraints>,
}

impl PhaseConfig {
    pub fn new(
        id: impl Into<PhaseId>,
        name: impl Into<String>,
        order: u32,
        generation: MatchGenerationType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
            generation,
            advancement: None,
            is_terminal: false,
            constraints: None,
        }
    }

    pub fn advancing(mut self, count: usize, destination: impl Into<PhaseId>) -> Self {
        self.advancement = Some(AdvancementRules {
            count,
            source: AdvancementSource::Top,
            source_group: None,
            destination_phase: destination.into(),
        });
        self
    }

    pub fn terminal(mut self) -> Self {
        self.is_terminal = true;
        self
    }
}

/// Derived status of a phase. Never stored; recomputed from matches on every read.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    /// No matches exist yet.
    #[default]
    Pending,
    /// Matches exist, none completed.
    Scheduled,
    /// Some but not all matches completed.
    InProgress,
    /// Every match completed.
    Completed,
}

/// Status view of one phase (for dashboards).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PhaseStatus {
    pub phase_id: PhaseId,
    pub order: u32,
    pub total_matches: usize,
    pub completed_matches: usize,
    pub status: PhaseState,
    /// True when a matchless phase is treated as completed because a later phase has matches.
    #[serde(default)]
    pub skipped: bool,
}
