//! Generate-schedule request and response (the dry run).

use crate::models::constraints::{ConstraintSet, GenerationOptions, GenerationStats};
use crate::models::draw::{Group, KnockoutDraw, PairingSettings};
use crate::models::game::{CompetitionId, Pairing, ProposedMatch, SeasonId};
use crate::models::phase::PhaseConfig;
use crate::models::slot::{Slot, SlotSettings, SlotSource};
use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};

/// Everything needed to propose fixtures for one phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub competition_id: CompetitionId,
    pub season_id: SeasonId,
    pub phase: PhaseConfig,
    /// Participating teams in seed order (table order for swiss rounds).
    pub teams: Vec<TeamId>,
    pub slot_source: SlotSource,
    #[serde(default)]
    pub slot_settings: SlotSettings,
    #[serde(default)]
    pub constraints: ConstraintSet,
    #[serde(default)]
    pub pairing: PairingSettings,
    #[serde(default)]
    pub options: GenerationOptions,
    /// Fixtures already persisted for this phase, for repeat detection.
    #[serde(default)]
    pub history: Vec<Pairing>,
}

/// Options for previewing a season phase; teams and seeding come from the season.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseScheduleOptions {
    pub slot_source: SlotSource,
    #[serde(default)]
    pub slot_settings: SlotSettings,
    #[serde(default)]
    pub constraints: ConstraintSet,
    /// Overrides the handler's default pairing settings.
    #[serde(default)]
    pub pairing: Option<PairingSettings>,
    #[serde(default)]
    pub options: GenerationOptions,
}

/// A pairing placed in a slot, with its referee.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub pairing: Pairing,
    pub slot: Slot,
    pub referee: Option<TeamId>,
}

/// Proposed fixtures plus how they were chosen. Nothing here is persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub matches: Vec<ProposedMatch>,
    /// Pairings no slot could take (reported, not fatal).
    pub unscheduled: Vec<Pairing>,
    pub groups: Vec<Group>,
    pub byes: Vec<TeamId>,
    /// Knockout phases: the round-1 bracket to hand back when persisting.
    #[serde(default)]
    pub bracket: Option<KnockoutDraw>,
    pub stats: GenerationStats,
}
