//! Data structures for league scheduling: teams, matches, phases, slots, constraints and seasons.

mod constraints;
mod draw;
mod error;
mod game;
mod handler;
mod phase;
mod schedule;
mod season;
mod slot;
mod standings;
mod team;

pub use constraints::{
    ConstraintSet, GenerationOptions, GenerationStats, ScheduleQuality, ScoreWeights, DEFAULT_ATTEMPTS,
    DEFAULT_BASE_SEED,
};
pub(crate) use draw::snake_index;
pub use draw::{
    BracketSlot, BracketState, Group, GroupingRule, KnockoutDraw, PairingSettings, PhaseDraw, SeedingMethod, SeedingPattern,
};
pub use error::ScheduleError;
pub use game::{CompetitionId, Match, MatchId, MatchStatus, Pairing, ProposedMatch, SeasonId};
pub use handler::{HandlerSettings, TournamentHandler};
pub use phase::{
    AdvancementRules, AdvancementSource, MatchGenerationType, PhaseConfig, PhaseId, PhaseSchedulingConstraints,
    PhaseState, PhaseStatus,
};
pub use schedule::{Assignment, PhaseScheduleOptions, ScheduleRequest, ScheduleResponse};
pub use season::Season;
pub use slot::{DateRangeAvailability, EventWindow, Slot, SlotSettings, SlotSource};
pub use standings::{PointsConfig, StandingsConfig, StandingsRow, TieBreaker};
pub use team::{Team, TeamId, Venue, VenueId};
