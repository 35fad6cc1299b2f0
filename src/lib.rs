//! League scheduler: pairings, slot allocation, multi-attempt schedule optimization,
//! phase progression and standings for a recreational league.

pub mod logic;
pub mod models;

pub use logic::{
    advance_phase, advancing_teams, allocate_slots, bracket_state, bracket_winners, calculate_standings, close_phase,
    close_season_phase, current_phase, evaluate_schedule, generate_phase_pairings, generate_schedule,
    group_assignment, group_standings, knockout, knockout_bracket_state, knockout_winner, next_knockout_round,
    optimize, persist_schedule, phase_schedule_request, phase_status, preview_next_knockout_round,
    preview_phase_schedule, round_robin, schedule_csv_string, schedule_next_knockout_round, season_phase_statuses, season_phases, season_standings, select_advancing_teams,
    swiss_pairing, third_place_pairing, write_schedule_csv,
};
pub use models::{
    AdvancementRules, AdvancementSource, BracketState, ConstraintSet, GenerationOptions, Match, MatchGenerationType, MatchId,
    MatchStatus, Pairing, PhaseConfig, PhaseId, PhaseScheduleOptions, PhaseState, PhaseStatus, ProposedMatch,
    ScheduleError, ScheduleRequest, ScheduleResponse, Season, SeasonId, SlotSource, StandingsConfig,
    StandingsRow, Team, TeamId, TournamentHandler, Venue, VenueId,
};
