//! Scheduling logic: standings, pairings, slots, the optimizer, phases and season flow.

mod export;
mod pairing;
mod phases;
mod scheduler;
mod season;
mod slots;
mod standings;

pub use export::{schedule_csv_string, write_schedule_csv, Fixture};
pub use pairing::{
    bracket_state, bracket_winners, generate_phase_pairings, group_assignment, knockout, knockout_winner, next_knockout_round,
    round_robin, round_robin_rounds, swiss_pairing, third_place_pairing, SUPPORTED_BRACKET_SIZES,
};
pub use phases::{
    check_schedulable, close_phase, current_phase, derive_state, ensure_can_schedule, find_phase, phase_status,
    season_phase_statuses, select_advancing_teams,
};
pub use scheduler::{
    attempt_seed, evaluate_schedule, generate_schedule, optimize, run_attempt, schedule_pairings, AttemptInput,
    CandidateSchedule, PlacedPairings,
};
pub use season::{
    advance_phase, advancing_teams, close_season_phase, knockout_bracket_state, persist_schedule,
    phase_participants, phase_schedule_request, preview_next_knockout_round, preview_phase_schedule,
    schedule_next_knockout_round, season_phases, season_standings,
};
pub use slots::{allocate_slots, parse_time};
pub use standings::{calculate_standings, group_standings};
