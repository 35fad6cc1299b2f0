//! Integration tests for the phase state machine and advancement selection.

use league_scheduler::logic::{
    close_phase, current_phase, derive_state, ensure_can_schedule, phase_status,
    season_phase_statuses, select_advancing_teams,
};
use league_scheduler::models::{
    AdvancementRules, AdvancementSource, Match, MatchGenerationType, MatchStatus, PhaseConfig, PhaseState,
    ScheduleError, StandingsRow, TeamId, TournamentHandler,
};
use uuid::Uuid;

fn team(i: u128) -> TeamId {
    Uuid::from_u128(i)
}

fn stage_matches(stage: &str, total: usize, completed: usize) -> Vec<Match> {
    (0..total)
        .map(|i| {
            let m = Match::new(Uuid::nil(), Uuid::nil(), stage, team(1), team(2)).unwrap();
            if i < completed {
                m.completed_with(1, 0)
            } else {
                m
            }
        })
        .collect()
}

#[test]
fn status_follows_match_counts() {
    assert_eq!(derive_state(0, 0), PhaseState::Pending);
    assert_eq!(derive_state(10, 0), PhaseState::Scheduled);
    assert_eq!(derive_state(10, 4), PhaseState::InProgress);
    assert_eq!(derive_state(10, 10), PhaseState::Completed);
}

#[test]
fn phase_status_counts_only_its_own_stage() {
    let phase = PhaseConfig::new("regular_season", "Regular season", 1, MatchGenerationType::RoundRobin);
    let mut matches = stage_matches("regular_season", 10, 4);
    matches.extend(stage_matches("final", 1, 1));

    let status = phase_status(&phase, &matches);
    assert_eq!(status.total_matches, 10);
    assert_eq!(status.completed_matches, 4);
    assert_eq!(status.status, PhaseState::InProgress);
}

#[test]
fn matchless_phase_before_a_started_one_is_skipped() {
    let phases = TournamentHandler::GroupsKnockout.phases();
    let matches = stage_matches("knockout", 2, 0);
    let statuses = season_phase_statuses(&phases, &matches);

    assert_eq!(statuses[0].phase_id, "group_stage");
    assert_eq!(statuses[0].status, PhaseState::Completed);
    assert!(statuses[0].skipped);
    assert_eq!(statuses[1].status, PhaseState::Scheduled);
    assert!(!statuses[1].skipped);
    assert_eq!(current_phase(&statuses).map(|s| s.phase_id.as_str()), Some("knockout"));
}

#[test]
fn current_phase_is_the_first_unfinished_one() {
    let phases = TournamentHandler::SwissSystem.phases();
    let mut matches = stage_matches("swiss_round_1", 4, 4);
    matches.extend(stage_matches("swiss_round_2", 4, 1));
    let statuses = season_phase_statuses(&phases, &matches);
    assert_eq!(current_phase(&statuses).map(|s| s.phase_id.as_str()), Some("swiss_round_2"));

    let done = stage_matches("swiss_round_1", 1, 1)
        .into_iter()
        .chain(stage_matches("swiss_round_2", 1, 1))
        .chain(stage_matches("swiss_round_3", 1, 1))
        .collect::<Vec<_>>();
    assert!(current_phase(&season_phase_statuses(&phases, &done)).is_none());
}

#[test]
fn scheduling_rules() {
    let phases = TournamentHandler::RoundRobinFinal.phases();

    assert!(ensure_can_schedule(&phases, &[], "regular_season").is_ok());
    assert_eq!(
        ensure_can_schedule(&phases, &[], "final").unwrap_err(),
        ScheduleError::PhaseNotCurrent("final".to_string())
    );
    assert_eq!(
        ensure_can_schedule(&phases, &[], "playoffs").unwrap_err(),
        ScheduleError::UnknownPhase("playoffs".to_string())
    );

    let in_progress = stage_matches("regular_season", 6, 2);
    assert_eq!(
        ensure_can_schedule(&phases, &in_progress, "regular_season").unwrap_err(),
        ScheduleError::PhaseAlreadyScheduled("regular_season".to_string())
    );

    let finished = stage_matches("regular_season", 6, 6);
    assert_eq!(
        ensure_can_schedule(&phases, &finished, "regular_season").unwrap_err(),
        ScheduleError::PhaseClosed("regular_season".to_string())
    );
    assert_eq!(ensure_can_schedule(&phases, &finished, "final").unwrap().id, "final");
}

#[test]
fn closing_forfeits_the_remaining_matches_once() {
    let phase_id = "regular_season".to_string();
    let mut matches = stage_matches("regular_season", 5, 2);
    matches[3].status = MatchStatus::Postponed;
    matches.extend(stage_matches("final", 1, 0));

    assert_eq!(close_phase(&phase_id, &mut matches), Ok(3));
    assert!(matches[..5].iter().all(|m| m.status == MatchStatus::Completed));
    // Only the forced matches are flagged as forfeits.
    assert!(!matches[0].forfeited && !matches[1].forfeited);
    assert!(matches[2..5].iter().all(|m| m.forfeited));
    // Recorded scores are kept; forfeited matches stay 0-0.
    assert_eq!(matches[4].home_score, 0);
    assert_eq!(matches[5].status, MatchStatus::Scheduled);

    assert_eq!(
        close_phase(&phase_id, &mut matches),
        Err(ScheduleError::PhaseClosed(phase_id.clone()))
    );
    assert_eq!(close_phase(&"knockout".to_string(), &mut matches), Ok(0));
}

fn row(i: u128) -> StandingsRow {
    StandingsRow::new(team(i))
}

#[test]
fn advancement_takes_top_or_bottom_of_the_table() {
    let table: Vec<StandingsRow> = (1..=5).map(row).collect();
    let mut rules = AdvancementRules {
        count: 2,
        source: AdvancementSource::Top,
        source_group: None,
        destination_phase: "final".to_string(),
    };
    assert_eq!(select_advancing_teams(&rules, &table, &[]), vec![team(1), team(2)]);

    rules.source = AdvancementSource::Bottom;
    assert_eq!(select_advancing_teams(&rules, &table, &[]), vec![team(4), team(5)]);

    rules.count = 9;
    assert_eq!(select_advancing_teams(&rules, &table, &[]).len(), 5);
}

#[test]
fn group_winners_are_interleaved() {
    let groups = vec![
        ("A".to_string(), vec![row(1), row(2), row(3)]),
        ("B".to_string(), vec![row(4), row(5), row(6)]),
    ];
    let mut rules = AdvancementRules {
        count: 2,
        source: AdvancementSource::Top,
        source_group: None,
        destination_phase: "knockout".to_string(),
    };
    assert_eq!(
        select_advancing_teams(&rules, &[], &groups),
        vec![team(1), team(4), team(2), team(5)]
    );

    rules.source_group = Some("B".to_string());
    assert_eq!(select_advancing_teams(&rules, &[], &groups), vec![team(4), team(5)]);
}
