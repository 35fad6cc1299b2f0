//! Integration tests for the season flow: preview, persist, results, close, advance.

use chrono::NaiveDate;
use league_scheduler::logic::{
    advance_phase, close_season_phase, current_phase, knockout_bracket_state, persist_schedule,
    phase_schedule_request, preview_next_knockout_round, preview_phase_schedule,
    schedule_next_knockout_round, season_phases, season_standings,
};
use league_scheduler::models::{
    BracketState, EventWindow, GenerationOptions, MatchStatus, Pairing, PhaseScheduleOptions,
    PhaseState, ProposedMatch, ScheduleError, Season, SlotSettings, SlotSource, StandingsConfig,
    TeamId, TournamentHandler, VenueId,
};
use uuid::Uuid;

fn season_with_teams(handler: TournamentHandler, n: usize) -> (Season, Vec<TeamId>, Vec<VenueId>) {
    let mut season = Season::new("Spring 2024", Uuid::nil(), handler);
    let ids = (0..n)
        .map(|i| season.add_team(format!("Team {}", i + 1)).unwrap())
        .collect();
    let venues = vec![season.add_venue("Court 1"), season.add_venue("Court 2")];
    (season, ids, venues)
}

/// One tournament day, 08:00 to 20:00, hourly slots on the given venues.
fn day_options(venues: &[VenueId]) -> PhaseScheduleOptions {
    PhaseScheduleOptions {
        slot_source: SlotSource::Events {
            events: vec![EventWindow {
                date: NaiveDate::from_ymd_opt(2024, 4, 6).unwrap(),
                start_time: "08:00".to_string(),
                end_time: "20:00".to_string(),
                venue_ids: venues.to_vec(),
                team_ids: Vec::new(),
            }],
        },
        slot_settings: SlotSettings::default(),
        constraints: Default::default(),
        pairing: None,
        options: GenerationOptions {
            attempts: 4,
            workers: Some(1),
            ..GenerationOptions::default()
        },
    }
}

/// Complete every open match of a phase; the team added earlier always wins 1-0.
fn play_out(season: &mut Season, phase_id: &str, ids: &[TeamId]) {
    let open: Vec<_> = season
        .stage_matches(phase_id)
        .filter(|m| !m.is_completed())
        .map(|m| (m.id, m.home_team_id, m.away_team_id))
        .collect();
    for (id, home, away) in open {
        let rank = |t: TeamId| ids.iter().position(|x| *x == t).unwrap();
        let (h, a) = if rank(home) < rank(away) { (1, 0) } else { (0, 1) };
        season.record_result(id, h, a).unwrap();
    }
}

#[test]
fn league_season_from_preview_to_final_table() {
    let (mut season, ids, venues) = season_with_teams(TournamentHandler::LeagueOnly, 4);
    let config = StandingsConfig::default();
    let opts = day_options(&venues[..1]);

    let preview = preview_phase_schedule(&season, "regular_season", &opts, &config).unwrap();
    assert_eq!(preview.matches.len(), 12);
    assert!(preview.unscheduled.is_empty());
    // Dry run: nothing stored yet.
    assert!(season.matches.is_empty());

    let created = persist_schedule(&mut season, "regular_season", &preview.matches, preview.groups, None).unwrap();
    assert_eq!(created.len(), 12);
    assert!(season
        .matches
        .iter()
        .all(|m| m.status == MatchStatus::Scheduled && m.home_score == 0 && m.away_score == 0));
    assert_eq!(season_phases(&season)[0].status, PhaseState::Scheduled);

    assert_eq!(
        preview_phase_schedule(&season, "regular_season", &opts, &config).unwrap_err(),
        ScheduleError::PhaseAlreadyScheduled("regular_season".to_string())
    );

    play_out(&mut season, "regular_season", &ids);
    let statuses = season_phases(&season);
    assert_eq!(statuses[0].status, PhaseState::Completed);
    assert_eq!(statuses[0].completed_matches, 12);
    assert!(current_phase(&statuses).is_none());

    let table = season_standings(&season, &config);
    let order: Vec<TeamId> = table.iter().map(|r| r.team_id).collect();
    assert_eq!(order, ids);
    assert_eq!(table[0].points, 18);
    assert_eq!(table[3].points, 0);
}

#[test]
fn persist_is_all_or_nothing() {
    let (mut season, ids, venues) = season_with_teams(TournamentHandler::LeagueOnly, 2);
    let at = NaiveDate::from_ymd_opt(2024, 4, 6)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    let good = ProposedMatch {
        stage_id: "regular_season".to_string(),
        home_team_id: ids[0],
        away_team_id: ids[1],
        referee_team_id: None,
        venue_id: venues[0],
        scheduled_at: at,
    };
    let stranger = Uuid::from_u128(77);
    let bad = ProposedMatch {
        away_team_id: stranger,
        ..good.clone()
    };

    assert_eq!(
        persist_schedule(&mut season, "regular_season", &[good.clone(), bad], Vec::new(), None),
        Err(ScheduleError::TeamNotFound(stranger))
    );
    assert!(season.matches.is_empty());

    let wrong_stage = ProposedMatch {
        stage_id: "final".to_string(),
        ..good.clone()
    };
    assert!(matches!(
        persist_schedule(&mut season, "regular_season", &[wrong_stage], Vec::new(), None),
        Err(ScheduleError::InvalidConstraint(_))
    ));

    let same_team = ProposedMatch {
        away_team_id: ids[0],
        ..good.clone()
    };
    assert_eq!(
        persist_schedule(&mut season, "regular_season", &[same_team], Vec::new(), None),
        Err(ScheduleError::SameTeam(ids[0]))
    );
    assert!(season.matches.is_empty());

    assert!(persist_schedule(&mut season, "regular_season", &[good], Vec::new(), None).is_ok());
    assert_eq!(season.matches.len(), 1);
}

#[test]
fn results_corrections_and_status_changes() {
    let (mut season, ids, venues) = season_with_teams(TournamentHandler::LeagueOnly, 3);
    let preview =
        preview_phase_schedule(&season, "regular_season", &day_options(&venues), &StandingsConfig::default())
            .unwrap();
    persist_schedule(&mut season, "regular_season", &preview.matches, Vec::new(), None).unwrap();
    let first = season.matches[0].id;
    let second = season.matches[1].id;

    season.record_result(first, 2, 2).unwrap();
    assert_eq!(
        season.record_result(first, 3, 2),
        Err(ScheduleError::MatchAlreadyCompleted(first))
    );
    season.correct_result(first, 3, 2).unwrap();
    assert_eq!(season.matches[0].home_score, 3);
    assert!(season.correct_result(second, 1, 0).is_err());

    season.set_match_status(second, MatchStatus::Cancelled).unwrap();
    assert!(season.record_result(second, 1, 0).is_err());
    assert!(season.set_match_status(second, MatchStatus::Completed).is_err());
    assert_eq!(
        season.record_result(Uuid::from_u128(5), 1, 0),
        Err(ScheduleError::MatchNotFound(Uuid::from_u128(5)))
    );

    // Teams with matches cannot leave.
    assert!(season.remove_team(ids[0]).is_err());
    assert_eq!(
        season.add_team("team 1"),
        Err(ScheduleError::DuplicateTeamName("team 1".to_string()))
    );
}

#[test]
fn closing_a_phase_forfeits_what_is_left() {
    let (mut season, _ids, venues) = season_with_teams(TournamentHandler::LeagueOnly, 4);
    let preview =
        preview_phase_schedule(&season, "regular_season", &day_options(&venues), &StandingsConfig::default())
            .unwrap();
    persist_schedule(&mut season, "regular_season", &preview.matches, Vec::new(), None).unwrap();
    let first = season.matches[0].id;
    season.record_result(first, 1, 0).unwrap();

    assert_eq!(close_season_phase(&mut season, "regular_season"), Ok(11));
    assert_eq!(season_phases(&season)[0].status, PhaseState::Completed);
    assert_eq!(
        close_season_phase(&mut season, "regular_season"),
        Err(ScheduleError::PhaseClosed("regular_season".to_string()))
    );
}

#[test]
fn round_robin_then_final_between_the_top_two() {
    let (mut season, ids, venues) = season_with_teams(TournamentHandler::RoundRobinFinal, 4);
    let config = StandingsConfig::default();
    let opts = day_options(&venues[..1]);

    let preview = preview_phase_schedule(&season, "regular_season", &opts, &config).unwrap();
    assert_eq!(preview.matches.len(), 6);
    persist_schedule(&mut season, "regular_season", &preview.matches, Vec::new(), None).unwrap();

    assert_eq!(
        advance_phase(&mut season, "regular_season", &config),
        Err(ScheduleError::PhaseNotCompleted("regular_season".to_string()))
    );
    assert_eq!(
        preview_phase_schedule(&season, "final", &opts, &config).unwrap_err(),
        ScheduleError::PhaseNotCurrent("final".to_string())
    );

    play_out(&mut season, "regular_season", &ids);

    // Meetings from the regular season are not repeats inside the final.
    let request = phase_schedule_request(&season, "final", &opts, &config).unwrap();
    assert_eq!(request.teams, vec![ids[0], ids[1]]);
    assert!(request.history.is_empty());

    // The final can be previewed straight away: the top two are derived from the table.
    let final_preview = preview_phase_schedule(&season, "final", &opts, &config).unwrap();
    assert_eq!(final_preview.matches.len(), 1);
    assert_eq!(final_preview.stats.quality.repeat_violations, 0);
    let fixture = &final_preview.matches[0];
    assert_eq!((fixture.home_team_id, fixture.away_team_id), (ids[0], ids[1]));

    assert_eq!(advance_phase(&mut season, "regular_season", &config), Ok(vec![ids[0], ids[1]]));
    assert_eq!(season.qualified.get("final"), Some(&vec![ids[0], ids[1]]));

    let bracket = final_preview.bracket.clone();
    persist_schedule(&mut season, "final", &final_preview.matches, Vec::new(), bracket).unwrap();
    play_out(&mut season, "final", &ids);
    assert!(season_phases(&season)
        .iter()
        .all(|s| s.status == PhaseState::Completed));
}

#[test]
fn group_stage_feeds_a_crossed_knockout() {
    let (mut season, ids, venues) = season_with_teams(TournamentHandler::GroupsKnockout, 8);
    let config = StandingsConfig::default();
    let opts = day_options(&venues);

    let preview = preview_phase_schedule(&season, "group_stage", &opts, &config).unwrap();
    assert_eq!(preview.groups.len(), 2);
    assert_eq!(preview.groups[0].teams, vec![ids[0], ids[3], ids[4], ids[7]]);
    assert_eq!(preview.matches.len(), 12);
    assert!(preview.unscheduled.is_empty());

    persist_schedule(&mut season, "group_stage", &preview.matches, preview.groups.clone(), None).unwrap();
    assert_eq!(season.groups.get("group_stage"), Some(&preview.groups));
    play_out(&mut season, "group_stage", &ids);

    // A1, B1, A2, B2
    let qualified = advance_phase(&mut season, "group_stage", &config).unwrap();
    assert_eq!(qualified, vec![ids[0], ids[1], ids[3], ids[2]]);

    let knockout = preview_phase_schedule(&season, "knockout", &opts, &config).unwrap();
    let mut pairs: Vec<(TeamId, TeamId)> = knockout
        .matches
        .iter()
        .map(|m| (m.home_team_id, m.away_team_id))
        .collect();
    pairs.sort();
    let mut expected = vec![(ids[0], ids[2]), (ids[1], ids[3])];
    expected.sort();
    assert_eq!(pairs, expected);
}

#[test]
fn closing_a_phase_leaves_the_table_as_it_was() {
    let (mut season, ids, venues) = season_with_teams(TournamentHandler::RoundRobinFinal, 4);
    let config = StandingsConfig::default();
    let preview = preview_phase_schedule(&season, "regular_season", &day_options(&venues), &config).unwrap();
    persist_schedule(&mut season, "regular_season", &preview.matches, Vec::new(), None).unwrap();
    let first = season.matches[0].id;
    season.record_result(first, 2, 0).unwrap();

    let before = season_standings(&season, &config);
    assert_eq!(close_season_phase(&mut season, "regular_season"), Ok(5));
    assert_eq!(season_standings(&season, &config), before);
    assert_eq!(before.iter().map(|r| r.played).sum::<u32>(), 2);
    assert_eq!(season.matches.iter().filter(|m| m.forfeited).count(), 5);

    // The only winner goes through first; the rest are level and ordered by id.
    let qualified = advance_phase(&mut season, "regular_season", &config).unwrap();
    assert_eq!(qualified[0], season.matches[0].home_team_id);
    assert_eq!(qualified.len(), 2);
    assert!(ids.contains(&qualified[1]));

    // A corrected forfeit is a real result again.
    let forfeit = season.matches.iter().find(|m| m.forfeited).unwrap().id;
    season.correct_result(forfeit, 1, 1).unwrap();
    let played: u32 = season_standings(&season, &config).iter().map(|r| r.played).sum();
    assert_eq!(played, 4);
}

#[test]
fn knockout_is_played_round_by_round_to_a_champion() {
    let (mut season, ids, venues) = season_with_teams(TournamentHandler::Knockout, 8);
    let config = StandingsConfig::default();
    let opts = day_options(&venues);
    let knockout = "knockout".to_string();

    let preview = preview_phase_schedule(&season, "knockout", &opts, &config).unwrap();
    assert_eq!(preview.matches.len(), 4);
    let bracket = preview.bracket.clone().unwrap();
    assert_eq!(bracket.bracket_size, 8);

    // The bracket has to come back with the matches.
    assert!(persist_schedule(&mut season, "knockout", &preview.matches, Vec::new(), None).is_err());
    assert!(season.matches.is_empty());
    persist_schedule(&mut season, "knockout", &preview.matches, Vec::new(), Some(bracket)).unwrap();
    assert_eq!(
        preview_next_knockout_round(&season, "knockout", &opts).unwrap_err(),
        ScheduleError::RoundInProgress {
            phase: knockout.clone(),
            round: 1
        }
    );

    play_out(&mut season, "knockout", &ids);
    // Every persisted match is done, but the bracket is not.
    let statuses = season_phases(&season);
    assert_eq!(statuses[0].status, PhaseState::InProgress);
    assert_eq!(current_phase(&statuses).map(|s| s.phase_id.clone()), Some(knockout.clone()));

    let semis = preview_next_knockout_round(&season, "knockout", &opts).unwrap();
    assert_eq!(semis.matches.len(), 2);
    schedule_next_knockout_round(&mut season, "knockout", &semis.matches).unwrap();
    assert_eq!(season.matches.iter().filter(|m| m.round == 2).count(), 2);
    play_out(&mut season, "knockout", &ids);

    // Final between seeds 1 and 2, third place between the semi-final losers.
    match knockout_bracket_state(&season, "knockout").unwrap() {
        BracketState::NextRound { round, pairings } => {
            assert_eq!(round, 3);
            let mut keys: Vec<(TeamId, TeamId)> = pairings.iter().map(|p| p.unordered_key()).collect();
            keys.sort();
            let mut expected = vec![
                Pairing::new(ids[0], ids[1]).unordered_key(),
                Pairing::new(ids[2], ids[3]).unordered_key(),
            ];
            expected.sort();
            assert_eq!(keys, expected);
        }
        other => panic!("expected the final round, got {:?}", other),
    }

    // Only the round's own pairings are accepted.
    assert!(matches!(
        schedule_next_knockout_round(&mut season, "knockout", &semis.matches),
        Err(ScheduleError::InvalidPlacement(_))
    ));
    let finals = preview_next_knockout_round(&season, "knockout", &opts).unwrap();
    schedule_next_knockout_round(&mut season, "knockout", &finals.matches).unwrap();
    play_out(&mut season, "knockout", &ids);

    assert_eq!(
        knockout_bracket_state(&season, "knockout"),
        Ok(BracketState::Resolved { champion: ids[0] })
    );
    let statuses = season_phases(&season);
    assert_eq!(statuses[0].status, PhaseState::Completed);
    assert!(current_phase(&statuses).is_none());
    assert_eq!(season.matches.len(), 8);
    assert_eq!(
        preview_next_knockout_round(&season, "knockout", &opts).unwrap_err(),
        ScheduleError::PhaseClosed(knockout)
    );
}

#[test]
fn closing_a_knockout_between_rounds_ends_it() {
    let (mut season, ids, venues) = season_with_teams(TournamentHandler::Knockout, 4);
    let config = StandingsConfig::default();
    let opts = day_options(&venues);
    let preview = preview_phase_schedule(&season, "knockout", &opts, &config).unwrap();
    let bracket = preview.bracket.clone();
    persist_schedule(&mut season, "knockout", &preview.matches, Vec::new(), bracket).unwrap();
    play_out(&mut season, "knockout", &ids);
    assert_eq!(season_phases(&season)[0].status, PhaseState::InProgress);

    assert_eq!(close_season_phase(&mut season, "knockout"), Ok(0));
    assert_eq!(season_phases(&season)[0].status, PhaseState::Completed);
    assert_eq!(
        preview_next_knockout_round(&season, "knockout", &opts).unwrap_err(),
        ScheduleError::PhaseClosed("knockout".to_string())
    );
}
