//! Season flow: preview a phase schedule, persist it, close phases and advance teams.

use crate::logic::pairing::bracket_state;
use crate::logic::phases::{
    check_schedulable, close_phase, find_phase, season_phase_statuses, select_advancing_teams,
};
use crate::logic::scheduler::{generate_schedule, schedule_pairings};
use crate::logic::standings::{calculate_standings, group_standings};
use crate::models::{
    BracketState, Group, KnockoutDraw, Match, MatchGenerationType, MatchId, Pairing,
    PairingSettings, PhaseConfig, PhaseScheduleOptions, PhaseState, PhaseStatus, ProposedMatch,
    ScheduleError, ScheduleRequest, ScheduleResponse, Season, StandingsConfig, StandingsRow, TeamId,
};

/// Ordered phase list with derived status.
///
/// A knockout phase whose persisted rounds are all completed stays `in_progress` until
/// its bracket has a champion, unless an administrator closed it.
pub fn season_phases(season: &Season) -> Vec<PhaseStatus> {
    let mut statuses = season_phase_statuses(&season.phases, &season.matches);
    for status in statuses.iter_mut() {
        if status.status == PhaseState::Completed && !status.skipped && bracket_open(season, &status.phase_id) {
            status.status = PhaseState::InProgress;
        }
    }
    statuses
}

fn bracket_open(season: &Season, phase_id: &str) -> bool {
    if season.closed_phases.contains(phase_id) {
        return false;
    }
    let Some(draw) = season.brackets.get(phase_id) else {
        return false;
    };
    let stage: Vec<Match> = season.stage_matches(phase_id).cloned().collect();
    !matches!(bracket_state(draw, &stage), Ok(BracketState::Resolved { .. }))
}

/// Full-season table over every completed match.
pub fn season_standings(season: &Season, config: &StandingsConfig) -> Vec<StandingsRow> {
    calculate_standings(&season.team_ids(), &season.matches, config)
}

/// Teams taking part in `phase`, in seed order.
///
/// 1. Teams stored by `advance_phase`.
/// 2. Else teams selected by earlier phases whose advancement targets this phase.
/// 3. Else the whole roster: roster order before any result, table order after.
pub fn phase_participants(
    season: &Season,
    phase: &PhaseConfig,
    config: &StandingsConfig,
) -> Result<Vec<TeamId>, ScheduleError> {
    if let Some(teams) = season.qualified.get(&phase.id) {
        return Ok(teams.clone());
    }

    let feeders: Vec<&PhaseConfig> = season
        .phases
        .iter()
        .filter(|p| {
            p.advancement
                .as_ref()
                .is_some_and(|r| r.destination_phase == phase.id)
        })
        .collect();
    if !feeders.is_empty() {
        let mut teams = Vec::new();
        for feeder in feeders {
            for t in advancing_teams(season, feeder, config)? {
                if !teams.contains(&t) {
                    teams.push(t);
                }
            }
        }
        return Ok(teams);
    }

    if !season.matches.iter().any(Match::is_played) {
        return Ok(season.team_ids());
    }
    Ok(season_standings(season, config)
        .into_iter()
        .map(|r| r.team_id)
        .collect())
}

/// Build the dry-run request for a pending phase.
pub fn phase_schedule_request(
    season: &Season,
    phase_id: &str,
    opts: &PhaseScheduleOptions,
    config: &StandingsConfig,
) -> Result<ScheduleRequest, ScheduleError> {
    let statuses = season_phases(season);
    let phase = check_schedulable(&season.phases, &statuses, phase_id)?;
    let teams = phase_participants(season, phase, config)?;

    let mut pairing = opts
        .pairing
        .clone()
        .unwrap_or_else(|| season.settings.pairing_settings());
    if phase.generation == MatchGenerationType::SwissPairing && pairing.round == 0 {
        pairing.round = season
            .phases
            .iter()
            .filter(|p| p.generation == MatchGenerationType::SwissPairing && p.order <= phase.order)
            .count() as u32;
    }

    Ok(ScheduleRequest {
        competition_id: season.competition_id,
        season_id: season.id,
        phase: phase.clone(),
        teams,
        slot_source: opts.slot_source.clone(),
        slot_settings: opts.slot_settings,
        constraints: opts.constraints.clone(),
        pairing,
        options: opts.options.clone(),
        history: season.stage_matches(&phase.id).map(Match::pairing).collect(),
    })
}

/// Dry run: propose fixtures for a pending phase without touching the season.
pub fn preview_phase_schedule(
    season: &Season,
    phase_id: &str,
    opts: &PhaseScheduleOptions,
    config: &StandingsConfig,
) -> Result<ScheduleResponse, ScheduleError> {
    generate_schedule(&phase_schedule_request(season, phase_id, opts, config)?)
}

/// Persist an accepted schedule: every row is validated first, then all are added
/// (status `scheduled`, zero scores) or none are.
///
/// Knockout phases must hand back the preview's `bracket`, and the matches must be
/// exactly its round-1 pairings; later rounds go through `schedule_next_knockout_round`.
pub fn persist_schedule(
    season: &mut Season,
    phase_id: &str,
    proposed: &[ProposedMatch],
    groups: Vec<Group>,
    bracket: Option<KnockoutDraw>,
) -> Result<Vec<MatchId>, ScheduleError> {
    let statuses = season_phases(season);
    let phase = check_schedulable(&season.phases, &statuses, phase_id)?.clone();
    match (&bracket, phase.generation) {
        (None, MatchGenerationType::Knockout) => {
            return Err(ScheduleError::InvalidConstraint(format!(
                "knockout phase '{}' needs its bracket",
                phase.id
            )))
        }
        (Some(draw), MatchGenerationType::Knockout) => {
            if !same_fixtures(proposed, &draw.pairings()) {
                return Err(ScheduleError::InvalidPlacement(
                    "matches do not match the bracket's first round".to_string(),
                ));
            }
        }
        (Some(_), _) => {
            return Err(ScheduleError::InvalidConstraint(format!(
                "phase '{}' is not a knockout",
                phase.id
            )))
        }
        (None, _) => {}
    }
    let rows = validate_rows(season, &phase.id, proposed)?;

    let ids = rows.iter().map(|m| m.id).collect();
    season.matches.extend(rows);
    if !groups.is_empty() {
        season.groups.insert(phase.id.clone(), groups);
    }
    if let Some(draw) = bracket {
        season.brackets.insert(phase.id.clone(), draw);
    }
    log::info!("season {}: persisted {} matches for phase {}", season.id, proposed.len(), phase.id);
    Ok(ids)
}

/// Check every proposed row against the season and turn it into a match row.
fn validate_rows(season: &Season, phase_id: &str, proposed: &[ProposedMatch]) -> Result<Vec<Match>, ScheduleError> {
    if proposed.is_empty() {
        return Err(ScheduleError::InvalidConstraint("schedule has no matches".to_string()));
    }
    let mut rows = Vec::with_capacity(proposed.len());
    for p in proposed {
        if p.stage_id != phase_id {
            return Err(ScheduleError::InvalidConstraint(format!(
                "match belongs to phase '{}', not '{}'",
                p.stage_id, phase_id
            )));
        }
        for team in [Some(p.home_team_id), Some(p.away_team_id), p.referee_team_id]
            .into_iter()
            .flatten()
        {
            if !season.has_team(team) {
                return Err(ScheduleError::TeamNotFound(team));
            }
        }
        if !season.venues.is_empty() && !season.venues.iter().any(|v| v.id == p.venue_id) {
            return Err(ScheduleError::InvalidConstraint("unknown venue".to_string()));
        }
        rows.push(Match::from_proposed(season.competition_id, season.id, p)?);
    }
    Ok(rows)
}

/// Same fixtures regardless of order or home/away.
fn same_fixtures(proposed: &[ProposedMatch], expected: &[Pairing]) -> bool {
    let mut got: Vec<_> = proposed
        .iter()
        .map(|p| Pairing::new(p.home_team_id, p.away_team_id).unordered_key())
        .collect();
    let mut want: Vec<_> = expected.iter().map(Pairing::unordered_key).collect();
    got.sort();
    want.sort();
    got == want
}

/// Where a knockout phase's bracket stands.
pub fn knockout_bracket_state(season: &Season, phase_id: &str) -> Result<BracketState, ScheduleError> {
    let phase = find_phase(&season.phases, phase_id)?;
    let draw = season.brackets.get(&phase.id).ok_or_else(|| {
        ScheduleError::InvalidConstraint(format!("phase '{}' has no knockout bracket", phase.id))
    })?;
    let stage: Vec<Match> = season.stage_matches(&phase.id).cloned().collect();
    bracket_state(draw, &stage)
}

/// The round waiting to be scheduled and its pairings.
fn pending_round(season: &Season, phase_id: &str) -> Result<(u32, Vec<Pairing>), ScheduleError> {
    let state = knockout_bracket_state(season, phase_id)?;
    if season.closed_phases.contains(phase_id) {
        return Err(ScheduleError::PhaseClosed(phase_id.to_string()));
    }
    match state {
        BracketState::NextRound { round, pairings } => Ok((round, pairings)),
        BracketState::RoundInProgress { round } => Err(ScheduleError::RoundInProgress {
            phase: phase_id.to_string(),
            round,
        }),
        BracketState::Resolved { .. } => Err(ScheduleError::PhaseClosed(phase_id.to_string())),
    }
}

/// Dry run for the next round of a knockout phase, placed like any other schedule.
pub fn preview_next_knockout_round(
    season: &Season,
    phase_id: &str,
    opts: &PhaseScheduleOptions,
) -> Result<ScheduleResponse, ScheduleError> {
    let (round, pairings) = pending_round(season, phase_id)?;
    let phase = find_phase(&season.phases, phase_id)?;
    let teams: Vec<TeamId> = season
        .brackets
        .get(&phase.id)
        .map(|draw| {
            draw.pairings()
                .iter()
                .flat_map(|p| [p.home, p.away])
                .chain(draw.byes())
                .collect()
        })
        .unwrap_or_default();

    let request = ScheduleRequest {
        competition_id: season.competition_id,
        season_id: season.id,
        phase: phase.clone(),
        teams,
        slot_source: opts.slot_source.clone(),
        slot_settings: opts.slot_settings,
        constraints: opts.constraints.clone(),
        pairing: PairingSettings::default(),
        options: opts.options.clone(),
        history: season.stage_matches(&phase.id).map(Match::pairing).collect(),
    };
    log::debug!("phase {}: previewing knockout round {}", phase.id, round);
    let placed = schedule_pairings(&request, &pairings)?;
    Ok(ScheduleResponse {
        matches: placed.matches,
        unscheduled: placed.unscheduled,
        groups: Vec::new(),
        byes: Vec::new(),
        bracket: None,
        stats: placed.stats,
    })
}

/// Persist the next knockout round under the same phase. The matches must be exactly
/// the round's pairings (home/away may be swapped).
pub fn schedule_next_knockout_round(
    season: &mut Season,
    phase_id: &str,
    proposed: &[ProposedMatch],
) -> Result<Vec<MatchId>, ScheduleError> {
    let (round, pairings) = pending_round(season, phase_id)?;
    if !same_fixtures(proposed, &pairings) {
        return Err(ScheduleError::InvalidPlacement(format!(
            "matches do not match the pairings of round {}",
            round
        )));
    }
    let mut rows = validate_rows(season, phase_id, proposed)?;
    for row in rows.iter_mut() {
        row.round = round;
    }

    let ids = rows.iter().map(|m| m.id).collect();
    season.matches.extend(rows);
    log::info!(
        "season {}: persisted round {} of phase {} ({} matches)",
        season.id,
        round,
        phase_id,
        proposed.len()
    );
    Ok(ids)
}

/// Administrative close of a phase (remaining matches forfeited). Closing is final:
/// a knockout phase stops there even without a champion.
pub fn close_season_phase(season: &mut Season, phase_id: &str) -> Result<usize, ScheduleError> {
    let phase_id = find_phase(&season.phases, phase_id)?.id.clone();
    if season.closed_phases.contains(&phase_id) {
        return Err(ScheduleError::PhaseClosed(phase_id));
    }
    let awaiting_round = bracket_open(season, &phase_id);
    let forced = match close_phase(&phase_id, &mut season.matches) {
        Err(ScheduleError::PhaseClosed(_)) if awaiting_round => 0,
        other => other?,
    };
    if season.stage_matches(&phase_id).next().is_some() {
        season.closed_phases.insert(phase_id);
    }
    Ok(forced)
}

/// Teams a completed phase sends on, per its advancement rules. Does not modify the season.
pub fn advancing_teams(
    season: &Season,
    phase: &PhaseConfig,
    config: &StandingsConfig,
) -> Result<Vec<TeamId>, ScheduleError> {
    let Some(rules) = phase.advancement.as_ref() else {
        return Ok(Vec::new());
    };
    let completed = season_phases(season)
        .iter()
        .any(|s| s.phase_id == phase.id && s.status == PhaseState::Completed);
    if !completed {
        return Err(ScheduleError::PhaseNotCompleted(phase.id.clone()));
    }

    let stage: Vec<Match> = season.stage_matches(&phase.id).cloned().collect();
    let roster: Vec<TeamId> = season
        .team_ids()
        .into_iter()
        .filter(|t| stage.iter().any(|m| m.involves(*t)))
        .collect();
    let table = calculate_standings(&roster, &stage, config);
    let groups = season
        .groups
        .get(&phase.id)
        .map(|g| group_standings(g, &stage, config))
        .unwrap_or_default();

    Ok(select_advancing_teams(rules, &table, &groups))
}

/// Apply a completed phase's advancement: store the qualified teams on the destination.
pub fn advance_phase(
    season: &mut Season,
    phase_id: &str,
    config: &StandingsConfig,
) -> Result<Vec<TeamId>, ScheduleError> {
    let phase = find_phase(&season.phases, phase_id)?.clone();
    let Some(rules) = phase.advancement.as_ref() else {
        return Err(ScheduleError::InvalidConstraint(format!(
            "phase '{}' has no advancement rules",
            phase.id
        )));
    };
    let destination = find_phase(&season.phases, &rules.destination_phase)?.id.clone();
    let teams = advancing_teams(season, &phase, config)?;
    log::info!(
        "season {}: {} team(s) advance from {} to {}",
        season.id,
        teams.len(),
        phase.id,
        destination
    );
    season.qualified.insert(destination, teams.clone());
    Ok(teams)
}
