//! Phase state machine: derived status, current phase, closing and advancement.
//!
//! Nothing here is stored. Status is recomputed from the match list on every call,
//! so concurrent readers can never see a half-updated phase.

use crate::models::{
    AdvancementRules, AdvancementSource, Match, MatchStatus, PhaseConfig, PhaseId, PhaseState,
    PhaseStatus, ScheduleError, StandingsRow, TeamId,
};

/// pending / scheduled / in_progress / completed from match counts.
pub fn derive_state(total: usize, completed: usize) -> PhaseState {
    if total == 0 {
        PhaseState::Pending
    } else if completed == 0 {
        PhaseState::Scheduled
    } else if completed < total {
        PhaseState::InProgress
    } else {
        PhaseState::Completed
    }
}

/// Status of one phase from the season's matches (filtered by stage id here).
pub fn phase_status(phase: &PhaseConfig, matches: &[Match]) -> PhaseStatus {
    let stage: Vec<&Match> = matches.iter().filter(|m| m.stage_id == phase.id).collect();
    let total = stage.len();
    let completed = stage.iter().filter(|m| m.is_completed()).count();
    PhaseStatus {
        phase_id: phase.id.clone(),
        order: phase.order,
        total_matches: total,
        completed_matches: completed,
        status: derive_state(total, completed),
        skipped: false,
    }
}

/// Every phase in `order`, with matchless phases before a started phase shown as skipped.
pub fn season_phase_statuses(phases: &[PhaseConfig], matches: &[Match]) -> Vec<PhaseStatus> {
    let mut statuses: Vec<PhaseStatus> = phases.iter().map(|p| phase_status(p, matches)).collect();
    statuses.sort_by_key(|s| s.order);

    let mut later_has_matches = false;
    for status in statuses.iter_mut().rev() {
        if status.total_matches > 0 {
            later_has_matches = true;
        } else if later_has_matches {
            status.status = PhaseState::Completed;
            status.skipped = true;
        }
    }
    statuses
}

/// Lowest-order phase not yet completed. None once the season is finished.
pub fn current_phase(statuses: &[PhaseStatus]) -> Option<&PhaseStatus> {
    statuses
        .iter()
        .filter(|s| s.status != PhaseState::Completed)
        .min_by_key(|s| s.order)
}

/// Check that `phase_id` may receive a generated schedule: it must be pending and
/// every earlier phase completed.
pub fn ensure_can_schedule<'a>(
    phases: &'a [PhaseConfig],
    matches: &[Match],
    phase_id: &str,
) -> Result<&'a PhaseConfig, ScheduleError> {
    check_schedulable(phases, &season_phase_statuses(phases, matches), phase_id)
}

/// `ensure_can_schedule` over statuses the caller already derived.
pub fn check_schedulable<'a>(
    phases: &'a [PhaseConfig],
    statuses: &[PhaseStatus],
    phase_id: &str,
) -> Result<&'a PhaseConfig, ScheduleError> {
    let phase = find_phase(phases, phase_id)?;
    let own = statuses
        .iter()
        .find(|s| s.phase_id == phase.id)
        .ok_or_else(|| ScheduleError::UnknownPhase(phase.id.clone()))?;
    match own.status {
        PhaseState::Pending => {}
        PhaseState::Completed => return Err(ScheduleError::PhaseClosed(phase.id.clone())),
        PhaseState::Scheduled | PhaseState::InProgress => {
            return Err(ScheduleError::PhaseAlreadyScheduled(phase.id.clone()))
        }
    }
    let earlier_open = statuses
        .iter()
        .any(|s| s.order < phase.order && s.status != PhaseState::Completed);
    if earlier_open {
        return Err(ScheduleError::PhaseNotCurrent(phase.id.clone()));
    }
    Ok(phase)
}

pub fn find_phase<'a>(phases: &'a [PhaseConfig], phase_id: &str) -> Result<&'a PhaseConfig, ScheduleError> {
    phases
        .iter()
        .find(|p| p.id == phase_id)
        .ok_or_else(|| ScheduleError::UnknownPhase(phase_id.to_string()))
}

/// Administrative close: force-complete every unfinished match of the phase as a
/// forfeit. Forfeits keep their recorded score and are flagged so standings skip them.
/// Returns how many matches were forced.
///
/// Irreversible through the state machine. A phase without matches has nothing to close.
pub fn close_phase(phase_id: &PhaseId, matches: &mut [Match]) -> Result<usize, ScheduleError> {
    let mut stage = matches.iter_mut().filter(|m| &m.stage_id == phase_id).peekable();
    if stage.peek().is_none() {
        return Ok(0);
    }
    let mut forced = 0;
    let mut total = 0;
    for m in stage {
        total += 1;
        if m.status != MatchStatus::Completed {
            m.status = MatchStatus::Completed;
            m.forfeited = true;
            forced += 1;
        }
    }
    if forced == 0 {
        return Err(ScheduleError::PhaseClosed(phase_id.clone()));
    }
    log::info!("closed phase {}: {} of {} matches forfeited", phase_id, forced, total);
    Ok(forced)
}

/// Teams a completed phase sends to `rules.destination_phase`.
///
/// With groups, `count` teams are taken from each group (or only `source_group`) and
/// interleaved by position: A1, B1, A2, B2, ... so a seeded knockout crosses groups.
/// Without groups, `count` teams are taken from the whole table.
pub fn select_advancing_teams(
    rules: &AdvancementRules,
    table: &[StandingsRow],
    groups: &[(String, Vec<StandingsRow>)],
) -> Vec<TeamId> {
    if groups.is_empty() {
        return take_from(table, rules.count, rules.source);
    }
    let picked: Vec<Vec<TeamId>> = groups
        .iter()
        .filter(|(name, _)| rules.source_group.as_ref().map_or(true, |g| g == name))
        .map(|(_, rows)| take_from(rows, rules.count, rules.source))
        .collect();

    let longest = picked.iter().map(Vec::len).max().unwrap_or(0);
    (0..longest)
        .flat_map(|pos| picked.iter().filter_map(move |g| g.get(pos).copied()))
        .collect()
}

fn take_from(rows: &[StandingsRow], count: usize, source: AdvancementSource) -> Vec<TeamId> {
    let count = count.min(rows.len());
    match source {
        AdvancementSource::Top => rows[..count].iter().map(|r| r.team_id).collect(),
        AdvancementSource::Bottom => rows[rows.len() - count..].iter().map(|r| r.team_id).collect(),
    }
}
