//! Pairing generation: round robin, swiss poules, knockout brackets and group draws.

use crate::models::{
    BracketSlot, BracketState, Group, GroupingRule, KnockoutDraw, Match, MatchGenerationType, Pairing,
    PairingSettings, PhaseDraw, ScheduleError, SeedingMethod, SeedingPattern, TeamId,
};
use crate::models::snake_index;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Bracket sizes a knockout can be drawn into. 2 is a stand-alone final.
pub const SUPPORTED_BRACKET_SIZES: [usize; 5] = [2, 4, 8, 16, 32];

/// Round robin by the circle method, one `Vec` per round.
///
/// 1. Pad with a bye when the team count is odd.
/// 2. Fix the first team, rotate the rest one step per round.
/// 3. Pairings against the bye are dropped.
/// 4. With return games, the mirrored rounds follow the first cycle.
pub fn round_robin_rounds(
    teams: &[TeamId],
    include_return_games: bool,
) -> Result<Vec<Vec<Pairing>>, ScheduleError> {
    validate_teams(teams)?;

    let mut circle: Vec<Option<TeamId>> = teams.iter().copied().map(Some).collect();
    if circle.len() % 2 == 1 {
        circle.push(None);
    }
    let n = circle.len();

    let mut rounds: Vec<Vec<Pairing>> = Vec::with_capacity(n - 1);
    for round in 0..n - 1 {
        let mut pairings = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            let (a, b) = (circle[i], circle[n - 1 - i]);
            if let (Some(a), Some(b)) = (a, b) {
                // Fixed team alternates home and away.
                let p = if i == 0 && round % 2 == 1 {
                    Pairing::new(b, a)
                } else {
                    Pairing::new(a, b)
                };
                pairings.push(p);
            }
        }
        rounds.push(pairings);
        circle[1..].rotate_right(1);
    }

    if include_return_games {
        let mirrored: Vec<Vec<Pairing>> = rounds
            .iter()
            .map(|r| r.iter().map(|p| p.mirrored()).collect())
            .collect();
        rounds.extend(mirrored);
    }
    Ok(rounds)
}

/// All round robin pairings in round order.
pub fn round_robin(
    teams: &[TeamId],
    include_return_games: bool,
) -> Result<Vec<Pairing>, ScheduleError> {
    Ok(round_robin_rounds(teams, include_return_games)?
        .into_iter()
        .flatten()
        .collect())
}

/// Swiss round: split the current table into poules by `pattern`, round robin inside each.
///
/// `ranking` is the table best-first and must be recomputed before every round.
/// Ranks beyond the table are ignored; a poule left with one team gets no match.
/// Even rounds swap home and away.
pub fn swiss_pairing(
    ranking: &[TeamId],
    round: u32,
    pattern: &SeedingPattern,
) -> Result<Vec<Pairing>, ScheduleError> {
    validate_teams(ranking)?;

    let mut seen_ranks = HashSet::new();
    for &rank in pattern.poules.iter().flatten() {
        if rank == 0 {
            return Err(ScheduleError::InvalidConstraint(
                "seeding pattern ranks start at 1".to_string(),
            ));
        }
        if !seen_ranks.insert(rank) {
            return Err(ScheduleError::InvalidConstraint(format!(
                "rank {} appears in more than one poule",
                rank
            )));
        }
    }

    let mut pairings = Vec::new();
    for poule in &pattern.poules {
        let members: Vec<TeamId> = poule
            .iter()
            .filter_map(|&rank| ranking.get(rank - 1).copied())
            .collect();
        if members.len() < 2 {
            continue;
        }
        let poule_pairings = round_robin(&members, false)?;
        if round % 2 == 0 {
            pairings.extend(poule_pairings.into_iter().map(Pairing::mirrored));
        } else {
            pairings.extend(poule_pairings);
        }
    }
    Ok(pairings)
}

/// Draw round 1 of a single-elimination bracket.
///
/// Teams are in seed order. The bracket is the smallest supported size that fits,
/// unless `settings.bracket_size` asks for a specific one. Top seeds receive the byes.
pub fn knockout<R: Rng + ?Sized>(
    teams: &[TeamId],
    settings: &PairingSettings,
    rng: &mut R,
) -> Result<KnockoutDraw, ScheduleError> {
    validate_teams(teams)?;
    let size = bracket_size_for(teams.len(), settings.bracket_size)?;

    let positions: Vec<Option<TeamId>> = match settings.seeding_method {
        SeedingMethod::Seeded => seeded_positions(teams, size),
        SeedingMethod::Random => {
            let mut drawn = teams.to_vec();
            drawn.shuffle(rng);
            seeded_positions(&drawn, size)
        }
        SeedingMethod::Manual => {
            let placement = settings.manual_placement.as_deref().ok_or_else(|| {
                ScheduleError::InvalidPlacement("manual seeding needs a placement".to_string())
            })?;
            validate_placement(teams, placement, size)?;
            placement.to_vec()
        }
    };

    let mut slots = Vec::with_capacity(size / 2);
    for pair in positions.chunks_exact(2) {
        let slot = match (pair[0], pair[1]) {
            (Some(a), Some(b)) => BracketSlot::Match(Pairing::new(a, b)),
            (Some(t), None) | (None, Some(t)) => BracketSlot::Bye(t),
            (None, None) => {
                return Err(ScheduleError::InvalidPlacement(
                    "two byes meet in round 1".to_string(),
                ))
            }
        };
        slots.push(slot);
    }

    Ok(KnockoutDraw {
        bracket_size: size,
        slots,
        third_place_match: settings.third_place_match,
    })
}

fn bracket_size_for(teams: usize, requested: Option<usize>) -> Result<usize, ScheduleError> {
    match requested {
        Some(size) => {
            // Every round-1 position pair must hold at least one team.
            if !SUPPORTED_BRACKET_SIZES.contains(&size) || size < teams || size >= teams * 2 {
                return Err(ScheduleError::InvalidBracketSize { size });
            }
            Ok(size)
        }
        None => SUPPORTED_BRACKET_SIZES
            .iter()
            .copied()
            .find(|&s| s >= teams)
            .ok_or(ScheduleError::InvalidBracketSize { size: teams }),
    }
}

/// Seed numbers in bracket order so 1 and 2 can only meet in the final: 8 -> [1,8,4,5,2,7,3,6].
fn bracket_seed_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let total = order.len() * 2 + 1;
        order = order.iter().flat_map(|&s| [s, total - s]).collect();
    }
    order
}

fn seeded_positions(teams: &[TeamId], size: usize) -> Vec<Option<TeamId>> {
    bracket_seed_order(size)
        .into_iter()
        .map(|seed| teams.get(seed - 1).copied())
        .collect()
}

fn validate_placement(
    teams: &[TeamId],
    placement: &[Option<TeamId>],
    size: usize,
) -> Result<(), ScheduleError> {
    if placement.len() != size {
        return Err(ScheduleError::InvalidPlacement(format!(
            "expected {} positions, got {}",
            size,
            placement.len()
        )));
    }
    let expected: HashSet<TeamId> = teams.iter().copied().collect();
    let mut placed = HashSet::new();
    for team in placement.iter().flatten() {
        if !expected.contains(team) {
            return Err(ScheduleError::TeamNotFound(*team));
        }
        if !placed.insert(*team) {
            return Err(ScheduleError::DuplicateTeam(*team));
        }
    }
    if placed.len() != expected.len() {
        return Err(ScheduleError::InvalidPlacement(format!(
            "{} of {} teams placed",
            placed.len(),
            expected.len()
        )));
    }
    Ok(())
}

/// Winner of a completed knockout match.
pub fn knockout_winner(m: &Match) -> Result<TeamId, ScheduleError> {
    if !m.is_played() || m.home_score == m.away_score {
        return Err(ScheduleError::UnresolvedKnockoutMatch(m.id));
    }
    Ok(if m.home_score > m.away_score {
        m.home_team_id
    } else {
        m.away_team_id
    })
}

/// Winners of one bracket round in bracket order. Byes advance without a match.
pub fn bracket_winners(slots: &[BracketSlot], results: &[Match]) -> Result<Vec<TeamId>, ScheduleError> {
    slots
        .iter()
        .map(|slot| match slot {
            BracketSlot::Bye(team) => Ok(*team),
            BracketSlot::Match(p) => {
                let key = p.unordered_key();
                let played = results
                    .iter()
                    .find(|m| m.pairing().unordered_key() == key)
                    .ok_or_else(|| {
                        ScheduleError::InvalidPlacement("no result for a bracket pairing".to_string())
                    })?;
                knockout_winner(played)
            }
        })
        .collect()
}

/// Next round from the previous round's winners, paired neighbour with neighbour.
pub fn next_knockout_round(winners: &[TeamId]) -> Result<Vec<Pairing>, ScheduleError> {
    if winners.len() < 2 {
        return Err(ScheduleError::InsufficientTeams {
            found: winners.len(),
        });
    }
    if winners.len() % 2 == 1 {
        return Err(ScheduleError::InvalidBracketSize {
            size: winners.len(),
        });
    }
    Ok(winners
        .chunks_exact(2)
        .map(|pair| Pairing::new(pair[0], pair[1]))
        .collect())
}

/// Third-place match between the two semi-final losers; None unless exactly two semis.
pub fn third_place_pairing(semi_finals: &[Match]) -> Result<Option<Pairing>, ScheduleError> {
    if semi_finals.len() != 2 {
        return Ok(None);
    }
    let mut losers = Vec::with_capacity(2);
    for m in semi_finals {
        let winner = knockout_winner(m)?;
        losers.push(if winner == m.home_team_id {
            m.away_team_id
        } else {
            m.home_team_id
        });
    }
    Ok(Some(Pairing::new(losers[0], losers[1])))
}

/// Replay a bracket from its round-1 draw and the phase's matches (each tagged with its
/// round) to find the round being played, the next round to schedule, or the champion.
///
/// A completed but drawn match stops the replay with `UnresolvedKnockoutMatch`.
pub fn bracket_state(draw: &KnockoutDraw, matches: &[Match]) -> Result<BracketState, ScheduleError> {
    let mut slots = draw.slots.clone();
    let mut previous: Vec<Match> = Vec::new();
    let mut round = 1;
    loop {
        let played: Vec<Match> = matches.iter().filter(|m| m.round == round).cloned().collect();
        if played.is_empty() {
            let mut pairings: Vec<Pairing> = slots
                .iter()
                .filter_map(|s| match s {
                    BracketSlot::Match(p) => Some(*p),
                    BracketSlot::Bye(_) => None,
                })
                .collect();
            if draw.third_place_match && pairings.len() == 1 {
                pairings.extend(third_place_pairing(&previous)?);
            }
            return Ok(BracketState::NextRound { round, pairings });
        }
        if played.iter().any(|m| !m.is_completed()) {
            return Ok(BracketState::RoundInProgress { round });
        }

        let winners = bracket_winners(&slots, &played)?;
        if let &[champion] = winners.as_slice() {
            return Ok(BracketState::Resolved { champion });
        }
        slots = next_knockout_round(&winners)?
            .into_iter()
            .map(BracketSlot::Match)
            .collect();
        previous = played;
        round += 1;
    }
}

/// Split teams (in seed order) into `group_count` groups. Emits no matches.
pub fn group_assignment<R: Rng + ?Sized>(
    teams: &[TeamId],
    group_count: usize,
    rule: GroupingRule,
    rng: &mut R,
) -> Result<Vec<Group>, ScheduleError> {
    validate_teams(teams)?;
    if group_count == 0 {
        return Err(ScheduleError::InvalidConstraint(
            "group count must be at least 1".to_string(),
        ));
    }
    if teams.len() < group_count * 2 {
        return Err(ScheduleError::InsufficientTeams { found: teams.len() });
    }

    let mut groups: Vec<Group> = (0..group_count)
        .map(|i| Group {
            name: group_name(i),
            teams: Vec::new(),
        })
        .collect();

    match rule {
        GroupingRule::SeededSnake => {
            for (pos, &team) in teams.iter().enumerate() {
                groups[snake_index(pos, group_count)].teams.push(team);
            }
        }
        GroupingRule::Random => {
            let mut drawn = teams.to_vec();
            drawn.shuffle(rng);
            for (pos, team) in drawn.into_iter().enumerate() {
                groups[pos % group_count].teams.push(team);
            }
        }
    }
    Ok(groups)
}

fn group_name(index: usize) -> String {
    if index < 26 {
        char::from(b'A' + index as u8).to_string()
    } else {
        format!("G{}", index + 1)
    }
}

/// Pairings for one phase, dispatched on its generation type. `teams` is in seed order
/// (current table order for swiss rounds and seeded knockouts).
pub fn generate_phase_pairings<R: Rng + ?Sized>(
    generation: MatchGenerationType,
    teams: &[TeamId],
    settings: &PairingSettings,
    rng: &mut R,
) -> Result<PhaseDraw, ScheduleError> {
    match generation {
        MatchGenerationType::RoundRobin => Ok(PhaseDraw {
            pairings: round_robin(teams, settings.include_return_games)?,
            ..PhaseDraw::default()
        }),
        MatchGenerationType::SwissPairing => {
            let pattern = settings.seeding_pattern.clone().unwrap_or_else(|| {
                SeedingPattern::snake(teams.len(), settings.swiss_poules.unwrap_or(1))
            });
            Ok(PhaseDraw {
                pairings: swiss_pairing(teams, settings.round.max(1), &pattern)?,
                ..PhaseDraw::default()
            })
        }
        MatchGenerationType::Knockout => {
            let draw = knockout(teams, settings, rng)?;
            Ok(PhaseDraw {
                pairings: draw.pairings(),
                byes: draw.byes(),
                groups: Vec::new(),
                bracket: Some(draw),
            })
        }
        MatchGenerationType::GroupAssignment => {
            let groups = group_assignment(
                teams,
                settings.group_count.unwrap_or(1),
                settings.grouping_rule,
                rng,
            )?;
            let mut pairings = Vec::new();
            for g in &groups {
                pairings.extend(round_robin(&g.teams, settings.include_return_games)?);
            }
            Ok(PhaseDraw {
                pairings,
                groups,
                byes: Vec::new(),
                bracket: None,
            })
        }
    }
}

fn validate_teams(teams: &[TeamId]) -> Result<(), ScheduleError> {
    if teams.len() < 2 {
        return Err(ScheduleError::InsufficientTeams { found: teams.len() });
    }
    let mut seen = HashSet::with_capacity(teams.len());
    for &t in teams {
        if !seen.insert(t) {
            return Err(ScheduleError::DuplicateTeam(t));
        }
    }
    Ok(())
}
