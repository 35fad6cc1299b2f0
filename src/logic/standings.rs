//! Standings: aggregate completed matches into an ordered table.

use crate::models::{
    Group, Match, PointsConfig, StandingsConfig, StandingsRow, TeamId, TieBreaker,
};
use std::collections::{HashMap, HashSet};

/// Build the table from played matches, best team first.
///
/// 1. One pass over played matches (forfeits from a closed phase are left out) aggregates played, W/D/L, goals and points.
/// 2. Every roster team gets a row, even with no matches.
/// 3. Sort by points; teams level on points go through `config.tie_breakers` in order.
/// 4. Teams still level after the chain are ordered by team id (never arbitrary).
pub fn calculate_standings(
    roster: &[TeamId],
    matches: &[Match],
    config: &StandingsConfig,
) -> Vec<StandingsRow> {
    let completed: Vec<&Match> = matches.iter().filter(|m| m.is_played()).collect();
    let rows = aggregate(roster, &completed, &config.points);

    let mut table: Vec<StandingsRow> = rows.into_values().collect();
    table.sort_by(|a, b| b.points.cmp(&a.points).then(a.team_id.cmp(&b.team_id)));

    split_runs(table, |r| r.points)
        .into_iter()
        .flat_map(|block| break_ties(block, &config.tie_breakers, &completed, &config.points))
        .collect()
}

/// One table per group, counting only matches played between members of that group.
pub fn group_standings(
    groups: &[Group],
    matches: &[Match],
    config: &StandingsConfig,
) -> Vec<(String, Vec<StandingsRow>)> {
    groups
        .iter()
        .map(|g| {
            let members: HashSet<TeamId> = g.teams.iter().copied().collect();
            let in_group: Vec<Match> = matches
                .iter()
                .filter(|m| members.contains(&m.home_team_id) && members.contains(&m.away_team_id))
                .cloned()
                .collect();
            (g.name.clone(), calculate_standings(&g.teams, &in_group, config))
        })
        .collect()
}

fn aggregate(
    roster: &[TeamId],
    completed: &[&Match],
    points: &PointsConfig,
) -> HashMap<TeamId, StandingsRow> {
    let mut rows: HashMap<TeamId, StandingsRow> = roster
        .iter()
        .map(|&id| (id, StandingsRow::new(id)))
        .collect();
    for m in completed {
        rows.entry(m.home_team_id)
            .or_insert_with(|| StandingsRow::new(m.home_team_id))
            .record(m.home_score, m.away_score, m.home_penalty_points, points);
        rows.entry(m.away_team_id)
            .or_insert_with(|| StandingsRow::new(m.away_team_id))
            .record(m.away_score, m.home_score, m.away_penalty_points, points);
    }
    rows
}

/// Order one block of teams level on points by the remaining criteria.
/// `block` arrives sorted by team id.
fn break_ties(
    block: Vec<StandingsRow>,
    chain: &[TieBreaker],
    completed: &[&Match],
    points: &PointsConfig,
) -> Vec<StandingsRow> {
    if block.len() < 2 {
        return block;
    }
    let Some((criterion, rest)) = chain.split_first() else {
        return block;
    };

    let mut keyed = criterion_keys(*criterion, block, completed, points);
    // Higher key ranks first; team id keeps equal keys deterministic.
    keyed.sort_by(|(ka, a), (kb, b)| kb.cmp(ka).then(a.team_id.cmp(&b.team_id)));

    split_runs(keyed, |(k, _)| *k)
        .into_iter()
        .flat_map(|sub| {
            let rows: Vec<StandingsRow> = sub.into_iter().map(|(_, r)| r).collect();
            break_ties(rows, rest, completed, points)
        })
        .collect()
}

/// Sort key per row for one criterion; larger is better.
fn criterion_keys(
    criterion: TieBreaker,
    block: Vec<StandingsRow>,
    completed: &[&Match],
    points: &PointsConfig,
) -> Vec<((i64, i64), StandingsRow)> {
    match criterion {
        TieBreaker::HeadToHead => {
            let tied: Vec<TeamId> = block.iter().map(|r| r.team_id).collect();
            let mini = head_to_head_table(&tied, completed, points);
            block
                .into_iter()
                .map(|r| {
                    let key = mini
                        .get(&r.team_id)
                        .map(|m| (m.points as i64, m.goal_difference))
                        .unwrap_or((0, 0));
                    (key, r)
                })
                .collect()
        }
        TieBreaker::GoalDifference => block.into_iter().map(|r| ((r.goal_difference, 0), r)).collect(),
        TieBreaker::GoalsScored => block.into_iter().map(|r| ((r.goals_for as i64, 0), r)).collect(),
        TieBreaker::GoalsAgainst => block
            .into_iter()
            .map(|r| ((-(r.goals_against as i64), 0), r))
            .collect(),
        TieBreaker::Wins => block.into_iter().map(|r| ((r.wins as i64, 0), r)).collect(),
        TieBreaker::FairPlay => block
            .into_iter()
            .map(|r| ((-(r.penalty_points as i64), 0), r))
            .collect(),
    }
}

/// Mini-league among `tied`: only matches where both sides are in the set.
fn head_to_head_table(
    tied: &[TeamId],
    completed: &[&Match],
    points: &PointsConfig,
) -> HashMap<TeamId, StandingsRow> {
    let set: HashSet<TeamId> = tied.iter().copied().collect();
    let direct: Vec<&Match> = completed
        .iter()
        .copied()
        .filter(|m| set.contains(&m.home_team_id) && set.contains(&m.away_team_id))
        .collect();
    aggregate(tied, &direct, points)
}

/// Split a sorted list into runs of equal key.
fn split_runs<T, K: PartialEq>(items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<Vec<T>> {
    let mut runs: Vec<Vec<T>> = Vec::new();
    let mut current_key: Option<K> = None;
    for item in items {
        let k = key(&item);
        let same_run = current_key.as_ref() == Some(&k);
        match runs.last_mut() {
            Some(run) if same_run => run.push(item),
            _ => {
                current_key = Some(k);
                runs.push(vec![item]);
            }
        }
    }
    runs
}
