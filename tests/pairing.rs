//! Integration tests for pairing generation: round robin, swiss, knockout, groups.

use league_scheduler::logic::{
    generate_phase_pairings, group_assignment, knockout, knockout_winner, next_knockout_round,
    round_robin, round_robin_rounds, swiss_pairing, third_place_pairing,
};
use league_scheduler::models::{
    BracketSlot, GroupingRule, Match, MatchGenerationType, Pairing, PairingSettings,
    ScheduleError, SeedingMethod, SeedingPattern, TeamId,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use uuid::Uuid;

fn teams(n: u128) -> Vec<TeamId> {
    (1..=n).map(Uuid::from_u128).collect()
}

fn unordered(pairings: &[Pairing]) -> HashSet<(TeamId, TeamId)> {
    pairings.iter().map(Pairing::unordered_key).collect()
}

#[test]
fn round_robin_even_count_meets_everyone_once() {
    let t = teams(4);
    let rounds = round_robin_rounds(&t, false).unwrap();
    assert_eq!(rounds.len(), 3);
    for round in &rounds {
        assert_eq!(round.len(), 2);
        let playing: HashSet<TeamId> = round.iter().flat_map(|p| [p.home, p.away]).collect();
        assert_eq!(playing.len(), 4);
    }
    let all: Vec<Pairing> = rounds.into_iter().flatten().collect();
    assert_eq!(all.len(), 6);
    assert_eq!(unordered(&all).len(), 6);
}

#[test]
fn round_robin_odd_count_gives_each_team_one_bye() {
    let t = teams(5);
    let rounds = round_robin_rounds(&t, false).unwrap();
    assert_eq!(rounds.len(), 5);
    assert!(rounds.iter().all(|r| r.len() == 2));
    for &team in &t {
        let idle = rounds.iter().filter(|r| !r.iter().any(|p| p.involves(team))).count();
        assert_eq!(idle, 1);
    }
    let all: Vec<Pairing> = rounds.into_iter().flatten().collect();
    assert_eq!(all.len(), 10);
    assert_eq!(unordered(&all).len(), 10);
}

#[test]
fn return_games_mirror_the_first_cycle() {
    let t = teams(4);
    let single = round_robin(&t, false).unwrap();
    let double = round_robin(&t, true).unwrap();
    assert_eq!(double.len(), 12);
    assert_eq!(&double[..6], &single[..]);
    for (first, second) in double[..6].iter().zip(&double[6..]) {
        assert_eq!(*second, first.mirrored());
    }
    let ordered: HashSet<Pairing> = double.iter().copied().collect();
    assert_eq!(ordered.len(), 12);
}

#[test]
fn fixed_team_alternates_home_and_away() {
    let t = teams(4);
    let rounds = round_robin_rounds(&t, false).unwrap();
    let home: Vec<bool> = rounds
        .iter()
        .map(|r| r.iter().any(|p| p.home == t[0]))
        .collect();
    assert_eq!(home, vec![true, false, true]);
}

#[test]
fn too_few_or_duplicate_teams_fail() {
    let t = teams(1);
    assert_eq!(round_robin(&t, false), Err(ScheduleError::InsufficientTeams { found: 1 }));
    assert_eq!(round_robin(&[], false), Err(ScheduleError::InsufficientTeams { found: 0 }));
    let dup = vec![t[0], t[0], Uuid::from_u128(9)];
    assert_eq!(round_robin(&dup, false), Err(ScheduleError::DuplicateTeam(t[0])));
}

#[test]
fn snake_pattern_deals_ranks_back_and_forth() {
    let pattern = SeedingPattern::snake(8, 2);
    assert_eq!(pattern.poules, vec![vec![1, 4, 5, 8], vec![2, 3, 6, 7]]);
}

#[test]
fn swiss_round_pairs_only_inside_poules() {
    let ranking = teams(8);
    let pattern = SeedingPattern::snake(8, 2);
    let pairings = swiss_pairing(&ranking, 1, &pattern).unwrap();
    assert_eq!(pairings.len(), 12);

    let poule_a: HashSet<TeamId> = [1usize, 4, 5, 8].iter().map(|&r| ranking[r - 1]).collect();
    for p in &pairings {
        assert_eq!(poule_a.contains(&p.home), poule_a.contains(&p.away));
    }
}

#[test]
fn swiss_even_round_swaps_home_and_away() {
    let ranking = teams(8);
    let pattern = SeedingPattern::snake(8, 2);
    let odd = swiss_pairing(&ranking, 1, &pattern).unwrap();
    let even = swiss_pairing(&ranking, 2, &pattern).unwrap();
    let mirrored: Vec<Pairing> = odd.iter().map(|p| p.mirrored()).collect();
    assert_eq!(even, mirrored);
}

#[test]
fn swiss_follows_the_current_ranking() {
    let ranking = teams(4);
    let pattern = SeedingPattern {
        poules: vec![vec![1, 2], vec![3, 4]],
    };
    let before = swiss_pairing(&ranking, 1, &pattern).unwrap();
    let reseeded = vec![ranking[3], ranking[0], ranking[2], ranking[1]];
    let after = swiss_pairing(&reseeded, 1, &pattern).unwrap();
    let expected_before = [
        Pairing::new(ranking[0], ranking[1]),
        Pairing::new(ranking[2], ranking[3]),
    ];
    let expected_after = [
        Pairing::new(ranking[3], ranking[0]),
        Pairing::new(ranking[2], ranking[1]),
    ];
    assert_eq!(unordered(&before), unordered(&expected_before));
    assert_eq!(unordered(&after), unordered(&expected_after));
}

#[test]
fn swiss_pattern_ranks_must_be_unique() {
    let pattern = SeedingPattern {
        poules: vec![vec![1, 2], vec![2, 3]],
    };
    assert!(matches!(
        swiss_pairing(&teams(4), 1, &pattern),
        Err(ScheduleError::InvalidConstraint(_))
    ));
}

#[test]
fn seeded_knockout_places_one_against_eight() {
    let t = teams(8);
    let mut rng = StdRng::seed_from_u64(1);
    let draw = knockout(&t, &PairingSettings::default(), &mut rng).unwrap();
    assert_eq!(draw.bracket_size, 8);
    assert_eq!(draw.rounds(), 3);
    let expected: [(usize, usize); 4] = [(1, 8), (4, 5), (2, 7), (3, 6)];
    let pairings = draw.pairings();
    assert_eq!(pairings.len(), 4);
    for (p, (h, a)) in pairings.iter().zip(expected) {
        assert_eq!(*p, Pairing::new(t[h - 1], t[a - 1]));
    }
    assert!(draw.byes().is_empty());
}

#[test]
fn knockout_rounds_up_and_gives_top_seeds_byes() {
    let t = teams(6);
    let mut rng = StdRng::seed_from_u64(1);
    let draw = knockout(&t, &PairingSettings::default(), &mut rng).unwrap();
    assert_eq!(draw.bracket_size, 8);
    assert_eq!(
        draw.slots,
        vec![
            BracketSlot::Bye(t[0]),
            BracketSlot::Match(Pairing::new(t[3], t[4])),
            BracketSlot::Bye(t[1]),
            BracketSlot::Match(Pairing::new(t[2], t[5])),
        ]
    );
    assert_eq!(draw.byes(), vec![t[0], t[1]]);
}

#[test]
fn knockout_rejects_unsupported_sizes() {
    let mut rng = StdRng::seed_from_u64(1);
    let settings = PairingSettings {
        bracket_size: Some(6),
        ..PairingSettings::default()
    };
    assert_eq!(
        knockout(&teams(6), &settings, &mut rng),
        Err(ScheduleError::InvalidBracketSize { size: 6 })
    );
    assert_eq!(
        knockout(&teams(40), &PairingSettings::default(), &mut rng),
        Err(ScheduleError::InvalidBracketSize { size: 40 })
    );
}

#[test]
fn random_knockout_is_reproducible_for_a_seed() {
    let t = teams(8);
    let settings = PairingSettings {
        seeding_method: SeedingMethod::Random,
        ..PairingSettings::default()
    };
    let a = knockout(&t, &settings, &mut StdRng::seed_from_u64(42)).unwrap();
    let b = knockout(&t, &settings, &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(a, b);
    let placed: HashSet<TeamId> = a.pairings().iter().flat_map(|p| [p.home, p.away]).collect();
    assert_eq!(placed.len(), 8);
}

#[test]
fn manual_placement_must_fill_every_team_once() {
    let t = teams(4);
    let mut rng = StdRng::seed_from_u64(1);
    let mut settings = PairingSettings {
        seeding_method: SeedingMethod::Manual,
        manual_placement: Some(vec![Some(t[0]), Some(t[1]), Some(t[2]), None]),
        ..PairingSettings::default()
    };
    assert!(matches!(
        knockout(&t, &settings, &mut rng),
        Err(ScheduleError::InvalidPlacement(_))
    ));

    settings.manual_placement = Some(vec![Some(t[0]), Some(t[2]), Some(t[1]), Some(t[3])]);
    let draw = knockout(&t, &settings, &mut rng).unwrap();
    assert_eq!(
        draw.pairings(),
        vec![Pairing::new(t[0], t[2]), Pairing::new(t[1], t[3])]
    );
}

#[test]
fn bracket_advance_helpers() {
    let t = teams(4);
    let semi_1 = Match::new(Uuid::nil(), Uuid::nil(), "knockout", t[0], t[3])
        .unwrap()
        .completed_with(2, 1);
    let semi_2 = Match::new(Uuid::nil(), Uuid::nil(), "knockout", t[1], t[2])
        .unwrap()
        .completed_with(0, 3);

    assert_eq!(knockout_winner(&semi_1), Ok(t[0]));
    assert_eq!(knockout_winner(&semi_2), Ok(t[2]));
    assert_eq!(
        next_knockout_round(&[t[0], t[2]]),
        Ok(vec![Pairing::new(t[0], t[2])])
    );
    assert_eq!(
        third_place_pairing(&[semi_1, semi_2]),
        Ok(Some(Pairing::new(t[3], t[1])))
    );

    let drawn = Match::new(Uuid::nil(), Uuid::nil(), "knockout", t[0], t[1])
        .unwrap()
        .completed_with(1, 1);
    assert_eq!(
        knockout_winner(&drawn),
        Err(ScheduleError::UnresolvedKnockoutMatch(drawn.id))
    );
}

#[test]
fn snake_group_assignment() {
    let t = teams(8);
    let mut rng = StdRng::seed_from_u64(1);
    let groups = group_assignment(&t, 2, GroupingRule::SeededSnake, &mut rng).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "A");
    assert_eq!(groups[0].teams, vec![t[0], t[3], t[4], t[7]]);
    assert_eq!(groups[1].name, "B");
    assert_eq!(groups[1].teams, vec![t[1], t[2], t[5], t[6]]);
}

#[test]
fn group_assignment_needs_two_teams_per_group() {
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(
        group_assignment(&teams(3), 2, GroupingRule::SeededSnake, &mut rng),
        Err(ScheduleError::InsufficientTeams { found: 3 })
    );
}

#[test]
fn group_phase_round_robins_each_group() {
    let t = teams(8);
    let settings = PairingSettings {
        group_count: Some(2),
        ..PairingSettings::default()
    };
    let mut rng = StdRng::seed_from_u64(3);
    let draw =
        generate_phase_pairings(MatchGenerationType::GroupAssignment, &t, &settings, &mut rng).unwrap();
    assert_eq!(draw.groups.len(), 2);
    assert_eq!(draw.pairings.len(), 12);
    for p in &draw.pairings {
        let same_group = draw
            .groups
            .iter()
            .any(|g| g.teams.contains(&p.home) && g.teams.contains(&p.away));
        assert!(same_group);
    }
}
