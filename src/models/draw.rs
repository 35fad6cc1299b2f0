//! Pairing settings and draw results: groups, knockout brackets, swiss poules.

use crate::models::game::Pairing;
use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};

/// How knockout round 1 is placed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingMethod {
    /// 1 vs n, 2 vs n-1, ... by the order teams are supplied in.
    #[default]
    Seeded,
    Random,
    /// Caller-supplied placement (`PairingSettings::manual_placement`).
    Manual,
}

/// How teams are split into groups.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingRule {
    /// Seed order dealt A, B, C, C, B, A, ...
    #[default]
    SeededSnake,
    Random,
}

/// Swiss poules as lists of 1-based table ranks, e.g. `[[1, 4, 5, 8], [2, 3, 6, 7]]`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeedingPattern {
    pub poules: Vec<Vec<usize>>,
}

impl SeedingPattern {
    /// Snake pattern over `teams` ranks into `poules` poules.
    pub fn snake(teams: usize, poules: usize) -> Self {
        let poules = poules.max(1);
        let mut out = vec![Vec::new(); poules];
        for rank in 1..=teams {
            out[snake_index(rank - 1, poules)].push(rank);
        }
        Self { poules: out }
    }
}

/// Group index for the `position`-th team in a snake deal over `groups` groups.
pub(crate) fn snake_index(position: usize, groups: usize) -> usize {
    let lap = position / groups;
    let offset = position % groups;
    if lap % 2 == 0 {
        offset
    } else {
        groups - 1 - offset
    }
}

/// A named group of teams ("A", "B", ...).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub teams: Vec<TeamId>,
}

/// One position pair in knockout round 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSlot {
    Match(Pairing),
    /// Team advances without playing.
    Bye(TeamId),
}

/// Round 1 of a single-elimination bracket, in bracket order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct KnockoutDraw {
    pub bracket_size: usize,
    pub slots: Vec<BracketSlot>,
    pub third_place_match: bool,
}

impl KnockoutDraw {
    pub fn pairings(&self) -> Vec<Pairing> {
        self.slots
            .iter()
            .filter_map(|s| match s {
                BracketSlot::Match(p) => Some(*p),
                BracketSlot::Bye(_) => None,
            })
            .collect()
    }

    pub fn byes(&self) -> Vec<TeamId> {
        self.slots
            .iter()
            .filter_map(|s| match s {
                BracketSlot::Bye(t) => Some(*t),
                BracketSlot::Match(_) => None,
            })
            .collect()
    }

    /// Number of rounds until the final.
    pub fn rounds(&self) -> u32 {
        self.bracket_size.trailing_zeros()
    }
}

/// Where a knockout bracket stands, derived from its round-1 draw and the results so far.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BracketState {
    /// `round` has matches that are not completed yet.
    RoundInProgress { round: u32 },
    /// Every persisted round is decided; `pairings` make up `round`.
    /// The final round also carries the third-place match when one is configured.
    NextRound { round: u32, pairings: Vec<Pairing> },
    /// The final has a winner.
    Resolved { champion: TeamId },
}

/// Everything the pairing generators may need for one phase call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingSettings {
    pub include_return_games: bool,
    /// Swiss round being generated (1-based); even rounds swap home/away.
    pub round: u32,
    pub seeding_pattern: Option<SeedingPattern>,
    /// Used when no explicit pattern is supplied.
    pub swiss_poules: Option<usize>,
    pub bracket_size: Option<usize>,
    pub seeding_method: SeedingMethod,
    /// Bracket positions for `SeedingMethod::Manual`; None marks a bye.
    pub manual_placement: Option<Vec<Option<TeamId>>>,
    pub third_place_match: bool,
    pub group_count: Option<usize>,
    pub grouping_rule: GroupingRule,
}

/// Result of generating pairings for one phase.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PhaseDraw {
    pub pairings: Vec<Pairing>,
    pub groups: Vec<Group>,
    pub byes: Vec<TeamId>,
    /// Round-1 bracket of a knockout phase.
    pub bracket: Option<KnockoutDraw>,
}
