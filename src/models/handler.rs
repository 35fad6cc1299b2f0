//! Tournament formats: each maps to a fixed, ordered phase list and default settings.

use crate::models::draw::{GroupingRule, PairingSettings, SeedingMethod};
use crate::models::error::ScheduleError;
use crate::models::phase::{MatchGenerationType, PhaseConfig};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Overall competition format of a season.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentHandler {
    #[default]
    LeagueOnly,
    Knockout,
    GroupsKnockout,
    SwissSystem,
    RoundRobinFinal,
}

/// Default pairing settings of a format; a request may override any of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandlerSettings {
    pub include_return_games: bool,
    pub group_count: Option<usize>,
    pub grouping_rule: GroupingRule,
    pub bracket_size: Option<usize>,
    pub seeding_method: SeedingMethod,
    pub third_place_match: bool,
    pub swiss_poules: Option<usize>,
}

impl HandlerSettings {
    /// Starting point for a phase's `PairingSettings`.
    pub fn pairing_settings(&self) -> PairingSettings {
        PairingSettings {
            include_return_games: self.include_return_games,
            bracket_size: self.bracket_size,
            seeding_method: self.seeding_method,
            third_place_match: self.third_place_match,
            group_count: self.group_count,
            grouping_rule: self.grouping_rule,
            swiss_poules: self.swiss_poules,
            ..PairingSettings::default()
        }
    }
}

impl TournamentHandler {
    pub const ALL: [TournamentHandler; 5] = [
        TournamentHandler::LeagueOnly,
        TournamentHandler::Knockout,
        TournamentHandler::GroupsKnockout,
        TournamentHandler::SwissSystem,
        TournamentHandler::RoundRobinFinal,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TournamentHandler::LeagueOnly => "league_only",
            TournamentHandler::Knockout => "knockout",
            TournamentHandler::GroupsKnockout => "groups_knockout",
            TournamentHandler::SwissSystem => "swiss_system",
            TournamentHandler::RoundRobinFinal => "round_robin_final",
        }
    }

    /// Ordered phases of this format.
    pub fn phases(self) -> Vec<PhaseConfig> {
        use MatchGenerationType::*;
        match self {
            TournamentHandler::LeagueOnly => vec![
                PhaseConfig::new("regular_season", "Regular season", 1, RoundRobin).terminal(),
            ],
            TournamentHandler::Knockout => {
                vec![PhaseConfig::new("knockout", "Knockout", 1, Knockout).terminal()]
            }
            TournamentHandler::GroupsKnockout => vec![
                PhaseConfig::new("group_stage", "Group stage", 1, GroupAssignment)
                    .advancing(2, "knockout"),
                PhaseConfig::new("knockout", "Knockout", 2, Knockout).terminal(),
            ],
            TournamentHandler::SwissSystem => vec![
                PhaseConfig::new("swiss_round_1", "Swiss round 1", 1, SwissPairing),
                PhaseConfig::new("swiss_round_2", "Swiss round 2", 2, SwissPairing),
                PhaseConfig::new("swiss_round_3", "Swiss round 3", 3, SwissPairing).terminal(),
            ],
            TournamentHandler::RoundRobinFinal => vec![
                PhaseConfig::new("regular_season", "Regular season", 1, RoundRobin)
                    .advancing(2, "final"),
                PhaseConfig::new("final", "Final", 2, Knockout).terminal(),
            ],
        }
    }

    pub fn default_settings(self) -> HandlerSettings {
        let base = HandlerSettings {
            include_return_games: false,
            group_count: None,
            grouping_rule: GroupingRule::SeededSnake,
            bracket_size: None,
            seeding_method: SeedingMethod::Seeded,
            third_place_match: false,
            swiss_poules: None,
        };
        match self {
            TournamentHandler::LeagueOnly => HandlerSettings {
                include_return_games: true,
                ..base
            },
            TournamentHandler::Knockout => HandlerSettings {
                third_place_match: true,
                ..base
            },
            TournamentHandler::GroupsKnockout => HandlerSettings {
                group_count: Some(2),
                ..base
            },
            TournamentHandler::SwissSystem => HandlerSettings {
                swiss_poules: Some(2),
                ..base
            },
            TournamentHandler::RoundRobinFinal => base,
        }
    }
}

impl FromStr for TournamentHandler {
    type Err = ScheduleError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let key = key.trim();
        TournamentHandler::ALL
            .into_iter()
            .find(|h| h.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| ScheduleError::UnknownHandler(key.to_string()))
    }
}

impl std::fmt::Display for TournamentHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
