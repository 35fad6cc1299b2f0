//! Availability inputs and the discrete (datetime, venue) slots built from them.

use crate::models::phase::PhaseSchedulingConstraints;
use crate::models::team::{TeamId, VenueId};
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// Calendar window crossed with weekdays, kick-off times and venues.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DateRangeAvailability {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    /// Empty = every day.
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
    /// Kick-off times as "HH:MM".
    pub time_slots: Vec<String>,
    pub venue_ids: Vec<VenueId>,
}

impl DateRangeAvailability {
    /// Window using a phase's configured weekdays and kick-off times.
    pub fn from_phase_constraints(
        start_date: NaiveDate,
        end_date: NaiveDate,
        constraints: &PhaseSchedulingConstraints,
        venue_ids: Vec<VenueId>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            weekdays: constraints.allowed_weekdays.clone(),
            time_slots: constraints.time_slots.clone(),
            venue_ids,
        }
    }
}

/// One tournament day (or block) with its own venues and participating teams.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EventWindow {
    pub date: NaiveDate,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
    pub venue_ids: Vec<VenueId>,
    /// Teams allowed to play at this event. Empty = every team.
    #[serde(default)]
    pub team_ids: Vec<TeamId>,
}

/// Where slots come from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SlotSource {
    Range(DateRangeAvailability),
    Events { events: Vec<EventWindow> },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSettings {
    pub match_duration_minutes: u32,
    pub break_minutes: u32,
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            match_duration_minutes: 60,
            break_minutes: 0,
        }
    }
}

/// A concrete (datetime, venue) that can host one match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub starts_at: NaiveDateTime,
    pub venue_id: VenueId,
    /// Index into the event list in event mode.
    #[serde(default)]
    pub event_index: Option<usize>,
    /// Only these teams may play here. Empty = every team.
    #[serde(default)]
    pub allowed_teams: Vec<TeamId>,
}

impl Slot {
    pub fn new(starts_at: NaiveDateTime, venue_id: VenueId) -> Self {
        Self {
            starts_at,
            venue_id,
            event_index: None,
            allowed_teams: Vec::new(),
        }
    }

    pub fn allows(&self, team: TeamId) -> bool {
        self.allowed_teams.is_empty() || self.allowed_teams.contains(&team)
    }
}
