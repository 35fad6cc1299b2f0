//! CSV fixture list for proposed or persisted matches.

use crate::models::{Match, PhaseId, ProposedMatch, ScheduleError, Team, TeamId, Venue, VenueId};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::io::Write;

/// Anything that can appear as a line in a fixture list.
pub trait Fixture {
    fn stage_id(&self) -> &PhaseId;
    fn home_team_id(&self) -> TeamId;
    fn away_team_id(&self) -> TeamId;
    fn referee_team_id(&self) -> Option<TeamId>;
    fn venue_id(&self) -> Option<VenueId>;
    fn scheduled_at(&self) -> Option<NaiveDateTime>;
}

impl Fixture for ProposedMatch {
    fn stage_id(&self) -> &PhaseId {
        &self.stage_id
    }
    fn home_team_id(&self) -> TeamId {
        self.home_team_id
    }
    fn away_team_id(&self) -> TeamId {
        self.away_team_id
    }
    fn referee_team_id(&self) -> Option<TeamId> {
        self.referee_team_id
    }
    fn venue_id(&self) -> Option<VenueId> {
        Some(self.venue_id)
    }
    fn scheduled_at(&self) -> Option<NaiveDateTime> {
        Some(self.scheduled_at)
    }
}

impl Fixture for Match {
    fn stage_id(&self) -> &PhaseId {
        &self.stage_id
    }
    fn home_team_id(&self) -> TeamId {
        self.home_team_id
    }
    fn away_team_id(&self) -> TeamId {
        self.away_team_id
    }
    fn referee_team_id(&self) -> Option<TeamId> {
        self.referee_team_id
    }
    fn venue_id(&self) -> Option<VenueId> {
        self.venue_id
    }
    fn scheduled_at(&self) -> Option<NaiveDateTime> {
        self.scheduled_at
    }
}

const HEADER: [&str; 7] = ["date", "time", "venue", "home", "away", "referee", "stage"];

#[derive(Serialize)]
struct FixtureRow<'a> {
    date: String,
    time: String,
    venue: &'a str,
    home: &'a str,
    away: &'a str,
    referee: &'a str,
    stage: &'a str,
}

/// Write one CSV line per fixture (header: date,time,venue,home,away,referee,stage).
///
/// Team and venue ids are resolved to names; unknown ids are written as the raw id.
/// Unscheduled matches get empty date and time. The header is written even for an
/// empty list.
pub fn write_schedule_csv<W: Write, F: Fixture>(
    writer: W,
    fixtures: &[F],
    teams: &[Team],
    venues: &[Venue],
) -> Result<(), ScheduleError> {
    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    out.write_record(HEADER)
        .map_err(|e| ScheduleError::Export(e.to_string()))?;
    for f in fixtures {
        let home = team_name(teams, f.home_team_id());
        let away = team_name(teams, f.away_team_id());
        let referee = f
            .referee_team_id()
            .map(|id| team_name(teams, id))
            .unwrap_or_default();
        let venue = f.venue_id().map(|id| venue_name(venues, id)).unwrap_or_default();
        let (date, time) = match f.scheduled_at() {
            Some(at) => (at.format("%Y-%m-%d").to_string(), at.format("%H:%M").to_string()),
            None => (String::new(), String::new()),
        };
        out.serialize(FixtureRow {
            date,
            time,
            venue: &venue,
            home: &home,
            away: &away,
            referee: &referee,
            stage: f.stage_id(),
        })
        .map_err(|e| ScheduleError::Export(e.to_string()))?;
    }
    out.flush().map_err(|e| ScheduleError::Export(e.to_string()))
}

/// Same as `write_schedule_csv`, collected into a string.
pub fn schedule_csv_string<F: Fixture>(
    fixtures: &[F],
    teams: &[Team],
    venues: &[Venue],
) -> Result<String, ScheduleError> {
    let mut buf = Vec::new();
    write_schedule_csv(&mut buf, fixtures, teams, venues)?;
    String::from_utf8(buf).map_err(|e| ScheduleError::Export(e.to_string()))
}

fn team_name(teams: &[Team], id: TeamId) -> String {
    teams
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.display_name().to_string())
        .unwrap_or_else(|| id.to_string())
}

fn venue_name(venues: &[Venue], id: VenueId) -> String {
    venues
        .iter()
        .find(|v| v.id == id)
        .map(|v| v.name.clone())
        .unwrap_or_else(|| id.to_string())
}
