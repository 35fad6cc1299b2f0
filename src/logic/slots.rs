//! Slot allocation: expand availability into an ordered list of (datetime, venue) slots.

use crate::models::{
    DateRangeAvailability, EventWindow, ScheduleError, Slot, SlotSettings, SlotSource,
};
use chrono::{Datelike, Duration, NaiveTime};

/// Expand a slot source into slots ordered by start time (then venue order).
///
/// Degenerate windows (end before start, end <= start time) yield no slots rather
/// than an error; the optimizer reports `InsufficientSlots` when it needs them.
/// Malformed time strings and a zero-length match are errors.
pub fn allocate_slots(source: &SlotSource, settings: &SlotSettings) -> Result<Vec<Slot>, ScheduleError> {
    let mut slots = match source {
        SlotSource::Range(range) => range_slots(range)?,
        SlotSource::Events { events } => event_slots(events, settings)?,
    };
    // Stable: venues keep their configured order within one start time.
    slots.sort_by_key(|s| s.starts_at);
    Ok(slots)
}

fn range_slots(range: &DateRangeAvailability) -> Result<Vec<Slot>, ScheduleError> {
    let mut times = range
        .time_slots
        .iter()
        .map(|t| parse_time(t))
        .collect::<Result<Vec<_>, _>>()?;
    times.sort();
    times.dedup();

    let mut slots = Vec::new();
    let mut day = range.start_date;
    while day <= range.end_date {
        if range.weekdays.is_empty() || range.weekdays.contains(&day.weekday()) {
            for &time in &times {
                for &venue in &range.venue_ids {
                    slots.push(Slot::new(day.and_time(time), venue));
                }
            }
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    Ok(slots)
}

fn event_slots(events: &[EventWindow], settings: &SlotSettings) -> Result<Vec<Slot>, ScheduleError> {
    if settings.match_duration_minutes == 0 {
        return Err(ScheduleError::InvalidConstraint(
            "match duration must be at least 1 minute".to_string(),
        ));
    }
    let step = i64::from(settings.match_duration_minutes) + i64::from(settings.break_minutes);

    let mut slots = Vec::new();
    for (index, event) in events.iter().enumerate() {
        let start = parse_time(&event.start_time)?;
        let end = parse_time(&event.end_time)?;
        let per_venue = slots_per_venue(start, end, step);
        let first = event.date.and_time(start);
        for k in 0..per_venue {
            let starts_at = first + Duration::minutes(k * step);
            for &venue in &event.venue_ids {
                slots.push(Slot {
                    starts_at,
                    venue_id: venue,
                    event_index: Some(index),
                    allowed_teams: event.team_ids.clone(),
                });
            }
        }
    }
    Ok(slots)
}

/// floor((end - start) / (duration + break)), or 0 when the window is empty.
fn slots_per_venue(start: NaiveTime, end: NaiveTime, step: i64) -> i64 {
    let minutes = (end - start).num_minutes();
    if minutes <= 0 || step <= 0 {
        return 0;
    }
    minutes / step
}

/// Parse "HH:MM" (or "HH:MM:SS").
pub fn parse_time(value: &str) -> Result<NaiveTime, ScheduleError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ScheduleError::InvalidConstraint(format!("invalid time '{}', expected HH:MM", value)))
}
