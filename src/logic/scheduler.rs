//! Constraint scoring and the multi-attempt optimizer.
//!
//! Each attempt is a pure function of (pairings, slots, seed): shuffle the pairing
//! order, place pairings greedily in the earliest acceptable slot, then score the
//! result. Attempts share nothing, so they run on a rayon pool and the best
//! (lowest score, then lowest index) wins. Attempt 0 keeps the supplied order and
//! serves as the baseline.

use crate::logic::pairing::generate_phase_pairings;
use crate::logic::slots::allocate_slots;
use crate::models::{
    Assignment, ConstraintSet, GenerationOptions, GenerationStats, Pairing, ProposedMatch,
    ScheduleError, ScheduleQuality, ScheduleRequest, ScheduleResponse, ScoreWeights, Slot, TeamId,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Inputs shared by every attempt.
#[derive(Clone, Copy, Debug)]
pub struct AttemptInput<'a> {
    pub pairings: &'a [Pairing],
    pub slots: &'a [Slot],
    /// Full roster: referee pool, fill-mode candidates and balance measure.
    pub teams: &'a [TeamId],
    /// Fixtures played before this generation (repeat detection).
    pub history: &'a [Pairing],
    pub constraints: &'a ConstraintSet,
    pub weights: &'a ScoreWeights,
    /// Match length: a team is busy from a slot's start until this many minutes later.
    pub match_minutes: u32,
}

/// One attempt's schedule and its score.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateSchedule {
    pub attempt_index: usize,
    pub seed: u64,
    pub assignments: Vec<Assignment>,
    pub unscheduled: Vec<Pairing>,
    pub quality: ScheduleQuality,
    pub score: f64,
}

/// Seed of attempt `attempt_index`, derived from the request's base seed.
pub fn attempt_seed(base_seed: u64, attempt_index: usize) -> u64 {
    base_seed.wrapping_add((attempt_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Dry run for one phase: draw pairings, build slots, keep the best of N attempts.
pub fn generate_schedule(request: &ScheduleRequest) -> Result<ScheduleResponse, ScheduleError> {
    let mut draw_rng = StdRng::seed_from_u64(request.options.base_seed);
    let draw = generate_phase_pairings(
        request.phase.generation,
        &request.teams,
        &request.pairing,
        &mut draw_rng,
    )?;
    let placed = schedule_pairings(request, &draw.pairings)?;

    Ok(ScheduleResponse {
        matches: placed.matches,
        unscheduled: placed.unscheduled,
        groups: draw.groups,
        byes: draw.byes,
        bracket: draw.bracket,
        stats: placed.stats,
    })
}

/// Fixtures placed by the optimizer for already-drawn pairings.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedPairings {
    /// Ordered by kick-off.
    pub matches: Vec<ProposedMatch>,
    pub unscheduled: Vec<Pairing>,
    pub stats: GenerationStats,
}

/// Place `pairings` into the request's slots. The request's pairing settings are not
/// used; this is how later knockout rounds are scheduled.
pub fn schedule_pairings(
    request: &ScheduleRequest,
    pairings: &[Pairing],
) -> Result<PlacedPairings, ScheduleError> {
    let constraints = match &request.phase.constraints {
        Some(phase) => request.constraints.clone().with_phase_constraints(phase),
        None => request.constraints.clone(),
    };
    constraints.validate()?;
    let slots = allocate_slots(&request.slot_source, &request.slot_settings)?;

    let input = AttemptInput {
        pairings,
        slots: &slots,
        teams: &request.teams,
        history: &request.history,
        constraints: &constraints,
        weights: &request.options.weights,
        match_minutes: request.slot_settings.match_duration_minutes,
    };
    let (best, stats) = optimize(input, &request.options)?;

    let mut matches: Vec<ProposedMatch> = best
        .assignments
        .iter()
        .map(|a| ProposedMatch {
            stage_id: request.phase.id.clone(),
            home_team_id: a.pairing.home,
            away_team_id: a.pairing.away,
            referee_team_id: a.referee,
            venue_id: a.slot.venue_id,
            scheduled_at: a.slot.starts_at,
        })
        .collect();
    matches.sort_by_key(|m| m.scheduled_at);

    if !best.unscheduled.is_empty() {
        log::warn!(
            "phase {}: {} pairing(s) could not be placed",
            request.phase.id,
            best.unscheduled.len()
        );
    }

    Ok(PlacedPairings {
        matches,
        unscheduled: best.unscheduled,
        stats,
    })
}

/// Run every attempt and keep the lowest score.
///
/// Fails only with `InsufficientSlots` (more pairings than slots) or a malformed
/// constraint; otherwise a best-effort schedule is always returned.
pub fn optimize(
    input: AttemptInput<'_>,
    options: &GenerationOptions,
) -> Result<(CandidateSchedule, GenerationStats), ScheduleError> {
    input.constraints.validate()?;
    if input.pairings.len() > input.slots.len() {
        return Err(ScheduleError::InsufficientSlots {
            pairings: input.pairings.len(),
            slots: input.slots.len(),
        });
    }

    let attempts = options.attempts.max(1);
    let base_seed = options.base_seed;
    let run_all = move || {
        (0..attempts)
            .into_par_iter()
            .map(move |i| run_attempt(input, i, attempt_seed(base_seed, i)))
            .collect::<Vec<_>>()
    };
    let candidates = match build_pool(options.workers) {
        Some(pool) => pool.install(run_all),
        None => run_all(),
    };

    for c in &candidates {
        log::debug!(
            "attempt {} (seed {}): score {:.3}, {:?}",
            c.attempt_index,
            c.seed,
            c.score,
            c.quality
        );
    }

    let baseline_score = candidates.first().map(|c| c.score).unwrap_or_default();
    let best = candidates
        .into_iter()
        .min_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then(a.attempt_index.cmp(&b.attempt_index))
        })
        .ok_or_else(|| ScheduleError::InvalidConstraint("no attempts were run".to_string()))?;

    log::info!(
        "picked attempt {} of {} with score {:.3} (baseline {:.3})",
        best.attempt_index,
        attempts,
        best.score,
        baseline_score
    );

    let stats = GenerationStats {
        attempts_run: attempts,
        best_attempt_index: best.attempt_index,
        best_seed: best.seed,
        best_score: best.score,
        baseline_score,
        quality: best.quality.clone(),
    };
    Ok((best, stats))
}

fn build_pool(workers: Option<usize>) -> Option<rayon::ThreadPool> {
    let threads = workers?.clamp(1, 64);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

/// One randomized pass. Attempt 0 keeps the input order.
pub fn run_attempt(input: AttemptInput<'_>, attempt_index: usize, seed: u64) -> CandidateSchedule {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order = input.pairings.to_vec();
    if attempt_index > 0 {
        order.shuffle(&mut rng);
    }

    let mut state = AttemptState::new(input);
    for pairing in order {
        state.schedule(pairing);
    }
    if let Some(target) = input.constraints.target_matches_per_team {
        state.fill(target as usize, &mut rng);
    }

    let quality = evaluate_schedule(&state.assignments, state.unscheduled.len(), &input);
    let score = quality.score(input.weights, input.constraints);
    CandidateSchedule {
        attempt_index,
        seed,
        assignments: state.assignments,
        unscheduled: state.unscheduled,
        quality,
        score,
    }
}

/// Distinct start times per day, sorted: the position of a slot's time is its time index.
fn day_timelines(slots: &[Slot]) -> HashMap<NaiveDate, Vec<NaiveTime>> {
    let mut timelines: HashMap<NaiveDate, Vec<NaiveTime>> = HashMap::new();
    for s in slots {
        timelines
            .entry(s.starts_at.date())
            .or_default()
            .push(s.starts_at.time());
    }
    for times in timelines.values_mut() {
        times.sort();
        times.dedup();
    }
    timelines
}

fn time_index(timelines: &HashMap<NaiveDate, Vec<NaiveTime>>, at: NaiveDateTime) -> usize {
    timelines
        .get(&at.date())
        .and_then(|t| t.binary_search(&at.time()).ok())
        .unwrap_or(0)
}

/// Score a finished schedule from scratch.
pub fn evaluate_schedule(
    assignments: &[Assignment],
    unscheduled: usize,
    input: &AttemptInput<'_>,
) -> ScheduleQuality {
    let timelines = day_timelines(input.slots);

    let mut fixtures: HashMap<Pairing, usize> = HashMap::new();
    for p in input.history {
        *fixtures.entry(*p).or_default() += 1;
    }
    let mut repeat_violations = 0;
    let mut appearances: HashMap<TeamId, Vec<(NaiveDate, usize)>> = HashMap::new();
    for a in assignments {
        let seen = fixtures.entry(a.pairing).or_default();
        if *seen > 0 {
            repeat_violations += 1;
        }
        *seen += 1;
        let at = (a.slot.starts_at.date(), time_index(&timelines, a.slot.starts_at));
        appearances.entry(a.pairing.home).or_default().push(at);
        appearances.entry(a.pairing.away).or_default().push(at);
    }

    let mut back_to_back_violations = 0;
    let mut rest_violations = 0;
    let mut daily_cap_violations = 0;
    for entries in appearances.values_mut() {
        entries.sort();
        for w in entries.windows(2) {
            if w[0].0 == w[1].0 && w[1].1 == w[0].1 + 1 {
                back_to_back_violations += 1;
            }
        }

        let mut per_day: Vec<(NaiveDate, usize)> = Vec::new();
        for &(date, _) in entries.iter() {
            match per_day.last_mut() {
                Some((d, n)) if *d == date => *n += 1,
                _ => per_day.push((date, 1)),
            }
        }
        if let Some(cap) = input.constraints.max_matches_per_team_per_day {
            daily_cap_violations += per_day
                .iter()
                .map(|&(_, n)| n.saturating_sub(cap as usize))
                .sum::<usize>();
        }
        if let Some(rest) = input.constraints.rest_days_between_matches {
            rest_violations += per_day
                .windows(2)
                .filter(|w| (w[1].0 - w[0].0).num_days() <= i64::from(rest))
                .count();
        }
    }

    ScheduleQuality {
        repeat_violations,
        back_to_back_violations,
        rest_violations,
        daily_cap_violations,
        unfilled_slots: input.slots.len().saturating_sub(assignments.len()),
        unscheduled_pairings: unscheduled,
        match_imbalance_std_dev: imbalance(assignments, input),
    }
}

/// Population standard deviation of matches per team.
fn imbalance(assignments: &[Assignment], input: &AttemptInput<'_>) -> f64 {
    let mut teams: Vec<TeamId> = input.teams.to_vec();
    if teams.is_empty() {
        let mut seen = HashSet::new();
        for p in input.pairings {
            for t in [p.home, p.away] {
                if seen.insert(t) {
                    teams.push(t);
                }
            }
        }
    }
    if teams.is_empty() {
        return 0.0;
    }
    let counts: Vec<f64> = teams
        .iter()
        .map(|t| assignments.iter().filter(|a| a.pairing.involves(*t)).count() as f64)
        .collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    variance.sqrt()
}

/// Mutable bookkeeping of one attempt. Never shared between attempts.
struct AttemptState<'a> {
    input: AttemptInput<'a>,
    timelines: HashMap<NaiveDate, Vec<NaiveTime>>,
    used: Vec<bool>,
    /// Slot indices each team plays in.
    playing: HashMap<TeamId, Vec<usize>>,
    /// Start times each team is committed to (playing or refereeing).
    busy: HashMap<TeamId, Vec<NaiveDateTime>>,
    fixtures: HashMap<Pairing, usize>,
    meetings: HashMap<(TeamId, TeamId), usize>,
    home_games: HashMap<TeamId, usize>,
    referee_load: HashMap<TeamId, usize>,
    /// Fixtures whose mirror is also requested; never flipped for home balance.
    paired_with_mirror: HashSet<Pairing>,
    assignments: Vec<Assignment>,
    unscheduled: Vec<Pairing>,
}

/// Slot cost for one team, compared lexicographically: back-to-back first.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
struct Penalty {
    back_to_back: usize,
    daily_cap: usize,
    rest: usize,
}

impl Penalty {
    fn add(self, other: Penalty) -> Penalty {
        Penalty {
            back_to_back: self.back_to_back + other.back_to_back,
            daily_cap: self.daily_cap + other.daily_cap,
            rest: self.rest + other.rest,
        }
    }

    fn is_zero(&self) -> bool {
        *self == Penalty::default()
    }
}

impl<'a> AttemptState<'a> {
    fn new(input: AttemptInput<'a>) -> Self {
        let mut fixtures: HashMap<Pairing, usize> = HashMap::new();
        let mut meetings: HashMap<(TeamId, TeamId), usize> = HashMap::new();
        for p in input.history {
            *fixtures.entry(*p).or_default() += 1;
            *meetings.entry(p.unordered_key()).or_default() += 1;
        }
        let requested: HashSet<Pairing> = input.pairings.iter().copied().collect();
        let paired_with_mirror = requested
            .iter()
            .copied()
            .filter(|p| requested.contains(&p.mirrored()))
            .collect();

        Self {
            input,
            timelines: day_timelines(input.slots),
            used: vec![false; input.slots.len()],
            playing: HashMap::new(),
            busy: HashMap::new(),
            fixtures,
            meetings,
            home_games: HashMap::new(),
            referee_load: HashMap::new(),
            paired_with_mirror,
            assignments: Vec::new(),
            unscheduled: Vec::new(),
        }
    }

    fn schedule(&mut self, pairing: Pairing) {
        let pairing = self.orient(pairing);
        match self.find_slot(pairing) {
            Some(index) => self.place(pairing, index),
            None => self.unscheduled.push(pairing),
        }
    }

    /// Flip home/away when home balance is on and the host is ahead on home games.
    fn orient(&self, pairing: Pairing) -> Pairing {
        if !self.input.constraints.balance_home_away || self.paired_with_mirror.contains(&pairing) {
            return pairing;
        }
        let home = self.home_games.get(&pairing.home).copied().unwrap_or(0);
        let away = self.home_games.get(&pairing.away).copied().unwrap_or(0);
        if home > away {
            pairing.mirrored()
        } else {
            pairing
        }
    }

    /// No commitment of `team` overlaps a match starting at `at`.
    fn is_free(&self, team: TeamId, at: NaiveDateTime) -> bool {
        let length = i64::from(self.input.match_minutes.max(1));
        self.busy.get(&team).map_or(true, |times| {
            times
                .iter()
                .all(|&t| (t - at).num_minutes().abs() >= length)
        })
    }

    fn penalty(&self, team: TeamId, index: usize) -> Penalty {
        let constraints = self.input.constraints;
        let at = self.input.slots[index].starts_at;
        let date = at.date();
        let ti = time_index(&self.timelines, at);

        let mut p = Penalty::default();
        let mut same_day = 0;
        for &other in self.playing.get(&team).into_iter().flatten() {
            let other_at = self.input.slots[other].starts_at;
            let other_date = other_at.date();
            if other_date == date {
                same_day += 1;
                let oi = time_index(&self.timelines, other_at);
                if constraints.avoid_back_to_back && ti.abs_diff(oi) == 1 {
                    p.back_to_back += 1;
                }
            } else if let Some(rest) = constraints.rest_days_between_matches {
                if (date - other_date).num_days().abs() <= i64::from(rest) {
                    p.rest += 1;
                }
            }
        }
        if let Some(cap) = constraints.max_matches_per_team_per_day {
            if same_day >= cap as usize {
                p.daily_cap += 1;
            }
        }
        p
    }

    /// Earliest feasible slot with no soft violation, else the least-bad feasible one.
    fn find_slot(&self, pairing: Pairing) -> Option<usize> {
        let mut best: Option<(Penalty, usize)> = None;
        for (index, slot) in self.input.slots.iter().enumerate() {
            if self.used[index] || !slot.allows(pairing.home) || !slot.allows(pairing.away) {
                continue;
            }
            if !self.is_free(pairing.home, slot.starts_at) || !self.is_free(pairing.away, slot.starts_at) {
                continue;
            }
            let p = self
                .penalty(pairing.home, index)
                .add(self.penalty(pairing.away, index));
            if p.is_zero() {
                return Some(index);
            }
            if best.map_or(true, |(bp, _)| p < bp) {
                best = Some((p, index));
            }
        }
        best.map(|(_, index)| index)
    }

    fn place(&mut self, pairing: Pairing, index: usize) {
        let slot = self.input.slots[index].clone();
        self.used[index] = true;
        for team in [pairing.home, pairing.away] {
            self.playing.entry(team).or_default().push(index);
            self.busy.entry(team).or_default().push(slot.starts_at);
        }
        *self.fixtures.entry(pairing).or_default() += 1;
        *self.meetings.entry(pairing.unordered_key()).or_default() += 1;
        *self.home_games.entry(pairing.home).or_default() += 1;

        let referee = if self.input.constraints.auto_referee {
            self.pick_referee(pairing, slot.starts_at)
        } else {
            None
        };
        if let Some(r) = referee {
            self.busy.entry(r).or_default().push(slot.starts_at);
            *self.referee_load.entry(r).or_default() += 1;
        }

        self.assignments.push(Assignment {
            pairing,
            slot,
            referee,
        });
    }

    /// Free team with the fewest referee duties; roster order breaks ties.
    fn pick_referee(&self, pairing: Pairing, at: NaiveDateTime) -> Option<TeamId> {
        self.input
            .teams
            .iter()
            .copied()
            .filter(|&t| !pairing.involves(t) && self.is_free(t, at))
            .min_by_key(|t| self.referee_load.get(t).copied().unwrap_or(0))
    }

    fn match_count(&self, team: TeamId) -> usize {
        self.playing.get(&team).map_or(0, Vec::len)
    }

    /// Add pairings between teams below `target` while slots can take them.
    /// Fewest matches first; with `avoid_repeats`, teams that have not met come first.
    fn fill<R: Rng + ?Sized>(&mut self, target: usize, rng: &mut R) {
        loop {
            let below: Vec<TeamId> = self
                .input
                .teams
                .iter()
                .copied()
                .filter(|&t| self.match_count(t) < target)
                .collect();
            if below.len() < 2 {
                break;
            }

            let mut candidates: Vec<((usize, usize, u32), Pairing)> = Vec::new();
            for (i, &a) in below.iter().enumerate() {
                for &b in &below[i + 1..] {
                    let load = self.match_count(a) + self.match_count(b);
                    let met = if self.input.constraints.avoid_repeats {
                        self.meetings
                            .get(&Pairing::new(a, b).unordered_key())
                            .copied()
                            .unwrap_or(0)
                    } else {
                        0
                    };
                    candidates.push(((met, load, rng.gen()), self.fill_orientation(a, b)));
                }
            }
            candidates.sort_by_key(|(key, _)| *key);

            let placed = candidates.into_iter().find_map(|(_, p)| {
                self.find_slot(p).map(|index| (p, index))
            });
            match placed {
                Some((pairing, index)) => self.place(pairing, index),
                None => break,
            }
        }
    }

    /// Prefer the direction not yet played, then the team with fewer home games at home.
    fn fill_orientation(&self, a: TeamId, b: TeamId) -> Pairing {
        let ab = Pairing::new(a, b);
        let ba = ab.mirrored();
        let used_ab = self.fixtures.get(&ab).copied().unwrap_or(0);
        let used_ba = self.fixtures.get(&ba).copied().unwrap_or(0);
        if used_ab != used_ba {
            return if used_ab < used_ba { ab } else { ba };
        }
        let home_a = self.home_games.get(&a).copied().unwrap_or(0);
        let home_b = self.home_games.get(&b).copied().unwrap_or(0);
        if home_b < home_a {
            ba
        } else {
            ab
        }
    }
}
