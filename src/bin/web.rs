//! Single binary web server: league seasons, schedule previews and standings via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, SCHEDULER_ATTEMPTS (default 20), SCHEDULER_WORKERS (default 4).

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use league_scheduler::logic::schedule_csv_string;
use league_scheduler::models::{
    ConstraintSet, GenerationOptions, Group, HandlerSettings, KnockoutDraw, MatchStatus,
    PairingSettings, ScoreWeights, SlotSettings, DEFAULT_BASE_SEED,
};
use league_scheduler::{
    advance_phase, close_season_phase, knockout_bracket_state, persist_schedule,
    preview_next_knockout_round, preview_phase_schedule, schedule_next_knockout_round, season_phases,
    season_standings, MatchId, PhaseId, PhaseScheduleOptions, ProposedMatch, Season, SeasonId,
    SlotSource, StandingsConfig, TeamId, TournamentHandler,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Per-season entry: season data, its table rules and last activity time (for auto-cleanup).
struct SeasonEntry {
    season: Season,
    standings: StandingsConfig,
    last_activity: Instant,
}

/// In-memory state: many seasons by ID. Entries are removed after 12h inactivity.
type AppState = Data<RwLock<HashMap<SeasonId, SeasonEntry>>>;

/// Optimizer budget read from the environment at startup.
#[derive(Clone, Copy, Debug)]
struct SchedulerConfig {
    attempts: usize,
    workers: usize,
}

/// Inactivity threshold: seasons not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateSeasonBody {
    name: String,
    #[serde(default = "default_handler_key")]
    handler: String,
    #[serde(default)]
    competition_id: Option<Uuid>,
    #[serde(default)]
    standings: Option<StandingsConfig>,
}

fn default_handler_key() -> String {
    TournamentHandler::default().key().to_string()
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

/// Body of a schedule preview. Omitted search settings fall back to the server defaults.
#[derive(Deserialize)]
struct PreviewBody {
    slot_source: SlotSource,
    #[serde(default)]
    slot_settings: SlotSettings,
    #[serde(default)]
    constraints: ConstraintSet,
    #[serde(default)]
    pairing: Option<PairingSettings>,
    #[serde(default)]
    attempts: Option<usize>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    weights: Option<ScoreWeights>,
}

impl PreviewBody {
    fn into_options(self, config: &SchedulerConfig) -> PhaseScheduleOptions {
        PhaseScheduleOptions {
            slot_source: self.slot_source,
            slot_settings: self.slot_settings,
            constraints: self.constraints,
            pairing: self.pairing,
            options: GenerationOptions {
                attempts: self.attempts.unwrap_or(config.attempts),
                base_seed: self.seed.unwrap_or(DEFAULT_BASE_SEED),
                workers: Some(config.workers),
                weights: self.weights.unwrap_or_default(),
            },
        }
    }
}

#[derive(Deserialize)]
struct PersistBody {
    matches: Vec<ProposedMatch>,
    #[serde(default)]
    groups: Vec<Group>,
    /// Knockout phases: the bracket returned by the preview.
    #[serde(default)]
    bracket: Option<KnockoutDraw>,
}

#[derive(Deserialize)]
struct RoundBody {
    matches: Vec<ProposedMatch>,
}

#[derive(Deserialize)]
struct ResultBody {
    home_score: u32,
    away_score: u32,
    /// Required to change the score of an already completed match.
    #[serde(default)]
    correction: bool,
}

#[derive(Deserialize)]
struct StatusBody {
    status: MatchStatus,
}

/// Path segment: season id (e.g. /api/seasons/{id})
#[derive(Deserialize)]
struct SeasonPath {
    id: SeasonId,
}

#[derive(Deserialize)]
struct SeasonTeamPath {
    id: SeasonId,
    team_id: TeamId,
}

#[derive(Deserialize)]
struct SeasonPhasePath {
    id: SeasonId,
    phase_id: PhaseId,
}

#[derive(Deserialize)]
struct SeasonMatchPath {
    id: SeasonId,
    match_id: MatchId,
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "No season" }))
}

fn bad_request(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": e.to_string() }))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "league-scheduler",
    })
}

/// Every tournament format with its phases.
#[get("/api/handlers")]
async fn api_list_handlers() -> HttpResponse {
    let handlers: Vec<_> = TournamentHandler::ALL
        .into_iter()
        .map(|h| json!({ "key": h.key(), "phases": h.phases(), "settings": h.default_settings() }))
        .collect();
    HttpResponse::Ok().json(handlers)
}

#[get("/api/handlers/{key}")]
async fn api_get_handler(key: Path<String>) -> HttpResponse {
    match key.parse::<TournamentHandler>() {
        Ok(h) => HttpResponse::Ok().json(json!({
            "key": h.key(),
            "phases": h.phases(),
            "settings": h.default_settings(),
        })),
        Err(e) => HttpResponse::NotFound().json(json!({ "error": e.to_string() })),
    }
}

/// Create a season (returns it with id; client stores id for subsequent requests).
#[post("/api/seasons")]
async fn api_create_season(state: AppState, body: Json<CreateSeasonBody>) -> HttpResponse {
    let handler = match body.handler.parse::<TournamentHandler>() {
        Ok(h) => h,
        Err(e) => return bad_request(e),
    };
    let name = body.name.trim();
    if name.is_empty() {
        return bad_request("Season name is empty");
    }
    let season = Season::new(name, body.competition_id.unwrap_or_else(Uuid::new_v4), handler);
    let id = season.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    log::info!("created season {} ({})", id, handler);
    let entry = g.entry(id).or_insert(SeasonEntry {
        season,
        standings: body.standings.clone().unwrap_or_default(),
        last_activity: Instant::now(),
    });
    HttpResponse::Ok().json(&entry.season)
}

/// Get a season by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/seasons/{id}")]
async fn api_get_season(state: AppState, path: Path<SeasonPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(&entry.season)
        }
        None => not_found(),
    }
}

/// Replace the season's default pairing settings (return games, groups, bracket, ...).
#[put("/api/seasons/{id}/settings")]
async fn api_set_settings(state: AppState, path: Path<SeasonPath>, body: Json<HandlerSettings>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    entry.season.settings = body.into_inner();
    HttpResponse::Ok().json(&entry.season)
}

#[post("/api/seasons/{id}/teams")]
async fn api_add_team(state: AppState, path: Path<SeasonPath>, body: Json<NameBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let s = &mut entry.season;
    match s.add_team(body.name.as_str()) {
        Ok(_) => HttpResponse::Ok().json(s),
        Err(e) => bad_request(e),
    }
}

#[delete("/api/seasons/{id}/teams/{team_id}")]
async fn api_remove_team(state: AppState, path: Path<SeasonTeamPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let s = &mut entry.season;
    match s.remove_team(path.team_id) {
        Ok(()) => HttpResponse::Ok().json(s),
        Err(e) => bad_request(e),
    }
}

#[post("/api/seasons/{id}/venues")]
async fn api_add_venue(state: AppState, path: Path<SeasonPath>, body: Json<NameBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let name = body.name.trim();
    if name.is_empty() {
        return bad_request("Venue name is empty");
    }
    entry.season.add_venue(name);
    HttpResponse::Ok().json(&entry.season)
}

/// Dry run: propose a schedule for a pending phase. Nothing is stored.
#[post("/api/seasons/{id}/phases/{phase_id}/preview")]
async fn api_preview_schedule(
    state: AppState,
    config: Data<SchedulerConfig>,
    path: Path<SeasonPhasePath>,
    body: Json<PreviewBody>,
) -> HttpResponse {
    // Snapshot under the lock; the search itself runs without holding it.
    let (season, standings) = {
        let mut g = match state.write() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        let entry = match g.get_mut(&path.id) {
            Some(e) => e,
            None => return not_found(),
        };
        entry.last_activity = Instant::now();
        (entry.season.clone(), entry.standings.clone())
    };

    let opts = body.into_inner().into_options(&config);
    let phase_id = path.phase_id.clone();
    let result = tokio::task::spawn_blocking(move || {
        preview_phase_schedule(&season, &phase_id, &opts, &standings)
    })
    .await;

    match result {
        Ok(Ok(response)) => HttpResponse::Ok().json(response),
        Ok(Err(e)) => bad_request(e),
        Err(e) => {
            log::error!("schedule preview task failed: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": "schedule generation failed" }))
        }
    }
}

/// Persist an accepted preview as match rows (all or nothing).
#[post("/api/seasons/{id}/phases/{phase_id}/schedule")]
async fn api_persist_schedule(
    state: AppState,
    path: Path<SeasonPhasePath>,
    body: Json<PersistBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let body = body.into_inner();
    let s = &mut entry.season;
    match persist_schedule(s, &path.phase_id, &body.matches, body.groups, body.bracket) {
        Ok(_) => HttpResponse::Ok().json(s),
        Err(e) => bad_request(e),
    }
}

/// Where a knockout phase's bracket stands: round in play, next round or champion.
#[get("/api/seasons/{id}/phases/{phase_id}/bracket")]
async fn api_bracket_state(state: AppState, path: Path<SeasonPhasePath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    match knockout_bracket_state(&entry.season, &path.phase_id) {
        Ok(bracket) => HttpResponse::Ok().json(bracket),
        Err(e) => bad_request(e),
    }
}

/// Dry run for the next knockout round of a phase. Nothing is stored.
#[post("/api/seasons/{id}/phases/{phase_id}/next-round/preview")]
async fn api_preview_next_round(
    state: AppState,
    config: Data<SchedulerConfig>,
    path: Path<SeasonPhasePath>,
    body: Json<PreviewBody>,
) -> HttpResponse {
    let season = {
        let mut g = match state.write() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        let entry = match g.get_mut(&path.id) {
            Some(e) => e,
            None => return not_found(),
        };
        entry.last_activity = Instant::now();
        entry.season.clone()
    };

    let opts = body.into_inner().into_options(&config);
    let phase_id = path.phase_id.clone();
    let result =
        tokio::task::spawn_blocking(move || preview_next_knockout_round(&season, &phase_id, &opts)).await;

    match result {
        Ok(Ok(response)) => HttpResponse::Ok().json(response),
        Ok(Err(e)) => bad_request(e),
        Err(e) => {
            log::error!("next round preview task failed: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": "schedule generation failed" }))
        }
    }
}

/// Persist the next knockout round (all or nothing).
#[post("/api/seasons/{id}/phases/{phase_id}/next-round")]
async fn api_schedule_next_round(
    state: AppState,
    path: Path<SeasonPhasePath>,
    body: Json<RoundBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let s = &mut entry.season;
    match schedule_next_knockout_round(s, &path.phase_id, &body.matches) {
        Ok(_) => HttpResponse::Ok().json(s),
        Err(e) => bad_request(e),
    }
}

/// Enter a result, or correct one with `"correction": true`.
#[put("/api/seasons/{id}/matches/{match_id}/result")]
async fn api_set_result(state: AppState, path: Path<SeasonMatchPath>, body: Json<ResultBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let s = &mut entry.season;
    let result = if body.correction {
        s.correct_result(path.match_id, body.home_score, body.away_score)
    } else {
        s.record_result(path.match_id, body.home_score, body.away_score)
    };
    match result {
        Ok(()) => HttpResponse::Ok().json(s),
        Err(e) => bad_request(e),
    }
}

/// Postpone, cancel or start a match.
#[put("/api/seasons/{id}/matches/{match_id}/status")]
async fn api_set_match_status(
    state: AppState,
    path: Path<SeasonMatchPath>,
    body: Json<StatusBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let s = &mut entry.season;
    match s.set_match_status(path.match_id, body.status) {
        Ok(()) => HttpResponse::Ok().json(s),
        Err(e) => bad_request(e),
    }
}

/// Administrative close: unfinished matches of the phase are forfeited.
#[post("/api/seasons/{id}/phases/{phase_id}/close")]
async fn api_close_phase(state: AppState, path: Path<SeasonPhasePath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    match close_season_phase(&mut entry.season, &path.phase_id) {
        Ok(forced) => HttpResponse::Ok().json(json!({
            "forfeited": forced,
            "phases": season_phases(&entry.season),
        })),
        Err(e) => bad_request(e),
    }
}

/// Seed the destination phase from a completed phase's table.
#[post("/api/seasons/{id}/phases/{phase_id}/advance")]
async fn api_advance_phase(state: AppState, path: Path<SeasonPhasePath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let standings = entry.standings.clone();
    match advance_phase(&mut entry.season, &path.phase_id, &standings) {
        Ok(teams) => HttpResponse::Ok().json(json!({ "qualified": teams })),
        Err(e) => bad_request(e),
    }
}

#[get("/api/seasons/{id}/phases")]
async fn api_phase_statuses(state: AppState, path: Path<SeasonPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(season_phases(&entry.season)),
        None => not_found(),
    }
}

#[get("/api/seasons/{id}/standings")]
async fn api_standings(state: AppState, path: Path<SeasonPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(season_standings(&entry.season, &entry.standings)),
        None => not_found(),
    }
}

/// Fixture list of every persisted match as CSV.
#[get("/api/seasons/{id}/matches.csv")]
async fn api_matches_csv(state: AppState, path: Path<SeasonPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    let s = &entry.season;
    let mut matches = s.matches.clone();
    matches.sort_by_key(|m| m.scheduled_at);
    match schedule_csv_string(&matches, &s.teams, &s.venues) {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .body(csv),
        Err(e) => HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = env_or("PORT", default_port());
    let scheduler = SchedulerConfig {
        attempts: env_or("SCHEDULER_ATTEMPTS", league_scheduler::models::DEFAULT_ATTEMPTS).max(1),
        workers: env_or("SCHEDULER_WORKERS", 4usize).clamp(1, 32),
    };
    let bind = (host.as_str(), port);
    log::info!(
        "Starting server at http://{}:{} ({} attempts, {} workers)",
        bind.0,
        bind.1,
        scheduler.attempts,
        scheduler.workers
    );

    let state = Data::new(RwLock::new(HashMap::<SeasonId, SeasonEntry>::new()));
    let scheduler = Data::new(scheduler);

    // Background task: every 30 minutes, remove seasons inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive season(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(scheduler.clone())
            .service(api_health)
            .service(api_list_handlers)
            .service(api_get_handler)
            .service(api_create_season)
            .service(api_get_season)
            .service(api_set_settings)
            .service(api_add_team)
            .service(api_remove_team)
            .service(api_add_venue)
            .service(api_preview_schedule)
            .service(api_persist_schedule)
            .service(api_bracket_state)
            .service(api_preview_next_round)
            .service(api_schedule_next_round)
            .service(api_set_result)
            .service(api_set_match_status)
            .service(api_close_phase)
            .service(api_advance_phase)
            .service(api_phase_statuses)
            .service(api_standings)
            .service(api_matches_csv)
    })
    .bind(bind)?
    .run()
    .await
}
