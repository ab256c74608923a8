use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use validator::Validate;
use crate::core::{EngineError, EngineRegistry, MatchContext, TrigCache};
use crate::models::{EnginesResponse, ErrorResponse, HealthResponse, MatchRequest};
use crate::services::Roster;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub roster: Arc<Roster>,
    pub engines: Arc<EngineRegistry>,
    pub trig_cache: Arc<Mutex<TrigCache>>,
    pub match_timeout: Duration,
}

impl AppState {
    pub fn new(roster: Roster, engines: EngineRegistry, trig_cache: TrigCache, match_timeout: Duration) -> Self {
        Self {
            roster: Arc::new(roster),
            engines: Arc::new(engines),
            trig_cache: Arc::new(Mutex::new(trig_cache)),
            match_timeout,
        }
    }
}

/// Errors surfaced to HTTP callers as JSON
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Match computation exceeded {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Match computation failed: {0}")]
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidJson(_) => "invalid_json",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Engine(EngineError::UnknownEngine(_)) => "unknown_engine",
            ApiError::Engine(_) => "engine_error",
            ApiError::Timeout(_) => "timeout",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(EngineError::UnknownEngine(_)) => StatusCode::NOT_FOUND,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Engine(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/engines", web::get().to(list_engines))
        .route("/match", web::post().to(find_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let engines = state.engines.health();
    let healthy = !state.roster.is_empty() && engines.iter().all(|engine| engine.ready);
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        roster_size: state.roster.len(),
        engines,
    })
}

/// Engine listing endpoint
async fn list_engines(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(EnginesResponse {
        default_engine: state.engines.default_engine().to_string(),
        engines: state.engines.list(),
    })
}

/// Find matches endpoint
///
/// POST /api/v1/match
///
/// Request body:
/// ```json
/// {
///   "engine": "fuzzy",
///   "city": "Tel Aviv",
///   "service": "wound care",
///   "expertiseTags": ["pediatrics"],
///   "start": "2024-06-03T09:00:00Z",
///   "end": "2024-06-03T11:00:00Z",
///   "lat": 32.08,
///   "lng": 34.78,
///   "radiusKm": 25,
///   "urgent": false,
///   "topK": 5
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<MatchRequest>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match request: {}", errors);
        return Err(ApiError::Validation(errors.to_string()));
    }

    let engine = state.engines.resolve(req.engine.as_deref())?;
    let engine_name = engine.name();
    let request = req.into_inner();
    let roster = Arc::clone(&state.roster);
    let trig_cache = Arc::clone(&state.trig_cache);

    tracing::info!(
        "Matching with engine {} (city: {:?}, services: {:?}, topK: {:?})",
        engine_name,
        request.city,
        request.services,
        request.top_k
    );

    let job = web::block(move || {
        // A busy or poisoned cache just means this request computes without it
        let mut guard = trig_cache.try_lock().ok();
        let mut ctx = MatchContext::new(chrono::Utc::now());
        ctx.trig_cache = guard.as_deref_mut();
        engine.run(roster.nurses(), &request, ctx)
    });

    let response = match tokio::time::timeout(state.match_timeout, job).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::error!("Match computation on engine {} failed: {}", engine_name, e);
            return Err(ApiError::Internal(e.to_string()));
        }
        Err(_) => {
            tracing::warn!("Match computation on engine {} timed out", engine_name);
            return Err(ApiError::Timeout(state.match_timeout));
        }
    };

    tracing::info!("Returning {} matches from engine {}", response.count, engine_name);

    Ok(HttpResponse::Ok().json(response))
}
