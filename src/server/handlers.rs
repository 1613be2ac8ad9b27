use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::location::{GeocodingStatus, ResolutionError};
use crate::ranking::{fetch_rankings, RankingRequest, RankingRequestBody, RankingResults};

use super::state::AppState;
use super::static_files;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<ResolutionError> for ApiError {
    fn from(e: ResolutionError) -> Self {
        match e {
            ResolutionError::EmptyQuery => api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ResolutionError::Exhausted { .. } => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

/// Last-resort response for a handler that panicked.
pub(super) fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    error!("request handler panicked");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn index() -> Html<&'static str> {
    Html(static_files::INDEX_HTML)
}

// ─── GET /health ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

// ─── GET /api/status ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct UpstreamStatus {
    pub status: String,
    pub url: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub dataforseo: UpstreamStatus,
    pub geocoding: GeocodingStatus,
}

pub async fn api_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let start = Instant::now();

    let ranking = Arc::clone(&state.ranking);
    let url = ranking.base_url().to_string();
    let dataforseo = match tokio::task::spawn_blocking(move || ranking.test_connection()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "error".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let geocoding = state.resolver.status().await;

    info!(
        dataforseo = %dataforseo,
        geocoding = ?geocoding.status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "GET /api/status"
    );

    Json(StatusResponse {
        dataforseo: UpstreamStatus { status: dataforseo, url },
        geocoding,
    })
}

// ─── POST /api/check-rankings ────────────────────────────────────

pub async fn check_rankings(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RankingRequestBody>, JsonRejection>,
) -> Result<Json<RankingResults>, Response> {
    let start = Instant::now();

    let Json(body) = payload
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.body_text()).into_response())?;

    let request = RankingRequest::from_body(body, &state.defaults)
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response())?;

    info!(keyword = %request.keyword, "processing ranking request");

    let location = state.resolver.resolve(&request.location).await.map_err(|e| {
        error!(error = %e, "ranking request failed");
        ApiError::from(e).into_response()
    })?;

    let (organic, maps) = fetch_rankings(Arc::clone(&state.ranking), &request, &location).await;

    let elapsed = start.elapsed().as_secs_f64();
    let results = RankingResults {
        keyword: request.keyword,
        location,
        device: request.device,
        language_code: request.language_code,
        depth: request.depth,
        organic_results: organic.into_items(),
        maps_results: maps.into_items(),
        check_date: Utc::now(),
        processing_time_seconds: (elapsed * 100.0).round() / 100.0,
    };

    info!(
        keyword = %results.keyword,
        lat = results.location.latitude,
        lon = results.location.longitude,
        organic = results.organic_results.len(),
        maps = results.maps_results.len(),
        elapsed_ms = (elapsed * 1000.0) as u64,
        "POST /api/check-rankings"
    );

    Ok(Json(results))
}
