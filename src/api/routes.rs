//! Request handlers.
//!
//! The caller's identity is the opaque `x-user-id` header. Endpoints
//! that read or create analyses require it; asking for another owner's
//! job answers 404, indistinguishable from a missing one.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{
    AnalyzeAccepted, AnalyzeRequest, ListQuery, ListResponse, ResultResponse,
};
use crate::api::server::AppState;
use crate::core::SubmitError;

const USER_ID_HEADER: &str = "x-user-id";

/// Placeholder image served when no durable screenshot exists.
const FALLBACK_SCREENSHOT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="1280" height="720" viewBox="0 0 1280 720">
  <rect width="1280" height="720" fill="#1f2430"/>
  <circle cx="640" cy="330" r="90" fill="#39404f"/>
  <polygon points="615,290 615,370 695,330" fill="#8a93a6"/>
  <text x="640" y="500" text-anchor="middle" font-family="sans-serif" font-size="36" fill="#8a93a6">Preview unavailable</text>
</svg>"##;

fn require_owner(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
        .ok_or_else(|| ApiError::unauthorized("Missing x-user-id header"))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /api/analyze
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<(StatusCode, Json<AnalyzeAccepted>)> {
    let owner = require_owner(&headers)?;

    let job = state
        .orchestrator
        .submit(&request.url, Some(owner))
        .await
        .map_err(|e| match e {
            SubmitError::InvalidUrl(url) => {
                ApiError::bad_request(format!("Not a valid YouTube URL: {}", url))
            }
            SubmitError::Store(store) => store.into(),
        })?;

    Ok((StatusCode::CREATED, Json(AnalyzeAccepted::from_job(&job))))
}

/// GET /api/result/{id}
pub async fn get_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ResultResponse>> {
    let owner = require_owner(&headers)?;

    let job = state.orchestrator.fetch(id, Some(&owner)).await?;
    Ok(Json(ResultResponse::from_job(&job)))
}

/// GET /api/analyses
pub async fn list_analyses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let owner = require_owner(&headers)?;

    let jobs = state.store.list_for_owner(&owner).await?;
    Ok(Json(ListResponse::paginate(&jobs, &query)))
}

/// GET /api/media/audio/{id}
pub async fn get_audio(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let owner = require_owner(&headers)?;

    // Same visibility rule as the result endpoint
    let job = state.orchestrator.fetch(id, Some(&owner)).await?;
    let bytes = state
        .store
        .load_audio(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No audio stored for analysis {}", id)))?;

    let headers = [
        (header::CONTENT_TYPE, job.audio_mime_type),
        (header::CONTENT_LENGTH, bytes.len().to_string()),
        (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
    ];

    Ok((headers, bytes).into_response())
}

/// GET /api/media/fallback-screenshot
pub async fn fallback_screenshot() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        FALLBACK_SCREENSHOT_SVG,
    )
}
