use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{
    error::ApiError,
    models::{HealthResponse, HelloResponse, MediaListResponse},
    state::AppState,
    utils::relay_stream,
    validation::parse_id_list,
};
use crate::countdown::{self, Countdown};
use crate::upstream::{MediaKind, VideoView};

/// Plain-text greeting (GET /)
pub async fn root() -> &'static str {
    "Hello FastAPI"
}

/// Health check endpoint (GET /health)
///
/// Only reports that the process is up; upstreams are not probed.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Static multilingual greeting (GET /api/hello)
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse::default())
}

/// Every document of the configured collection (GET /api/firebasefood)
///
/// The body is keyed by the collection name: `{"myvue3food": [...]}`.
pub async fn firebase_food(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let documents = state.documents.fetch_all().await?;
    info!(collection = state.documents.collection(), count = documents.len(), "Documents fetched");

    let records = documents.into_iter().map(Value::Object).collect();
    let mut body = Map::new();
    body.insert(state.documents.collection().to_string(), Value::Array(records));

    Ok(Json(Value::Object(body)))
}

/// Channel lookup (GET /api/youtube/channel/{ids})
pub async fn youtube_channels(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> Result<Json<MediaListResponse>, ApiError> {
    lookup_media(&state, MediaKind::Channel, &ids).await
}

/// Video lookup (GET /api/youtube/videos/{ids})
pub async fn youtube_videos(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> Result<Json<MediaListResponse>, ApiError> {
    lookup_media(&state, MediaKind::Video, &ids).await
}

/// Validates the id list, then issues a single batched upstream call
async fn lookup_media(
    state: &AppState,
    kind: MediaKind,
    raw_ids: &str,
) -> Result<Json<MediaListResponse>, ApiError> {
    let ids = parse_id_list(raw_ids).map_err(|source| ApiError::InvalidIdList { kind, source })?;

    let items = state
        .youtube
        .lookup(kind, &ids)
        .await
        .map_err(|source| ApiError::Youtube { kind, source })?;

    if items.is_empty() {
        return Err(ApiError::NotFound(kind));
    }

    Ok(Json(MediaListResponse {
        count: items.len(),
        items,
    }))
}

/// Countdown to a slug-encoded UTC+8 time (GET /api/countdown/{slug})
pub async fn countdown(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Countdown>, ApiError> {
    compute_countdown(&state, &slug)
}

/// `GET /api/countdown/` carries an empty slug
pub async fn countdown_empty(State(state): State<AppState>) -> Result<Json<Countdown>, ApiError> {
    compute_countdown(&state, "")
}

fn compute_countdown(state: &AppState, slug: &str) -> Result<Json<Countdown>, ApiError> {
    let result = countdown::compute(slug, state.clock.as_ref())?;
    debug!(slug, diff_ms = result.diff_ms, "Countdown computed");
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ProxyImageQuery {
    pub url: String,
}

/// Image relay for the Bilibili CDN (GET /api/bilibili/proxyimg?url=)
pub async fn bilibili_proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ProxyImageQuery>,
) -> Result<Response, ApiError> {
    let upstream = state
        .bilibili
        .fetch_image(&query.url)
        .await
        .map_err(ApiError::ImageProxy)?;

    Ok(relay_stream(upstream))
}

/// Video metadata (GET /api/bilibili/{bvid})
pub async fn bilibili_video(
    State(state): State<AppState>,
    Path(bvid): Path<String>,
) -> Result<Json<VideoView>, ApiError> {
    let view = state
        .bilibili
        .video_view(&bvid)
        .await
        .map_err(ApiError::Bilibili)?;

    Ok(Json(view))
}
