//! Playback API routes.
//!
//! Token issuance, progress reporting, the continue-watching view, and
//! streaming diagnostics.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeader,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use streamgate_common::{AssetMetadata, Error, PlaybackProgress};

use super::guard::{self, TokenQuery};
use super::{ApiError, AppContext};

/// Create playback routes.
pub fn playback_routes() -> Router<AppContext> {
    Router::new()
        .route("/stream/:asset_id/token", get(issue_token))
        .route(
            "/stream/:asset_id/progress",
            get(get_progress).post(update_progress),
        )
        .route("/continue-watching", get(continue_watching))
        .route("/streaming-stats", get(streaming_stats))
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Hls,
    Direct,
}

#[derive(Debug, Serialize)]
pub struct TokenGrantResponse {
    pub token: String,
    pub stream_url: String,
    pub stream_type: StreamType,
    pub asset: AssetMetadata,
    pub progress: ProgressResponse,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub position: f64,
    #[serde(default)]
    pub total_duration: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub position: f64,
    pub total_duration: f64,
    pub ratio: f64,
    pub completed: bool,
    pub updated_at: chrono::DateTime<Utc>,
}

impl ProgressResponse {
    fn from_record(record: &PlaybackProgress, completion_threshold: f64) -> Self {
        Self {
            position: record.position_secs,
            total_duration: record.duration_secs,
            ratio: record.ratio(),
            completed: record.is_completed(completion_threshold),
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContinueWatchingEntry {
    pub asset: AssetMetadata,
    pub progress: ProgressResponse,
}

#[derive(Debug, Serialize)]
pub struct StreamingStatsResponse {
    pub active_tokens: usize,
    pub distinct_users: usize,
    pub server_time: chrono::DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Issue a stream token for an asset the caller is entitled to.
async fn issue_token(
    State(ctx): State<AppContext>,
    Path(asset_id): Path<String>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<impl IntoResponse, ApiError> {
    let asset_id = guard::parse_asset_id(&asset_id)?;
    let credential = bearer.as_ref().map(|b| b.token());
    let user = guard::require_user(&ctx, credential).await?;

    let asset = ctx
        .catalog
        .get_asset(asset_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("asset {asset_id}")))?;

    if !asset.is_streamable() {
        return Err(Error::not_found("streaming not available for this asset").into());
    }

    if !ctx.entitlements.is_entitled(user, asset_id).await? {
        return Err(Error::Unauthorized.into());
    }

    let token = ctx.tokens.mint(asset_id, user);

    let (stream_type, stream_url) = if asset.hls_manifest.is_some() {
        (
            StreamType::Hls,
            format!("{}/stream/{}/manifest?token={}", ctx.base_url(), asset_id, token),
        )
    } else {
        (
            StreamType::Direct,
            format!("{}/stream/{}?token={}", ctx.base_url(), asset_id, token),
        )
    };

    // A playback session always has a progress record to report against.
    let record = ctx.progress.ensure(user, asset_id);
    let progress =
        ProgressResponse::from_record(&record, ctx.config.streaming.completion_threshold);

    Ok(Json(TokenGrantResponse {
        token,
        stream_url,
        stream_type,
        asset,
        progress,
    }))
}

/// Record the caller's playback position for an asset.
async fn update_progress(
    State(ctx): State<AppContext>,
    Path(asset_id): Path<String>,
    Query(query): Query<TokenQuery>,
    Json(req): Json<ProgressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let asset_id = guard::parse_asset_id(&asset_id)?;
    let claims = guard::authorize_stream(&ctx, query.token.as_deref(), asset_id)?;

    let record = ctx
        .progress
        .update(claims.user_id, asset_id, req.position, req.total_duration);

    Ok(Json(ProgressResponse::from_record(
        &record,
        ctx.config.streaming.completion_threshold,
    )))
}

/// Report the caller's playback position, or a zeroed default.
async fn get_progress(
    State(ctx): State<AppContext>,
    Path(asset_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let asset_id = guard::parse_asset_id(&asset_id)?;
    let claims = guard::authorize_stream(&ctx, query.token.as_deref(), asset_id)?;

    let record = ctx
        .progress
        .get(claims.user_id, asset_id)
        .unwrap_or_else(PlaybackProgress::zeroed);

    Ok(Json(ProgressResponse::from_record(
        &record,
        ctx.config.streaming.completion_threshold,
    )))
}

/// Unfinished assets for the caller, most recently watched first.
async fn continue_watching(
    State(ctx): State<AppContext>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = bearer.as_ref().map(|b| b.token());
    let user = guard::require_user(&ctx, credential).await?;

    let mut entries = Vec::new();
    for (asset_id, record) in ctx.progress.list_recent(user, 10) {
        // Records for assets the catalog no longer knows are skipped.
        if let Some(asset) = ctx.catalog.get_asset(asset_id).await? {
            entries.push(ContinueWatchingEntry {
                asset,
                progress: ProgressResponse::from_record(
                    &record,
                    ctx.config.streaming.completion_threshold,
                ),
            });
        }
    }

    Ok(Json(entries))
}

/// Streaming diagnostics, sweeping expired tokens first.
async fn streaming_stats(
    State(ctx): State<AppContext>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = bearer.as_ref().map(|b| b.token());
    guard::require_user(&ctx, credential).await?;

    ctx.tokens.sweep_expired(Utc::now());
    let stats = ctx.tokens.stats();

    Ok(Json(StreamingStatsResponse {
        active_tokens: stats.active_tokens,
        distinct_users: stats.distinct_users,
        server_time: Utc::now(),
    }))
}
