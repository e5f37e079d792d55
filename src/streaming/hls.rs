//! HLS manifest and segment handlers.
//!
//! Serves the master playlist, per-tier variant playlists, and synthesized
//! segments. Every URL embedded in a playlist carries the validated caller
//! token verbatim; the handlers never mint tokens.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use streamgate_common::{Error, QualityTier};
use streamgate_media::{segment_count, segment_payload, ManifestBuilder};

use crate::server::guard::{self, TokenQuery};
use crate::server::{ApiError, AppContext};

const M3U8_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Serve the master playlist: one variant entry per quality tier.
pub async fn master_manifest(
    State(ctx): State<AppContext>,
    Path(asset_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<Response, ApiError> {
    let asset_id = guard::parse_asset_id(&asset_id)?;
    guard::authorize_stream(&ctx, query.token.as_deref(), asset_id)?;
    let token = query.token.unwrap_or_default();

    let asset = ctx
        .catalog
        .get_asset(asset_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("asset {asset_id}")))?;

    let playlist = ManifestBuilder::new(ctx.base_url(), token).master(&asset);

    playlist_response(playlist)
}

/// Serve the variant playlist for one quality tier.
pub async fn variant_manifest(
    State(ctx): State<AppContext>,
    Path((asset_id, quality)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Response, ApiError> {
    let asset_id = guard::parse_asset_id(&asset_id)?;
    guard::authorize_stream(&ctx, query.token.as_deref(), asset_id)?;
    let token = query.token.unwrap_or_default();

    let quality: QualityTier = quality
        .parse()
        .map_err(|_| Error::not_found(format!("quality {quality}")))?;

    let asset = ctx
        .catalog
        .get_asset(asset_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("asset {asset_id}")))?;

    let playlist = ManifestBuilder::new(ctx.base_url(), token).variant(
        &asset,
        quality,
        ctx.config.streaming.segment_duration_secs,
        ctx.config.streaming.fallback_segment_count,
    );

    playlist_response(playlist)
}

/// Serve one synthesized media segment.
pub async fn media_segment(
    State(ctx): State<AppContext>,
    Path((asset_id, quality, segment_index)): Path<(String, String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Response, ApiError> {
    let asset_id = guard::parse_asset_id(&asset_id)?;
    guard::authorize_stream(&ctx, query.token.as_deref(), asset_id)?;

    let quality: QualityTier = quality
        .parse()
        .map_err(|_| Error::not_found(format!("quality {quality}")))?;

    // Accept a bare index or one with a .ts extension.
    let index: u32 = segment_index
        .trim_end_matches(".ts")
        .parse()
        .map_err(|_| Error::not_found(format!("segment {segment_index}")))?;

    let asset = ctx
        .catalog
        .get_asset(asset_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("asset {asset_id}")))?;

    let count = segment_count(
        asset.duration_secs,
        ctx.config.streaming.segment_duration_secs,
        ctx.config.streaming.fallback_segment_count,
    );
    if index >= count {
        return Err(Error::not_found(format!("segment {index}")).into());
    }

    let payload = segment_payload(asset_id, quality, index);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp2t")
        .header(header::CONTENT_LENGTH, payload.len().to_string())
        .body(Body::from(payload))
        .map_err(|e| ApiError::from(Error::internal(e.to_string())))
}

fn playlist_response(playlist: String) -> Result<Response, ApiError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, M3U8_CONTENT_TYPE)
        // Playlists embed capability tokens; keep them out of shared caches.
        .header(header::CACHE_CONTROL, "private, max-age=60")
        .body(Body::from(playlist))
        .map_err(|e| ApiError::from(Error::internal(e.to_string())))
}
