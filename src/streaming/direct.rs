//! Progressive streaming with HTTP range requests.
//!
//! Serves a single asset as a byte-range-seekable download. Served spans are
//! capped at a configurable chunk size so one request cannot monopolize a
//! connection; a client consumes a large asset by issuing successive range
//! requests, each advancing `start` past the previous `end + 1`.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::io::SeekFrom;
use streamgate_common::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::server::guard::{self, TokenQuery};
use crate::server::{ApiError, AppContext};

/// A resolved inclusive byte interval within a known-length resource.
///
/// Invariant: `0 <= start <= end <= size - 1` for the size it was resolved
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes the range covers.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A resolved range always covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Why a Range header could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Syntax the parser does not accept, including `start > end`.
    Malformed,
    /// Well-formed but wholly outside `[0, size - 1]`.
    Unsatisfiable,
}

/// Parse an HTTP Range header against a resource of `size` bytes.
///
/// Accepts a single `bytes=` specifier:
/// - `bytes=0-499`
/// - `bytes=500-` (to end of resource)
/// - `bytes=-500` (last 500 bytes)
///
/// An `end` past the resource is clamped to `size - 1`. A specifier with
/// `start > end` is rejected as malformed rather than silently coerced,
/// and `start >= size` is unsatisfiable. Multi-range specifiers are not
/// supported.
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange, RangeError> {
    let spec = header.strip_prefix("bytes=").ok_or(RangeError::Malformed)?;
    if spec.contains(',') {
        return Err(RangeError::Malformed);
    }

    let (start, end) = spec.split_once('-').ok_or(RangeError::Malformed)?;
    let start = start.trim();
    let end = end.trim();

    match (start.is_empty(), end.is_empty()) {
        // bytes=-500 (last 500 bytes)
        (true, false) => {
            let suffix_len: u64 = end.parse().map_err(|_| RangeError::Malformed)?;
            if suffix_len == 0 || size == 0 {
                return Err(RangeError::Unsatisfiable);
            }
            Ok(ByteRange {
                start: size.saturating_sub(suffix_len),
                end: size - 1,
            })
        }
        // bytes=500- (from 500 to end)
        (false, true) => {
            let start: u64 = start.parse().map_err(|_| RangeError::Malformed)?;
            if start >= size {
                return Err(RangeError::Unsatisfiable);
            }
            Ok(ByteRange {
                start,
                end: size - 1,
            })
        }
        // bytes=0-499
        (false, false) => {
            let start: u64 = start.parse().map_err(|_| RangeError::Malformed)?;
            let end: u64 = end.parse().map_err(|_| RangeError::Malformed)?;
            if start > end {
                return Err(RangeError::Malformed);
            }
            if start >= size {
                return Err(RangeError::Unsatisfiable);
            }
            Ok(ByteRange {
                start,
                end: end.min(size - 1),
            })
        }
        // bytes=- (invalid)
        (true, true) => Err(RangeError::Malformed),
    }
}

/// Serve the progressive stream for an asset, honoring the Range header.
pub async fn stream_asset(
    State(ctx): State<AppContext>,
    Path(asset_id): Path<String>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let asset_id = guard::parse_asset_id(&asset_id)?;
    guard::authorize_stream(&ctx, query.token.as_deref(), asset_id)?;

    let asset = ctx
        .catalog
        .get_asset(asset_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("asset {asset_id}")))?;

    let locator = asset
        .file_path
        .as_deref()
        .ok_or_else(|| Error::not_found("progressive streaming not available"))?;

    // Remote locators are delegated, never proxied.
    if locator.starts_with("http://") || locator.starts_with("https://") {
        return Ok(Json(serde_json::json!({
            "stream_url": locator,
            "type": "redirect",
        }))
        .into_response());
    }

    let path = ctx.config.server.media_dir.join(locator);
    let range_header = headers.get(header::RANGE).and_then(|h| h.to_str().ok());

    let response = serve_file(
        &path,
        range_header,
        ctx.config.streaming.chunk_cap_bytes,
        ctx.config.streaming.read_unit_bytes,
    )
    .await?;
    Ok(response)
}

/// Serve a local file, honoring an optional Range header.
///
/// The file handle is owned by the response body stream and is released when
/// the body is fully consumed or the client disconnects early.
pub async fn serve_file(
    path: &std::path::Path,
    range_header: Option<&str>,
    chunk_cap: u64,
    read_unit: usize,
) -> Result<Response, Error> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::upstream(format!("{}: {e}", path.display())))?;
    let size = metadata.len();
    let content_type = content_type_for(path);

    match range_header {
        Some(spec) => {
            let range =
                parse_range(spec, size).map_err(|_| Error::InvalidRange { size })?;

            // Cap the served span even if the client asked for more.
            let end = range.end.min(range.start + chunk_cap - 1);
            let length = end - range.start + 1;

            let mut file = File::open(path)
                .await
                .map_err(|e| Error::upstream(format!("{}: {e}", path.display())))?;
            file.seek(SeekFrom::Start(range.start)).await?;

            let stream = ReaderStream::with_capacity(file.take(length), read_unit);
            let body = Body::from_stream(stream);

            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, length.to_string())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", range.start, end, size),
                )
                .header(header::ACCEPT_RANGES, "bytes")
                .body(body)
                .map_err(|e| Error::internal(e.to_string()))
        }
        None => {
            let file = File::open(path)
                .await
                .map_err(|e| Error::upstream(format!("{}: {e}", path.display())))?;

            let stream = ReaderStream::with_capacity(file, read_unit);
            let body = Body::from_stream(stream);

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, size.to_string())
                .header(header::ACCEPT_RANGES, "bytes")
                .body(body)
                .map_err(|e| Error::internal(e.to_string()))
        }
    }
}

/// Determine content type from the file extension.
fn content_type_for(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "ts" | "m2ts" => "video/mp2t",
        _ => "application/octet-stream",
    }
}
