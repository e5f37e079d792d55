//! Media streaming module.
//!
//! The gateway's core: token authority, adaptive (HLS) delivery, progressive
//! range delivery, and playback progress tracking.
//!
//! # Routes
//!
//! Token-guarded streaming routes (`?token=` required on each):
//! - `GET /stream/{asset_id}` - Progressive stream with range support
//! - `GET /stream/{asset_id}/manifest` - Master playlist
//! - `GET /stream/{asset_id}/{quality}/manifest` - Variant playlist
//! - `GET /stream/{asset_id}/{quality}/{index}` - Media segment

mod direct;
mod hls;
mod progress;
mod tokens;

pub use direct::{parse_range, serve_file, stream_asset, ByteRange, RangeError};
pub use hls::{master_manifest, media_segment, variant_manifest};
pub use progress::ProgressTracker;
pub use tokens::{start_sweep_task, TokenAuthority, TokenClaims, TokenStats};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create the token-guarded streaming router, nested under `/stream`.
pub fn stream_router() -> Router<AppContext> {
    Router::new()
        .route("/:asset_id", get(stream_asset))
        .route("/:asset_id/manifest", get(master_manifest))
        .route("/:asset_id/:quality/manifest", get(variant_manifest))
        .route("/:asset_id/:quality/:segment_index", get(media_segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_router_creation() {
        let _router: Router<AppContext> = stream_router();
    }
}
