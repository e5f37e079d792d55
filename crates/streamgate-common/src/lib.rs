//! Streamgate-Common: shared types used across the gateway.
//!
//! - **Typed IDs**: wrappers for asset and user identifiers
//! - **Core types**: quality tiers, asset metadata, playback progress
//! - **Error handling**: the gateway error taxonomy and result alias

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::{AssetId, UserId};
pub use types::{AssetMetadata, PlaybackProgress, QualityTier};
