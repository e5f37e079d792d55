//! Core types shared across the gateway.

use crate::ids::AssetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Watch-completion threshold: a record at or past this ratio counts as done.
pub const DEFAULT_COMPLETION_THRESHOLD: f64 = 0.9;

/// A quality tier of an adaptive stream.
///
/// The bandwidth and resolution attached to each tier are fixed, keeping the
/// bandwidth-to-resolution mapping consistent across every manifest the
/// gateway emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "360p")]
    Q360,
    #[serde(rename = "720p")]
    Q720,
    #[serde(rename = "1080p")]
    Q1080,
}

impl QualityTier {
    /// All tiers, ascending by bitrate. Used when an asset declares none.
    pub const DEFAULT_SET: [QualityTier; 3] = [Self::Q360, Self::Q720, Self::Q1080];

    /// Nominal bandwidth estimate in bits per second.
    #[must_use]
    pub fn bandwidth(self) -> u32 {
        match self {
            Self::Q360 => 800_000,
            Self::Q720 => 2_800_000,
            Self::Q1080 => 5_000_000,
        }
    }

    /// Resolution as (width, height).
    #[must_use]
    pub fn resolution(self) -> (u32, u32) {
        match self {
            Self::Q360 => (640, 360),
            Self::Q720 => (1280, 720),
            Self::Q1080 => (1920, 1080),
        }
    }

    /// Path-segment label ("360p", "720p", "1080p").
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Q360 => "360p",
            Self::Q720 => "720p",
            Self::Q1080 => "1080p",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "360p" => Ok(Self::Q360),
            "720p" => Ok(Self::Q720),
            "1080p" => Ok(Self::Q1080),
            other => Err(format!("unknown quality tier: {other}")),
        }
    }
}

/// Catalog metadata for one streamable asset.
///
/// Loaded from the catalog collaborator once per request and treated as
/// immutable from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub id: AssetId,
    pub title: String,
    /// Locator for progressive playback: a path under the media directory,
    /// or an absolute http(s) URL served by delegation.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Locator for adaptive playback. Presence selects HLS delivery.
    #[serde(default)]
    pub hls_manifest: Option<String>,
    /// Total duration in seconds, when the catalog knows it.
    #[serde(default)]
    pub duration_secs: Option<f64>,
    /// Declared quality tiers; empty means the default tier set.
    #[serde(default)]
    pub tiers: Vec<QualityTier>,
}

impl AssetMetadata {
    /// Whether any playback locator exists at all.
    #[must_use]
    pub fn is_streamable(&self) -> bool {
        self.file_path.is_some() || self.hls_manifest.is_some()
    }

    /// Tiers to advertise: the declared set, or the defaults when empty.
    #[must_use]
    pub fn effective_tiers(&self) -> Vec<QualityTier> {
        if self.tiers.is_empty() {
            QualityTier::DEFAULT_SET.to_vec()
        } else {
            let mut tiers = self.tiers.clone();
            tiers.sort();
            tiers
        }
    }
}

/// Playback position for one (user, asset) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackProgress {
    /// Current position in seconds.
    pub position_secs: f64,
    /// Total duration in seconds; zero until a player reports it.
    pub duration_secs: f64,
    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

impl PlaybackProgress {
    /// A zeroed record, returned when no progress exists yet.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            position_secs: 0.0,
            duration_secs: 0.0,
            updated_at: Utc::now(),
        }
    }

    /// Completion ratio in [0, 1]; zero when the duration is unknown.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.position_secs / self.duration_secs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Whether the record counts as completed for the given threshold.
    #[must_use]
    pub fn is_completed(&self, threshold: f64) -> bool {
        self.ratio() >= threshold
    }
}
