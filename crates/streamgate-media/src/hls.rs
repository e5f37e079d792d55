//! HLS playlist generation.
//!
//! Generates M3U8 playlists for token-guarded adaptive playback. Every URL a
//! playlist references carries the caller's stream token verbatim as a query
//! parameter; this module never mints tokens, it only propagates the one it
//! was given.

use std::fmt::Write;

use streamgate_common::{AssetMetadata, QualityTier};

/// M3U8 playlist generator for one authorized playback session.
#[derive(Debug)]
pub struct ManifestBuilder {
    /// Base URL prefixed to every emitted URI.
    base_url: String,
    /// Stream token attached to every emitted URI.
    token: String,
}

impl ManifestBuilder {
    /// Create a new builder for the given base URL and stream token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token: token.into(),
        }
    }

    /// Generate the master playlist: one variant entry per quality tier the
    /// asset declares (or the default tier set), ascending by bitrate.
    pub fn master(&self, asset: &AssetMetadata) -> String {
        let mut playlist = String::new();

        writeln!(playlist, "#EXTM3U").unwrap();
        writeln!(playlist, "#EXT-X-VERSION:3").unwrap();

        for tier in asset.effective_tiers() {
            let (width, height) = tier.resolution();
            writeln!(
                playlist,
                "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{}",
                tier.bandwidth(),
                width,
                height
            )
            .unwrap();
            writeln!(
                playlist,
                "{}/stream/{}/{}/manifest?token={}",
                self.base_url, asset.id, tier, self.token
            )
            .unwrap();
        }

        playlist
    }

    /// Generate the variant playlist for one quality tier: a fixed-duration
    /// segment list terminated with an explicit end-of-list marker.
    ///
    /// The segment count derives from the asset duration when known,
    /// otherwise `fallback_count` is used.
    pub fn variant(
        &self,
        asset: &AssetMetadata,
        quality: QualityTier,
        segment_duration_secs: u32,
        fallback_count: u32,
    ) -> String {
        let count = segment_count(asset.duration_secs, segment_duration_secs, fallback_count);

        let mut playlist = String::new();
        writeln!(playlist, "#EXTM3U").unwrap();
        writeln!(playlist, "#EXT-X-VERSION:3").unwrap();
        writeln!(playlist, "#EXT-X-TARGETDURATION:{segment_duration_secs}").unwrap();
        writeln!(playlist, "#EXT-X-MEDIA-SEQUENCE:0").unwrap();
        writeln!(playlist, "#EXT-X-PLAYLIST-TYPE:VOD").unwrap();

        for index in 0..count {
            writeln!(playlist, "#EXTINF:{segment_duration_secs}.0,").unwrap();
            writeln!(
                playlist,
                "{}/stream/{}/{}/{}?token={}",
                self.base_url, asset.id, quality, index, self.token
            )
            .unwrap();
        }

        writeln!(playlist, "#EXT-X-ENDLIST").unwrap();

        playlist
    }
}

/// Number of fixed-duration segments covering `duration_secs`.
///
/// `ceil(duration / segment_duration)` when the duration is known and
/// positive, otherwise `fallback_count`.
#[must_use]
pub fn segment_count(
    duration_secs: Option<f64>,
    segment_duration_secs: u32,
    fallback_count: u32,
) -> u32 {
    match duration_secs {
        Some(d) if d > 0.0 && segment_duration_secs > 0 => {
            (d / f64::from(segment_duration_secs)).ceil() as u32
        }
        _ => fallback_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamgate_common::AssetId;

    fn asset(duration: Option<f64>, tiers: Vec<QualityTier>) -> AssetMetadata {
        AssetMetadata {
            id: AssetId::new(7),
            title: "Test Feature".into(),
            file_path: None,
            hls_manifest: Some("hls/7".into()),
            duration_secs: duration,
            tiers,
        }
    }

    #[test]
    fn test_segment_count_ceil() {
        assert_eq!(segment_count(Some(596.0), 10, 10), 60);
        assert_eq!(segment_count(Some(600.0), 10, 10), 60);
        assert_eq!(segment_count(Some(601.0), 10, 10), 61);
    }

    #[test]
    fn test_segment_count_fallback() {
        assert_eq!(segment_count(None, 10, 10), 10);
        assert_eq!(segment_count(Some(0.0), 10, 10), 10);
    }

    #[test]
    fn test_master_playlist_default_tiers() {
        let builder = ManifestBuilder::new("http://localhost:8080", "tok123");
        let playlist = builder.master(&asset(Some(596.0), Vec::new()));

        assert!(playlist.starts_with("#EXTM3U\n"));
        assert!(playlist.contains("BANDWIDTH=800000,RESOLUTION=640x360"));
        assert!(playlist.contains("BANDWIDTH=2800000,RESOLUTION=1280x720"));
        assert!(playlist.contains("BANDWIDTH=5000000,RESOLUTION=1920x1080"));
        assert!(playlist.contains("http://localhost:8080/stream/7/720p/manifest?token=tok123"));
    }

    #[test]
    fn test_master_playlist_declared_tiers_only() {
        let builder = ManifestBuilder::new("http://localhost:8080", "tok123");
        let playlist = builder.master(&asset(None, vec![QualityTier::Q720]));

        assert!(playlist.contains("720p"));
        assert!(!playlist.contains("360p"));
        assert!(!playlist.contains("1080p"));
    }

    #[test]
    fn test_master_token_propagated_to_every_uri() {
        let builder = ManifestBuilder::new("http://localhost:8080", "secret-token");
        let playlist = builder.master(&asset(None, Vec::new()));

        let uri_lines: Vec<&str> = playlist
            .lines()
            .filter(|l| !l.starts_with('#') && !l.is_empty())
            .collect();
        assert_eq!(uri_lines.len(), 3);
        assert!(uri_lines.iter().all(|l| l.ends_with("token=secret-token")));
    }

    #[test]
    fn test_variant_playlist_596s_has_60_segments() {
        let builder = ManifestBuilder::new("http://localhost:8080", "tok");
        let playlist = builder.variant(&asset(Some(596.0), Vec::new()), QualityTier::Q720, 10, 10);

        let segment_lines: Vec<&str> = playlist
            .lines()
            .filter(|l| !l.starts_with('#') && !l.is_empty())
            .collect();
        assert_eq!(segment_lines.len(), 60);
        assert!(segment_lines[59].contains("/stream/7/720p/59?token=tok"));
        assert!(playlist.trim_end().ends_with("#EXT-X-ENDLIST"));
    }

    #[test]
    fn test_variant_playlist_headers() {
        let builder = ManifestBuilder::new("http://localhost:8080/", "tok");
        let playlist = builder.variant(&asset(None, Vec::new()), QualityTier::Q360, 10, 10);

        assert!(playlist.contains("#EXT-X-TARGETDURATION:10"));
        assert!(playlist.contains("#EXT-X-MEDIA-SEQUENCE:0"));
        assert!(playlist.contains("#EXT-X-PLAYLIST-TYPE:VOD"));
        // Trailing slash on the base URL must not double up.
        assert!(playlist.contains("http://localhost:8080/stream/7/360p/0?token=tok"));
    }
}
