mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = ["./config.toml", "./streamgate.toml", "/etc/streamgate/config.toml"];

    for path_str in default_paths {
        let path = Path::new(path_str);
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    let s = &config.streaming;
    if s.token_ttl_hours == 0 {
        anyhow::bail!("Token TTL must be at least one hour");
    }
    if s.chunk_cap_bytes == 0 || s.read_unit_bytes == 0 {
        anyhow::bail!("Chunk cap and read unit must be non-zero");
    }
    if s.segment_duration_secs == 0 || s.fallback_segment_count == 0 {
        anyhow::bail!("Segment duration and fallback count must be non-zero");
    }
    if !(0.0..=1.0).contains(&s.completion_threshold) || s.completion_threshold == 0.0 {
        anyhow::bail!("Completion threshold must be in (0, 1]");
    }

    let mut seen_assets = std::collections::HashSet::new();
    for asset in &config.assets {
        if !seen_assets.insert(asset.id) {
            anyhow::bail!("Duplicate asset id in catalog: {}", asset.id);
        }
    }

    let mut seen_users = std::collections::HashSet::new();
    for user in &config.users {
        if user.api_key.is_empty() {
            anyhow::bail!("User {} has an empty API key", user.id);
        }
        if !seen_users.insert(user.id) {
            anyhow::bail!("Duplicate user id: {}", user.id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamgate_common::{AssetId, UserId};

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [server]
            host = "127.0.0.1"
            port = 9090
            media_dir = "/srv/media"

            [streaming]
            token_ttl_hours = 2
            chunk_cap_bytes = 1048576
            completion_threshold = 0.85

            [[assets]]
            id = 1
            title = "Big Buck Bunny"
            file_path = "bunny.mp4"
            duration_secs = 596.0

            [[assets]]
            id = 2
            title = "Sintel"
            hls_manifest = "hls/sintel"
            tiers = ["360p", "720p"]

            [[users]]
            id = 3
            api_key = "dev-key"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        validate_config(&config).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.streaming.token_ttl_hours, 2);
        assert_eq!(config.streaming.chunk_cap_bytes, 1_048_576);
        assert_eq!(config.assets.len(), 2);
        assert_eq!(config.assets[0].id, AssetId::new(1));
        assert_eq!(config.assets[1].tiers.len(), 2);
        assert_eq!(config.users[0].id, UserId::new(3));
        // Unspecified fields keep their defaults.
        assert_eq!(config.streaming.read_unit_bytes, 8192);
        assert_eq!(config.streaming.segment_duration_secs, 10);
    }

    #[test]
    fn test_rejects_duplicate_asset_ids() {
        let toml_str = r#"
            [[assets]]
            id = 1
            title = "A"

            [[assets]]
            id = 1
            title = "B"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_empty_api_key() {
        let toml_str = r#"
            [[users]]
            id = 1
            api_key = ""
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let mut config = Config::default();
        config.streaming.completion_threshold = 1.5;
        assert!(validate_config(&config).is_err());
    }
}
