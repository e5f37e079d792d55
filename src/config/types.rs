use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use streamgate_common::{AssetMetadata, UserId};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    /// Demo catalog entries served by the in-memory collaborator.
    #[serde(default)]
    pub assets: Vec<AssetMetadata>,

    /// Demo user entries served by the in-memory collaborator.
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// External base URL embedded into manifests and stream URLs.
    /// Defaults to `http://{host}:{port}` when unset.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Directory that relative asset file paths resolve against.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_media_dir() -> PathBuf {
    PathBuf::from("./media")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            media_dir: default_media_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Stream token lifetime in hours (default: 4)
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    /// How often the background expiry sweep runs, in seconds (default: 60)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Largest span served per range request, in bytes (default: 4 MiB)
    #[serde(default = "default_chunk_cap")]
    pub chunk_cap_bytes: u64,

    /// Read-unit size for streamed bodies, in bytes (default: 8 KiB)
    #[serde(default = "default_read_unit")]
    pub read_unit_bytes: usize,

    /// Fixed HLS segment duration in seconds (default: 10)
    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u32,

    /// Segment count when the asset duration is unknown (default: 10)
    #[serde(default = "default_fallback_segment_count")]
    pub fallback_segment_count: u32,

    /// Completion ratio at which a record leaves "continue watching"
    /// (default: 0.9)
    #[serde(default = "default_completion_threshold")]
    pub completion_threshold: f64,
}

fn default_token_ttl_hours() -> u64 {
    4
}
fn default_sweep_interval() -> u64 {
    60
}
fn default_chunk_cap() -> u64 {
    4 * 1024 * 1024
}
fn default_read_unit() -> usize {
    8192
}
fn default_segment_duration() -> u32 {
    10
}
fn default_fallback_segment_count() -> u32 {
    10
}
fn default_completion_threshold() -> f64 {
    streamgate_common::types::DEFAULT_COMPLETION_THRESHOLD
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
            sweep_interval_secs: default_sweep_interval(),
            chunk_cap_bytes: default_chunk_cap(),
            read_unit_bytes: default_read_unit(),
            segment_duration_secs: default_segment_duration(),
            fallback_segment_count: default_fallback_segment_count(),
            completion_threshold: default_completion_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub id: UserId,

    /// Bearer credential presented on token issuance and user-scoped routes.
    pub api_key: String,

    /// Asset ids this user is entitled to; unset means all assets.
    #[serde(default)]
    pub entitled_assets: Option<Vec<i64>>,
}
