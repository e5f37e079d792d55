//! Shared test harness: an in-memory catalog plus a real server on an
//! ephemeral port, driven over HTTP with reqwest.
#![allow(dead_code)]

use std::net::SocketAddr;

use streamgate::config::{Config, UserConfig};
use streamgate::server::{create_router, AppContext};
use streamgate_common::{AssetId, AssetMetadata, QualityTier, UserId};

/// Bearer key for the user entitled to the whole catalog.
pub const ALICE_KEY: &str = "alice-key";
/// Bearer key for the user entitled to asset 1 only.
pub const BOB_KEY: &str = "bob-key";

pub const ALICE: UserId = UserId::new(3);
pub const BOB: UserId = UserId::new(4);

/// Direct asset backed by a real 2048-byte file.
pub const DIRECT_ASSET: AssetId = AssetId::new(1);
/// Adaptive asset, 596 seconds long.
pub const HLS_ASSET: AssetId = AssetId::new(2);
/// Asset whose locator is a remote absolute URL.
pub const REMOTE_ASSET: AssetId = AssetId::new(3);
/// Asset with no playback locator at all.
pub const BARE_ASSET: AssetId = AssetId::new(4);

pub const DIRECT_FILE_SIZE: usize = 2048;

pub struct TestHarness {
    pub ctx: AppContext,
    _media_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Start a gateway on an ephemeral port and return it with its address.
    pub async fn with_server() -> (TestHarness, SocketAddr) {
        let media_dir = tempfile::tempdir().unwrap();

        let video_data: Vec<u8> = (0..=255u8).cycle().take(DIRECT_FILE_SIZE).collect();
        std::fs::write(media_dir.path().join("feature.mp4"), &video_data).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = addr.port();
        config.server.media_dir = media_dir.path().to_path_buf();
        config.assets = seed_assets();
        config.users = seed_users();

        let ctx = AppContext::from_config(config);
        let app = create_router(ctx.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (
            TestHarness {
                ctx,
                _media_dir: media_dir,
            },
            addr,
        )
    }

    /// Issue a stream token over HTTP with the given bearer key.
    pub async fn issue_token(
        &self,
        addr: SocketAddr,
        asset: AssetId,
        api_key: &str,
    ) -> serde_json::Value {
        let resp = reqwest::Client::new()
            .get(format!("http://{addr}/stream/{asset}/token"))
            .bearer_auth(api_key)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "token issuance failed");
        resp.json().await.unwrap()
    }

    /// Shorthand: mint for Alice and return just the token string.
    pub async fn mint_for_alice(&self, addr: SocketAddr, asset: AssetId) -> String {
        let grant = self.issue_token(addr, asset, ALICE_KEY).await;
        grant["token"].as_str().unwrap().to_string()
    }
}

fn seed_assets() -> Vec<AssetMetadata> {
    vec![
        AssetMetadata {
            id: DIRECT_ASSET,
            title: "Direct Feature".into(),
            file_path: Some("feature.mp4".into()),
            hls_manifest: None,
            duration_secs: Some(120.0),
            tiers: Vec::new(),
        },
        AssetMetadata {
            id: HLS_ASSET,
            title: "Adaptive Feature".into(),
            file_path: None,
            hls_manifest: Some("hls/2".into()),
            duration_secs: Some(596.0),
            tiers: Vec::new(),
        },
        AssetMetadata {
            id: REMOTE_ASSET,
            title: "Remote Feature".into(),
            file_path: Some("https://cdn.example.com/remote.mp4".into()),
            hls_manifest: None,
            duration_secs: None,
            tiers: Vec::new(),
        },
        AssetMetadata {
            id: BARE_ASSET,
            title: "Bare Metadata".into(),
            file_path: None,
            hls_manifest: None,
            duration_secs: None,
            tiers: vec![QualityTier::Q720],
        },
    ]
}

fn seed_users() -> Vec<UserConfig> {
    vec![
        UserConfig {
            id: ALICE,
            api_key: ALICE_KEY.into(),
            entitled_assets: None,
        },
        UserConfig {
            id: BOB,
            api_key: BOB_KEY.into(),
            entitled_assets: Some(vec![DIRECT_ASSET.value()]),
        },
    ]
}
