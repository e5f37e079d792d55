//! The external catalog/entitlement collaborator seam.
//!
//! The surrounding application owns users, catalog records, and entitlement
//! decisions. The gateway talks to it through the [`Catalog`] and
//! [`Entitlements`] traits so a networked backend is a substitution, not a
//! rewrite. [`MemoryCatalog`] is the in-process implementation seeded from
//! config, used by the demo binary and the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use streamgate_common::{AssetId, AssetMetadata, Result, UserId};

use crate::config::{Config, UserConfig};

/// Read-only asset lookup against the surrounding application's catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch metadata for one asset, or `None` when the catalog has no
    /// record for the id.
    async fn get_asset(&self, id: AssetId) -> Result<Option<AssetMetadata>>;
}

/// Authentication and entitlement decisions, delegated entirely to the
/// surrounding application.
#[async_trait]
pub trait Entitlements: Send + Sync {
    /// Resolve a bearer credential to a user, or `None` when it is unknown.
    async fn authenticate(&self, credential: &str) -> Result<Option<UserId>>;

    /// Whether the user may access the asset at all. Distinct from holding
    /// a valid stream token.
    async fn is_entitled(&self, user: UserId, asset: AssetId) -> Result<bool>;
}

/// In-memory collaborator seeded from config.
pub struct MemoryCatalog {
    assets: HashMap<AssetId, AssetMetadata>,
    users_by_key: HashMap<String, UserConfig>,
}

impl MemoryCatalog {
    pub fn from_config(config: &Config) -> Self {
        let assets = config
            .assets
            .iter()
            .map(|a| (a.id, a.clone()))
            .collect();
        let users_by_key = config
            .users
            .iter()
            .map(|u| (u.api_key.clone(), u.clone()))
            .collect();
        Self {
            assets,
            users_by_key,
        }
    }

    /// Build a catalog directly from records, bypassing config. Used by
    /// tests and embedders.
    pub fn new(assets: Vec<AssetMetadata>, users: Vec<UserConfig>) -> Self {
        Self {
            assets: assets.into_iter().map(|a| (a.id, a)).collect(),
            users_by_key: users.into_iter().map(|u| (u.api_key.clone(), u)).collect(),
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn get_asset(&self, id: AssetId) -> Result<Option<AssetMetadata>> {
        Ok(self.assets.get(&id).cloned())
    }
}

#[async_trait]
impl Entitlements for MemoryCatalog {
    async fn authenticate(&self, credential: &str) -> Result<Option<UserId>> {
        Ok(self.users_by_key.get(credential).map(|u| u.id))
    }

    async fn is_entitled(&self, user: UserId, asset: AssetId) -> Result<bool> {
        let entry = self.users_by_key.values().find(|u| u.id == user);
        match entry {
            Some(u) => match &u.entitled_assets {
                // Unset means the user may access the whole catalog.
                None => Ok(true),
                Some(ids) => Ok(ids.contains(&asset.value())),
            },
            None => Ok(false),
        }
    }
}
