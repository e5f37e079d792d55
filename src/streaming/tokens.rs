//! Stream token authority.
//!
//! Tokens decouple the one-time entitlement decision (made against the slow
//! catalog collaborator) from per-request authorization of manifest, segment,
//! and byte-range fetches. Each token binds exactly one `(asset, user)` pair
//! and expires after a fixed TTL.
//!
//! Tokens are capability-bearing secrets: they are never written to the log
//! at any level, only counts and bound ids are.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use streamgate_common::{AssetId, UserId};

/// What a stream token is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    /// The single asset this token authorizes.
    pub asset_id: AssetId,
    /// The user the token was minted for.
    pub user_id: UserId,
    /// Absolute expiry instant; the token is valid strictly before it.
    pub expires_at: DateTime<Utc>,
    /// When the token was minted.
    pub created_at: DateTime<Utc>,
}

/// Aggregate over the live token store.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TokenStats {
    pub active_tokens: usize,
    pub distinct_users: usize,
}

/// Thread-safe issuer and validator for stream tokens.
///
/// Owns its store; instantiate one per gateway (or per test) and share it
/// behind an `Arc`. Loss on restart is acceptable since tokens are
/// re-mintable.
pub struct TokenAuthority {
    tokens: DashMap<String, TokenClaims>,
    ttl: Duration,
}

impl TokenAuthority {
    /// Create an authority whose tokens live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// Mint a token bound to `(asset, user)`.
    pub fn mint(&self, asset_id: AssetId, user_id: UserId) -> String {
        let token = generate_token();
        let now = Utc::now();

        self.tokens.insert(
            token.clone(),
            TokenClaims {
                asset_id,
                user_id,
                expires_at: now + self.ttl,
                created_at: now,
            },
        );
        tracing::debug!(
            asset_id = %asset_id,
            user_id = %user_id,
            active = self.tokens.len(),
            "Minted stream token"
        );

        token
    }

    /// Validate a token against the asset a request is for.
    ///
    /// Fails closed: unknown token, expired token (evicted on sight), and
    /// asset mismatch all yield `None`. Average O(1).
    pub fn validate(&self, token: &str, asset_id: AssetId) -> Option<TokenClaims> {
        let claims = {
            let entry = self.tokens.get(token)?;
            *entry.value()
        };

        if claims.expires_at <= Utc::now() {
            self.tokens.remove(token);
            return None;
        }
        if claims.asset_id != asset_id {
            return None;
        }

        Some(claims)
    }

    /// Explicitly revoke a token (e.g., on logout).
    pub fn invalidate(&self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }

    /// Remove every token whose expiry is before `now`.
    ///
    /// # Returns
    /// The number of tokens removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, claims| claims.expires_at > now);
        let removed = before.saturating_sub(self.tokens.len());

        if removed > 0 {
            tracing::debug!(removed, "Swept expired stream tokens");
        }

        removed
    }

    /// Aggregate counts over the current store contents.
    pub fn stats(&self) -> TokenStats {
        let mut users = HashSet::new();
        let mut active = 0usize;
        for entry in self.tokens.iter() {
            active += 1;
            users.insert(entry.value().user_id);
        }
        TokenStats {
            active_tokens: active,
            distinct_users: users.len(),
        }
    }

    /// Number of live entries (expired-but-unswept included).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for TokenAuthority {
    fn default() -> Self {
        // Default: 4 hour TTL
        Self::new(Duration::hours(4))
    }
}

/// Generate an opaque URL-safe token with 256 bits of entropy.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Start a background task that periodically sweeps expired tokens.
pub fn start_sweep_task(
    authority: Arc<TokenAuthority>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            authority.sweep_expired(Utc::now());
        }
    })
}
