//! Request guard: the thin layer between routing and the streaming core.
//!
//! Streaming requests move `UNVERIFIED -> TOKEN_PRESENT | TOKEN_MISSING`,
//! then `TOKEN_PRESENT -> AUTHORIZED | REJECTED` via the token authority.
//! Missing and rejected both surface as the same generic forbidden error;
//! the caller learns nothing about why.
//!
//! Token issuance is guarded differently: the bearer credential is resolved
//! to a user by the entitlement collaborator, a precondition this layer
//! delegates rather than re-derives.

use serde::Deserialize;
use streamgate_common::{AssetId, Error, Result, UserId};

use super::AppContext;
use crate::streaming::TokenClaims;

/// Query parameters carried by token-guarded streaming requests.
///
/// The token value is a capability secret; it must never be logged.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Parse a path segment into an asset id.
pub fn parse_asset_id(raw: &str) -> Result<AssetId> {
    raw.parse::<AssetId>()
        .map_err(|_| Error::not_found(format!("asset {raw}")))
}

/// Authorize a streaming request against the asset it names.
///
/// Fails closed with [`Error::Unauthorized`] for a missing token and for
/// any rejection from the token authority.
pub fn authorize_stream(
    ctx: &AppContext,
    token: Option<&str>,
    asset_id: AssetId,
) -> Result<TokenClaims> {
    let token = token.ok_or(Error::Unauthorized)?;
    ctx.tokens
        .validate(token, asset_id)
        .ok_or(Error::Unauthorized)
}

/// Resolve a bearer credential to a user via the entitlement collaborator.
pub async fn require_user(ctx: &AppContext, credential: Option<&str>) -> Result<UserId> {
    let credential = credential.ok_or(Error::Unauthorized)?;
    ctx.entitlements
        .authenticate(credential)
        .await?
        .ok_or(Error::Unauthorized)
}
