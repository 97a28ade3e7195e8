//! Authentication command handlers.
//!
//! There is no interactive consent flow: the token file is obtained
//! out-of-band and this command keeps it fresh.
//! - `sales auth` - refreshes the access token through the token endpoint
//! - `sales auth --verify` - checks the stored token without any network call

use crate::api::TokenProvider;
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;

/// Handles the `sales auth` command. Loads the credential files and exchanges
/// the refresh token for a new access token, proving that the stored
/// credentials work.
pub async fn auth(config: &Config) -> Result<Out<()>> {
    let mut token_provider = TokenProvider::load(config.client_secret_path(), config.token_path())
        .await
        .context("Unable to load the credential files")?;
    token_provider
        .refresh()
        .await
        .context("Unable to refresh the access token")?;
    Ok(format!(
        "Access token refreshed, valid until {}",
        token_provider.expiry()
    )
    .into())
}

/// Handles the `sales auth --verify` command. This never contacts the token
/// endpoint; it only reports on the stored token.
pub async fn auth_verify(config: &Config) -> Result<Out<()>> {
    let token_provider = TokenProvider::load(config.client_secret_path(), config.token_path())
        .await
        .context(
            "Unable to load the credential files. Run 'sales init' and place a \
            token.json in the secrets directory.",
        )?;
    let expiry = token_provider.expiry();
    let message = if expiry <= chrono::Utc::now() {
        format!("The access token expired at {expiry}, run 'sales auth' to refresh it")
    } else {
        format!("The access token is valid until {expiry}")
    };
    Ok(message.into())
}
