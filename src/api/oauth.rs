//! Access-token management for the Google Sheets API.
//!
//! There is no interactive consent flow here: the user supplies a
//! `client_secret.json` and a `token.json` (with a refresh token) obtained
//! out-of-band, and this module keeps the access token fresh by exchanging
//! the refresh token against the token endpoint. The token must carry the
//! `spreadsheets` and `drive` scopes for the sheet to be readable and
//! writable.

use crate::api::files::{File, SecretFile, TokenFile};
use crate::Result;
use anyhow::{bail, ensure, Context};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Refresh the access token when it is within this margin of expiring.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Holds the credential files and hands out a valid access token, refreshing
/// it through the OAuth token endpoint when it is about to expire.
pub(crate) struct TokenProvider {
    secret: File<SecretFile>,
    token: File<TokenFile>,
}

/// The fields of interest in a token-endpoint refresh response.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}

impl TokenProvider {
    /// Loads both credential files. Fails with instructions when either file
    /// is missing or malformed.
    pub(crate) async fn load(
        secret_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let secret = File::load(secret_path)
            .await
            .context("Unable to load the OAuth client credentials, run 'sales init' first")?;
        let token = File::load(token_path).await.context(
            "Unable to load the OAuth token file. Place a token.json with a valid \
            refresh token in the secrets directory, then run 'sales auth --verify'",
        )?;
        Ok(Self { secret, token })
    }

    /// Returns a valid access token, refreshing it first if it expires within
    /// the margin.
    pub(crate) async fn token_with_refresh(&mut self) -> Result<String> {
        if self.token.data().expires_within(EXPIRY_MARGIN_SECONDS) {
            debug!("Access token expires soon, refreshing");
            self.refresh().await?;
        }
        Ok(self.token.data().access_token().to_string())
    }

    /// Exchanges the refresh token for a new access token and persists the
    /// updated token file.
    pub(crate) async fn refresh(&mut self) -> Result<()> {
        let secret = self.secret.data();
        ensure!(
            !self.token.data().refresh_token().is_empty(),
            "The token file has no refresh token"
        );
        let params = [
            ("client_id", secret.client_id()),
            ("client_secret", secret.client_secret()),
            ("refresh_token", self.token.data().refresh_token()),
            ("grant_type", "refresh_token"),
        ];
        let client = reqwest::Client::new();
        let response = client
            .post(secret.token_uri())
            .form(&params)
            .send()
            .await
            .context("Failed to send the token refresh request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Token refresh failed with status {status}: {body}");
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .context("Failed to parse the token refresh response")?;
        let expiry = Utc::now() + Duration::seconds(refreshed.expires_in);
        self.token
            .data_mut()
            .update(refreshed.access_token, expiry);
        self.token.save().await?;
        debug!("Token refreshed, valid until {expiry}");
        Ok(())
    }

    /// When the access token expires, for reporting.
    pub(crate) fn expiry(&self) -> chrono::DateTime<Utc> {
        self.token.data().expiry()
    }
}
