//! Serialization and deserialization structures for the Google credential
//! files kept in the `.secrets/` directory:
//! - `client_secret.json`: OAuth 2.0 client credentials from Google Cloud Console
//! - `token.json`: the cached access/refresh token pair

use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Represents a file that we want to `Serialize`, `Deserialize`, and read from
/// memory in-between serializations and deserializations. Basically we are
/// just holding the `path` and the `data` here.
#[derive(Debug, Clone)]
pub(super) struct File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    path: PathBuf,
    data: F,
}

impl<F> File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    /// Load data from a file and create a File instance.
    pub(super) async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data: F = utils::deserialize(&path).await?;
        Ok(Self { path, data })
    }

    /// Save the current data to the file.
    pub(super) async fn save(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write(&self.path, json).await?;

        // Set restrictive permissions on Unix-like systems
        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .context("Failed to set file permissions")?;
        }

        Ok(())
    }

    /// Get a reference to the data.
    pub(super) fn data(&self) -> &F {
        &self.data
    }

    /// Get a mutable reference to the data.
    pub(super) fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }

    /// Get the file path.
    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

/// Represents the structure of the `client_secret.json` file downloaded from
/// Google Cloud Console. The standard format from Google has an "installed"
/// wrapper around the actual credentials.
///
/// Example:
/// ```json
/// {
///   "installed": {
///     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
///     "client_secret": "YOUR_CLIENT_SECRET",
///     "redirect_uris": ["http://localhost"],
///     "auth_uri": "https://accounts.google.com/o/oauth2/auth",
///     "token_uri": "https://oauth2.googleapis.com/token"
///   }
/// }
/// ```
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct SecretFile {
    /// Wrapper containing the installed application credentials.
    installed: InstalledCredentials,
}

impl SecretFile {
    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }
}

/// The actual OAuth credentials nested within the `client_secret.json` file.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    #[serde(default)]
    auth_uri: String,
    /// Google's OAuth token endpoint, used for refresh-token exchanges.
    token_uri: String,
}

/// Represents the `token.json` file: the access token used on API calls, the
/// refresh token used to renew it, and when the access token expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct TokenFile {
    access_token: String,
    refresh_token: String,
    expiry: DateTime<Utc>,
}

impl TokenFile {
    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub(super) fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// True when the access token expires within `seconds` from now.
    pub(super) fn expires_within(&self, seconds: i64) -> bool {
        self.expiry <= Utc::now() + Duration::seconds(seconds)
    }

    /// Replaces the access token after a successful refresh.
    pub(super) fn update(&mut self, access_token: String, expiry: DateTime<Utc>) {
        self.access_token = access_token;
        self.expiry = expiry;
    }
}
