//! Configuration file handling.
//!
//! The configuration file is stored at `$SALES_HOME/config.json` and contains
//! the Google Sheet URL of the shared sales table, the extraction settings,
//! and the credential file paths.

use crate::extract::{ColumnMap, MarkerPolicy, DEFAULT_MARKER, DEFAULT_SHEET_NAME};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "sales";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$SALES_HOME` and from there it
/// loads `$SALES_HOME/config.json`. It provides paths to other items that are
/// either configurable or are expected in a certain location within the home
/// directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the data directory and:
    /// - Creates an initial `config.json` using `sheet_url` and default
    ///   extraction settings.
    /// - Moves `secret_file` into its default location in the data dir.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the data directory,
    ///   e.g. `$HOME/sales`
    /// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON.
    ///   This will be moved to its default location and name in the data
    ///   directory.
    /// - `sheet_url` - The URL of the Google Sheet holding the shared sales
    ///   table, e.g.
    ///   https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    pub async fn create(
        dir: impl Into<PathBuf>,
        secret_file: &Path,
        sheet_url: &str,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the sales home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        // Move the Google OAuth client credentials file to its default
        // location in the data dir
        let secret_destination = secrets_dir.join(CLIENT_SECRET_JSON);
        utils::rename(secret_file, secret_destination).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// This will
    /// - validate that `sales_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(sales_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = sales_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Sales home is missing, run 'sales init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?;

        let config = Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// The worksheet name extraction reads from source workbooks.
    pub fn sheet_name(&self) -> &str {
        &self.config_file.sheet_name
    }

    /// The totals-row marker text.
    pub fn marker(&self) -> &str {
        &self.config_file.marker
    }

    /// Which marker occurrence identifies the totals row.
    pub fn marker_policy(&self) -> MarkerPolicy {
        self.config_file.marker_policy
    }

    /// The fixed column layout override, when one is configured.
    pub fn columns(&self) -> Option<&ColumnMap> {
        self.config_file.columns.as_ref()
    }

    /// The configured pickup keyword set, when one overrides the default.
    pub fn pickup_keywords(&self) -> Option<&[String]> {
        self.config_file.pickup_keywords.as_deref()
    }

    /// The configured commercial keyword set, when one overrides the default.
    pub fn commercial_keywords(&self) -> Option<&[String]> {
        self.config_file.commercial_keywords.as_deref()
    }

    /// The configured PPV keyword set, when one overrides the default.
    pub fn ppv_keywords(&self) -> Option<&[String]> {
        self.config_file.ppv_keywords.as_deref()
    }

    /// Returns the stored `client_secret_path` if it is absolute, otherwise
    /// resolves the relative path.
    pub fn client_secret_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.client_secret_path())
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves
    /// the relative path.
    pub fn token_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.token_path())
    }

    /// Checks if `p` is relative, and if so, resolves it. Returns it unchanged
    /// if it is absolute.
    fn resolve_secrets_file_path(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the
/// configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "sales",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "sheet_name": "Retail Sales Record by Brand",
///   "marker": "TTL.",
///   "marker_policy": "first-in-lead-column"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "sales"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL to the shared sales Google Sheet
    sheet_url: String,

    /// The worksheet of the uploaded workbooks that carries the figures
    #[serde(default = "default_sheet_name")]
    sheet_name: String,

    /// Text marking the totals row of a summary block
    #[serde(default = "default_marker")]
    marker: String,

    /// Which marker occurrence identifies the totals row
    #[serde(default)]
    marker_policy: MarkerPolicy,

    /// Explicit column layout override for known-stable workbook layouts.
    /// When absent, columns are resolved by keyword matching.
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<ColumnMap>,

    /// Overrides for the header keyword set that selects pickup columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pickup_keywords: Option<Vec<String>>,

    /// Overrides for the header keyword set that selects commercial columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    commercial_keywords: Option<Vec<String>>,

    /// Overrides for the header keyword set that selects the PPV/SUV column.
    #[serde(skip_serializing_if = "Option::is_none")]
    ppv_keywords: Option<Vec<String>>,

    /// Path to the OAuth 2.0 client credentials file (optional, relative to
    /// config.json or absolute).
    /// Defaults to $SALES_HOME/.secrets/client_secret.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret_path: Option<PathBuf>,

    /// Path to the OAuth token file (optional, relative to config.json or
    /// absolute). Defaults to $SALES_HOME/.secrets/token.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            sheet_name: default_sheet_name(),
            marker: default_marker(),
            marker_policy: MarkerPolicy::default(),
            columns: None,
            pickup_keywords: None,
            commercial_keywords: None,
            ppv_keywords: None,
            client_secret_path: None,
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the client secret path.
    ///
    /// If the path is relative, it should be interpreted as relative to the
    /// config.json file. If None, defaults to
    /// $SALES_HOME/.secrets/client_secret.json
    pub fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON))
    }

    /// Gets the token path.
    ///
    /// If the path is relative, it should be interpreted as relative to the
    /// config.json file. If None, defaults to $SALES_HOME/.secrets/token.json
    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL of the form
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...`. Query
/// parameters and fragments are ignored.
fn extract_spreadsheet_id(sheet_url: &str) -> Result<String> {
    let url = Url::parse(sheet_url)
        .with_context(|| format!("'{sheet_url}' is not a valid URL"))?;
    let mut segments = url
        .path_segments()
        .context("The sheet URL has no path segments")?;
    while let Some(segment) = segments.next() {
        if segment == "d" {
            if let Some(id) = segments.next() {
                if !id.is_empty() {
                    return Ok(id.to_string());
                }
            }
        }
    }
    bail!(
        "Invalid Google Sheets URL format. \
        Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}
