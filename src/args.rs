//! These structs provide the CLI interface for the sales CLI.

use crate::extract::MarkerPolicy;
use crate::model::{Month, Year};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// sales: A command-line tool for publishing monthly auto sales totals.
///
/// The purpose of this program is to extract the aggregate figures from a
/// monthly retail sales Excel report and publish them as one row, keyed by
/// month and year, in a shared Google Sheet. Re-uploading the same period
/// replaces the existing row.
///
/// You will need a Google OAuth client credential and a token with access to
/// the shared sheet. See the README for documentation on how to set this up.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run when setting up the sales CLI.
    /// You need a few things ready beforehand:
    ///
    /// - Decide what directory you want to store configuration in and pass
    ///   this as --sales-home. By default it will be $HOME/sales.
    ///
    /// - Get the URL of the shared sales Google Sheet and pass it as
    ///   --sheet-url.
    ///
    /// - Download your Google OAuth client credentials to a file and pass its
    ///   path as --client-secret.
    Init(InitArgs),
    /// Refresh or verify the Google Sheets access token.
    Auth(AuthArgs),
    /// Extract the figures from a monthly report file and upsert them into
    /// the shared sheet.
    Upload(UploadArgs),
    /// Fetch and print the current contents of the shared sheet.
    Query(QueryArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where sales configuration is held. Defaults to ~/sales
    #[arg(long, env = "SALES_HOME", default_value_t = default_sales_home())]
    sales_home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn sales_home(&self) -> &DisplayPath {
        &self.sales_home
    }
}

/// Args for the `sales init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of the shared sales Google Sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The path to your downloaded OAuth client credentials. This file will
    /// be moved to the default secrets location in the data directory.
    #[arg(long)]
    client_secret: PathBuf,
}

impl InitArgs {
    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn client_secret(&self) -> &Path {
        &self.client_secret
    }
}

/// Args for the `sales auth` command.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    /// Only check the stored token and report its expiry, without contacting
    /// the token endpoint.
    #[arg(long)]
    verify: bool,
}

impl AuthArgs {
    pub fn verify(&self) -> bool {
        self.verify
    }
}

/// Args for the `sales upload` command.
#[derive(Debug, Parser, Clone)]
pub struct UploadArgs {
    /// The Buddhist-era year the report covers, e.g. 2567
    #[arg(long)]
    year: Year,

    /// The month the report covers, e.g. Jan
    #[arg(long)]
    month: Month,

    /// The path to the monthly report workbook (.xls or .xlsx)
    #[arg(long)]
    file: PathBuf,

    /// Override the worksheet name configured in config.json
    #[arg(long)]
    sheet_name: Option<String>,

    /// Override the totals-row selection policy:
    /// first-in-lead-column or second-anywhere
    #[arg(long)]
    marker_policy: Option<MarkerPolicy>,

    /// Report every cell that could not be read as a number instead of
    /// silently counting it as zero
    #[arg(long)]
    strict: bool,

    /// Extract and show the record without writing to the shared sheet
    #[arg(long)]
    dry_run: bool,
}

impl UploadArgs {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: Year,
        month: Month,
        file: impl Into<PathBuf>,
        sheet_name: Option<String>,
        marker_policy: Option<MarkerPolicy>,
        strict: bool,
        dry_run: bool,
    ) -> Self {
        Self {
            year,
            month,
            file: file.into(),
            sheet_name,
            marker_policy,
            strict,
            dry_run,
        }
    }

    pub fn year(&self) -> &Year {
        &self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet_name.as_deref()
    }

    pub fn marker_policy(&self) -> Option<MarkerPolicy> {
        self.marker_policy
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

/// The output format for the `sales query` command.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// Args for the `sales query` command.
#[derive(Debug, Parser, Clone)]
pub struct QueryArgs {
    /// The output format: table, csv or json
    #[arg(long, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl QueryArgs {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

fn default_sales_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("sales"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --sales-home or SALES_HOME instead of relying on the default \
                sales home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("sales")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
