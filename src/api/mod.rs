//! The narrow interface to the remote tabular store, plus its Google and
//! in-memory implementations.

mod files;
mod oauth;
mod sheet;
mod sheet_test_client;

use crate::{Config, Result};

pub(crate) use oauth::TokenProvider;
pub(crate) use sheet_test_client::TestSheet;

/// When this environment variable is set and non-zero in length, the app uses
/// an in-memory sheet instead of Google, so the whole program can be exercised
/// top-to-bottom without network access.
pub const TEST_MODE_ENV: &str = "SALES_SYNC_IN_TEST_MODE";

/// A narrow interface over the shared remote store: read every row of the
/// target worksheet, or replace its whole contents. The target is always the
/// first worksheet of the configured spreadsheet.
///
/// Note that `get` followed by `replace` is a read-modify-write with no lock;
/// two overlapping callers can clobber each other and the last writer wins at
/// the table level.
#[async_trait::async_trait]
pub trait Sheet {
    /// All rows of the target worksheet.
    async fn get(&mut self) -> Result<Vec<Vec<String>>>;

    /// Clears the target worksheet and writes `rows` starting at A1.
    async fn replace(&mut self, rows: &[Vec<String>]) -> Result<()>;
}

/// Whether sheet access goes to Google or to the in-memory test double.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Creates the `Sheet` implementation for `mode`.
pub(crate) async fn sheet(config: Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    match mode {
        Mode::Google => {
            let token_provider =
                TokenProvider::load(config.client_secret_path(), config.token_path()).await?;
            Ok(Box::new(
                sheet::GoogleSheet::new(config, token_provider).await?,
            ))
        }
        Mode::Test => Ok(Box::new(TestSheet::new(config.spreadsheet_id()))),
    }
}
