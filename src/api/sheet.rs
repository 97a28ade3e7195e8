//! Implements the `Sheet` trait using the `sheets::Client` to interact with
//! the shared Google sheet.

use crate::api::{Sheet, TokenProvider};
use crate::{Config, Result};
use anyhow::Context;
use sheets::types::{
    BatchClearValuesRequest, BatchUpdateValuesRequest, DateTimeRenderOption, Dimension,
    ValueInputOption, ValueRange, ValueRenderOption,
};
use tracing::trace;

/// An unqualified range resolves against the first worksheet of the
/// spreadsheet, which is where the sales table lives.
const VALUES_RANGE: &str = "A:ZZ";
const WRITE_ANCHOR: &str = "A1";

/// Implements the `Sheet` trait using the `sheets::Client` to interact with a
/// Google sheet. It takes a `TokenProvider`, on which it calls refresh to keep
/// the token up-to-date.
pub(super) struct GoogleSheet {
    config: Config,
    token_provider: TokenProvider,
    client: sheets::Client,
}

impl GoogleSheet {
    pub(super) async fn new(config: Config, mut token_provider: TokenProvider) -> Result<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            config,
            token_provider,
            client,
        })
    }

    /// Refreshes the sheets client with a new access token if needed.
    async fn refresh_client(&mut self) -> Result<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn get(&mut self) -> Result<Vec<Vec<String>>> {
        trace!("get all values for {}", self.config.spreadsheet_id());
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .values_get(
                self.config.spreadsheet_id(),
                VALUES_RANGE,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .context("Failed to fetch the sales sheet data")?;
        Ok(response.body.values)
    }

    async fn replace(&mut self, rows: &[Vec<String>]) -> Result<()> {
        trace!("replace {} rows", rows.len());
        self.refresh_client().await?;

        let clear = BatchClearValuesRequest {
            ranges: vec![VALUES_RANGE.to_string()],
        };
        self.client
            .spreadsheets()
            .values_batch_clear(self.config.spreadsheet_id(), &clear)
            .await
            .map_err(map_client_error)
            .context("Failed to clear the sales sheet")?;

        let request = BatchUpdateValuesRequest {
            data: vec![ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: WRITE_ANCHOR.to_string(),
                values: rows.to_vec(),
            }],
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };
        self.client
            .spreadsheets()
            .values_batch_update(self.config.spreadsheet_id(), &request)
            .await
            .map_err(map_client_error)
            .context("Failed to write the sales sheet")?;
        Ok(())
    }
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Result<sheets::Client> {
    // Get the access token (will refresh if needed)
    let access_token = token_provider.token_with_refresh().await?;

    // Note: The sheets crate requires client_id, client_secret, and
    // redirect_uri, but we don't need them for API calls, only the access
    // token. Refresh is handled by the TokenProvider.
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token,
        String::new(),
    ))
}

fn map_client_error(e: sheets::ClientError) -> anyhow::Error {
    anyhow::anyhow!("Google Sheets client error: {e}")
}
