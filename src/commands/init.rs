use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file using `url` along with default
///   extraction settings
/// - Moves `secret_file` into its default location in the data dir.
///
/// # Arguments
/// - `sales_home` - The directory that will be the root of the data
///   directory, e.g. `$HOME/sales`
/// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON. This
///   will be moved from the `secret_file` path to its default location and
///   name in the data directory.
/// - `url` - The URL of the Google Sheet where the shared sales table is
///   stored.
pub async fn init(sales_home: &Path, secret_file: &Path, url: &str) -> Result<Out<()>> {
    let _config = Config::create(sales_home, secret_file, url)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok("Successfully created the sales directory and config".into())
}
