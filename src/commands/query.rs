//! The `sales query` command: fetch the shared sheet and print it.

use crate::api::{self, Mode};
use crate::args::{OutputFormat, QueryArgs};
use crate::commands::Out;
use crate::model::SalesTable;
use crate::{Config, Result};
use anyhow::Context;
use serde_json::{Map, Value};
use std::fmt::Write as _;

pub async fn query(config: Config, mode: Mode, args: QueryArgs) -> Result<Out<()>> {
    let mut sheet = api::sheet(config, mode).await?;
    let raw = sheet
        .get()
        .await
        .context("Failed to read the shared sales sheet")?;
    let table = SalesTable::parse(raw);
    let rendered = match args.format() {
        OutputFormat::Table => render_table(&table),
        OutputFormat::Csv => render_csv(&table)?,
        OutputFormat::Json => render_json(&table)?,
    };
    Ok(rendered.into())
}

/// Renders the table with each column padded to its widest cell.
fn render_table(table: &SalesTable) -> String {
    let rows = table.to_rows();
    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; column_count];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    let mut out = String::new();
    for row in &rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            let _ = write!(line, "{cell:<width$}  ", width = widths[i]);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn render_csv(table: &SalesTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in table.to_rows() {
        writer.write_record(&row)?;
    }
    let bytes = writer.into_inner().context("Failed to render CSV")?;
    Ok(String::from_utf8(bytes).context("The rendered CSV was not valid UTF-8")?)
}

/// Renders the data rows as a JSON array of objects keyed by the header row.
fn render_json(table: &SalesTable) -> Result<String> {
    let rows = table.to_rows();
    let Some((headers, data)) = rows.split_first() else {
        return Ok("[]".to_string());
    };
    let mut records = Vec::new();
    for row in data {
        let mut object = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = row.get(i).cloned().unwrap_or_default();
            object.insert(header.clone(), Value::String(value));
        }
        records.push(Value::Object(object));
    }
    Ok(serde_json::to_string_pretty(&Value::Array(records))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::OutputFormat;
    use crate::test::TestEnv;

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_query_table_format() {
        let env = TestEnv::new().await;
        let out = query(env.config(), crate::Mode::Test, QueryArgs::new(OutputFormat::Table))
            .await
            .unwrap();
        let message = out.message();
        assert!(message.contains("Month"));
        assert!(message.contains("Oct"));
        assert!(message.contains("Nov"));
    }

    #[tokio::test]
    async fn test_query_csv_format() {
        let env = TestEnv::new().await;
        env.set_state(strings(&[
            &["Month", "Year", "Total"],
            &["Oct", "2567", "100"],
        ]));
        let out = query(env.config(), crate::Mode::Test, QueryArgs::new(OutputFormat::Csv))
            .await
            .unwrap();
        assert_eq!(out.message(), "Month,Year,Total\nOct,2567,100\n");
    }

    #[tokio::test]
    async fn test_query_json_format() {
        let env = TestEnv::new().await;
        env.set_state(strings(&[
            &["Month", "Year", "Total"],
            &["Oct", "2567", "100"],
        ]));
        let out = query(env.config(), crate::Mode::Test, QueryArgs::new(OutputFormat::Json))
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(out.message()).unwrap();
        assert_eq!(parsed[0]["Month"], "Oct");
        assert_eq!(parsed[0]["Total"], "100");
    }
}
