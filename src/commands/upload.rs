//! The `sales upload` command: extract the figures from a monthly report
//! workbook and upsert them into the shared sheet.

use crate::api::{self, Mode, Sheet};
use crate::args::UploadArgs;
use crate::commands::Out;
use crate::error::NotFound;
use crate::extract::{self, ExtractOptions};
use crate::model::{SalesRecord, SalesTable};
use crate::{Config, Result};
use anyhow::{ensure, Context};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

pub async fn upload(config: Config, mode: Mode, args: UploadArgs) -> Result<Out<SalesRecord>> {
    validate_source_file(args.file())?;
    let options = extract_options(&config, &args);

    let extraction = match extract::extract_workbook(args.file(), &options) {
        Ok(extraction) => extraction,
        Err(e) => match e.downcast_ref::<NotFound>() {
            // A missing marker or worksheet is a warning, not a failure:
            // report it and write nothing.
            Some(not_found) => {
                return Ok(Out::new_message(format!(
                    "Could not locate the figures in the file: {not_found}. \
                    Nothing was uploaded, check the file structure."
                )))
            }
            None => return Err(e),
        },
    };

    let record = SalesRecord::new(args.month(), args.year().clone(), extraction.figures);
    debug!("Extracted record: {record:?}");

    let mut message = String::new();
    if args.strict() && !extraction.warnings.is_empty() {
        writeln!(
            message,
            "{} cell(s) could not be read as numbers and counted as 0:",
            extraction.warnings.len()
        )?;
        for warning in &extraction.warnings {
            writeln!(message, "  {warning}")?;
        }
    }

    if args.dry_run() {
        write!(
            message,
            "Dry run: extracted {} {} (total {}), nothing was uploaded",
            record.month(),
            record.year(),
            record.figures().total
        )?;
        return Ok(Out::new(message, record));
    }

    let mut sheet = api::sheet(config, mode).await?;
    upsert(sheet.as_mut(), &record).await?;
    write!(
        message,
        "Uploaded {} {} to the shared sheet",
        record.month(),
        record.year()
    )?;
    Ok(Out::new(message, record))
}

/// Replaces any existing row with the record's `(Month, Year)` key and
/// appends the record as the last row, rewriting the whole table.
///
/// This is a full-table read-modify-write with no lock: two overlapping
/// callers race, and the last writer wins at the table level.
pub async fn upsert(sheet: &mut (dyn Sheet + Send), record: &SalesRecord) -> Result<()> {
    let raw = sheet
        .get()
        .await
        .context("Failed to read the existing sales table")?;
    let mut table = SalesTable::parse(raw);
    table.upsert(record);
    sheet
        .replace(&table.to_rows())
        .await
        .context("Failed to write the updated sales table")
}

/// Rejects an upload before extraction runs when the source file is missing
/// or is not an Excel workbook.
fn validate_source_file(path: &Path) -> Result<()> {
    ensure!(
        path.is_file(),
        "The source file '{}' does not exist",
        path.display()
    );
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    ensure!(
        extension == "xls" || extension == "xlsx",
        "The source file '{}' is not an .xls or .xlsx workbook",
        path.display()
    );
    Ok(())
}

fn extract_options(config: &Config, args: &UploadArgs) -> ExtractOptions {
    let mut options = ExtractOptions {
        sheet_name: config.sheet_name().to_string(),
        marker: config.marker().to_string(),
        marker_policy: config.marker_policy(),
        columns: config.columns().cloned(),
        ..ExtractOptions::default()
    };
    if let Some(words) = config.pickup_keywords() {
        options.pickup_keywords = words.to_vec();
    }
    if let Some(words) = config.commercial_keywords() {
        options.commercial_keywords = words.to_vec();
    }
    if let Some(words) = config.ppv_keywords() {
        options.ppv_keywords = words.to_vec();
    }
    if let Some(sheet_name) = args.sheet_name() {
        options.sheet_name = sheet_name.to_string();
    }
    if let Some(policy) = args.marker_policy() {
        options.marker_policy = policy;
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Month, SalesFigures, Year};
    use crate::test::TestEnv;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn record(month: Month, year: &str, total: i64) -> SalesRecord {
        SalesRecord::new(
            month,
            Year::from_str(year).unwrap(),
            SalesFigures::derive(total as f64, 0.0, 0.0, 0.0),
        )
    }

    #[tokio::test]
    async fn test_upsert_replaces_row_with_same_key() {
        let env = TestEnv::new().await;
        let mut sheet = api::sheet(env.config(), Mode::Test).await.unwrap();

        upsert(sheet.as_mut(), &record(Month::Jan, "2567", 100))
            .await
            .unwrap();
        upsert(sheet.as_mut(), &record(Month::Jan, "2567", 200))
            .await
            .unwrap();

        let state = env.get_state();
        let jan_rows: Vec<_> = state
            .iter()
            .filter(|row| row[0] == "Jan" && row[1] == "2567")
            .collect();
        assert_eq!(jan_rows.len(), 1);
        assert_eq!(jan_rows[0][6], "200");
    }

    #[tokio::test]
    async fn test_upsert_accumulates_distinct_keys() {
        let env = TestEnv::new().await;
        env.set_state(vec![]);
        let mut sheet = api::sheet(env.config(), Mode::Test).await.unwrap();

        upsert(sheet.as_mut(), &record(Month::Jan, "2567", 100))
            .await
            .unwrap();
        upsert(sheet.as_mut(), &record(Month::Feb, "2567", 110))
            .await
            .unwrap();

        let state = env.get_state();
        // header plus two data rows, the newest record last
        assert_eq!(state.len(), 3);
        assert_eq!(state[2][0], "Feb");
    }

    #[tokio::test]
    async fn test_upsert_preserves_seeded_rows() {
        let env = TestEnv::new().await;
        let mut sheet = api::sheet(env.config(), Mode::Test).await.unwrap();

        // The seed data holds Oct and Nov 2567; adding Dec must not lose them.
        upsert(sheet.as_mut(), &record(Month::Dec, "2567", 100))
            .await
            .unwrap();
        let state = env.get_state();
        assert_eq!(state.len(), 4);
        assert_eq!(state[1][0], "Oct");
        assert_eq!(state[2][0], "Nov");
        assert_eq!(state[3][0], "Dec");
    }

    fn upload_args(file: &Path, strict: bool, dry_run: bool) -> UploadArgs {
        UploadArgs::new(
            Year::from_str("2567").unwrap(),
            Month::Dec,
            file,
            None,
            None,
            strict,
            dry_run,
        )
    }

    /// Writes a workbook shaped like the real report files: merged-style
    /// headers across rows 5-6 and a "TTL." totals row.
    ///
    /// Columns: labels, two pickup, two commercial, ppv, subtotal, total.
    fn write_report(path: &Path, include_marker: bool, bad_cell: bool) {
        use rust_xlsxwriter::Workbook;
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Retail Sales Record by Brand").unwrap();

        let top = [
            "BRAND",
            "PICK UP",
            "DOUBLE",
            "VAN",
            "BUS",
            "PPV",
            "COMMERCIAL",
            "GRAND",
        ];
        let bottom = ["", "1 TON", "CAB", "", "", "", "TTL", "TOTAL"];
        for (col, text) in top.iter().enumerate() {
            sheet.write_string(4, col as u16, *text).unwrap();
        }
        for (col, text) in bottom.iter().enumerate() {
            if !text.is_empty() {
                sheet.write_string(5, col as u16, *text).unwrap();
            }
        }
        if include_marker {
            sheet.write_string(8, 0, "TTL.").unwrap();
            let figures = [100.0, 50.0, 30.0, 20.0, 80.0, 45.0, 1000.0];
            for (i, value) in figures.iter().enumerate() {
                let col = (i + 1) as u16;
                if bad_cell && col == 3 {
                    sheet.write_string(8, col, "N/A").unwrap();
                } else {
                    sheet.write_number(8, col, *value).unwrap();
                }
            }
        }
        workbook.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_upload_end_to_end() {
        let env = TestEnv::new().await;
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.xlsx");
        write_report(&file, true, false);

        let out = upload(env.config(), Mode::Test, upload_args(&file, false, false))
            .await
            .unwrap();
        assert!(out.message().contains("Uploaded Dec 2567"));
        let figures = out.structure().unwrap().figures();
        assert_eq!(figures.total, 1000);
        assert_eq!(figures.pickup, 150);
        assert_eq!(figures.passenger, 720);

        let state = env.get_state();
        let dec = state.iter().find(|row| row[0] == "Dec").unwrap();
        assert_eq!(dec[1], "2567");
        assert_eq!(dec[6], "1000");
    }

    #[tokio::test]
    async fn test_upload_missing_marker_warns_and_writes_nothing() {
        let env = TestEnv::new().await;
        let before = env.get_state();
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.xlsx");
        write_report(&file, false, false);

        let out = upload(env.config(), Mode::Test, upload_args(&file, false, false))
            .await
            .unwrap();
        assert!(out.message().contains("Could not locate"));
        assert!(out.structure().is_none());
        assert_eq!(env.get_state(), before);
    }

    #[tokio::test]
    async fn test_upload_dry_run_writes_nothing() {
        let env = TestEnv::new().await;
        let before = env.get_state();
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.xlsx");
        write_report(&file, true, false);

        let out = upload(env.config(), Mode::Test, upload_args(&file, false, true))
            .await
            .unwrap();
        assert!(out.message().contains("Dry run"));
        assert_eq!(out.structure().unwrap().figures().total, 1000);
        assert_eq!(env.get_state(), before);
    }

    #[tokio::test]
    async fn test_upload_strict_reports_bad_cells() {
        let env = TestEnv::new().await;
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.xlsx");
        write_report(&file, true, true);

        let out = upload(env.config(), Mode::Test, upload_args(&file, true, true))
            .await
            .unwrap();
        assert!(out.message().contains("counted as 0"));
        assert!(out.message().contains("N/A"));
        // The bad cell drops the commercial group sum below the subtotal.
        assert_eq!(out.structure().unwrap().figures().commercial, 45);
    }

    #[tokio::test]
    async fn test_extract_options_config_keyword_overrides() {
        let env = TestEnv::new().await;
        let json = serde_json::json!({
            "app_name": "sales",
            "config_version": 1,
            "sheet_url": env.config().sheet_url(),
            "pickup_keywords": ["KEI TRUCK"],
        });
        std::fs::write(
            env.config().config_path(),
            serde_json::to_string_pretty(&json).unwrap(),
        )
        .unwrap();
        let config = Config::load(env.config().root()).await.unwrap();

        let options = extract_options(&config, &upload_args(Path::new("r.xlsx"), false, false));
        assert_eq!(options.pickup_keywords, vec!["KEI TRUCK"]);
        // Unconfigured sets keep the extractor defaults.
        assert_eq!(options.ppv_keywords, vec!["PPV"]);
    }

    #[test]
    fn test_validate_source_file() {
        let dir = TempDir::new().unwrap();
        let xlsx = dir.path().join("report.xlsx");
        let upper = dir.path().join("report.XLSX");
        let txt = dir.path().join("report.txt");
        std::fs::write(&xlsx, b"x").unwrap();
        std::fs::write(&upper, b"x").unwrap();
        std::fs::write(&txt, b"x").unwrap();

        assert!(validate_source_file(&xlsx).is_ok());
        assert!(validate_source_file(&upper).is_ok());
        assert!(validate_source_file(&txt).is_err());
        assert!(validate_source_file(&dir.path().join("missing.xlsx")).is_err());
    }
}
