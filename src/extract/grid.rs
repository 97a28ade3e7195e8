//! Raw grid access for source workbooks.
//!
//! The workbook is read as an uninterpreted grid of cells so that the marker
//! scan and column resolution can work with the file exactly as it appears,
//! merged headers and all.

use crate::error::NotFound;
use crate::Result;
use anyhow::Context;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Reads the named worksheet from an `.xls`/`.xlsx` workbook as rows of cells.
/// A missing worksheet is reported as `NotFound` rather than a hard failure.
pub(crate) fn load_sheet(path: &Path, sheet_name: &str) -> Result<Vec<Vec<Data>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook at {}", path.display()))?;
    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(NotFound::Sheet {
            name: sheet_name.to_string(),
        }
        .into());
    }
    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("Failed to read worksheet '{sheet_name}'"))?;
    Ok(range.rows().map(|row| row.to_vec()).collect())
}

/// The text content of a cell, empty for anything that has no sensible text
/// form.
pub(crate) fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) => dt.to_string(),
        Data::Empty | Data::Error(_) => String::new(),
    }
}

/// The numeric value of a cell, if it has one. Numeric-looking strings are
/// accepted (thousands separators stripped) because source files sometimes
/// store figures as text.
pub(crate) fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => s.trim().replace(',', "").parse().ok(),
        Data::Empty
        | Data::DateTime(_)
        | Data::DateTimeIso(_)
        | Data::DurationIso(_)
        | Data::Error(_) => None,
    }
}
