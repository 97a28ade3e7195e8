use crate::model::{SalesRecord, SALES_HEADERS};
use tracing::debug;

/// An in-memory copy of the shared sales sheet. The whole table is held so
/// that an upsert can be applied locally and the sheet rewritten in one call.
///
/// Parsing normalizes the sparse representation the Sheets API returns: rows
/// and columns that are entirely empty are dropped before the header row is
/// interpreted.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct SalesTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    month_col: usize,
    year_col: usize,
}

impl SalesTable {
    /// Parses the raw rows of the remote sheet. An empty sheet produces a
    /// table with the canonical headers and no data rows.
    pub fn parse(raw: Vec<Vec<String>>) -> Self {
        let cleaned = drop_empty(raw);
        let mut rows = cleaned.into_iter();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row,
            None => SALES_HEADERS.iter().map(|s| s.to_string()).collect(),
        };
        let month_col = find_header(&headers, "Month").unwrap_or(0);
        let year_col = find_header(&headers, "Year").unwrap_or(1);
        Self {
            headers,
            rows: rows.collect(),
            month_col,
            year_col,
        }
    }

    /// Replace-on-conflict insert: any existing row with the same
    /// `(Month, Year)` key is removed, then the new record is appended last.
    pub fn upsert(&mut self, record: &SalesRecord) {
        let before = self.rows.len();
        let (month_col, year_col) = (self.month_col, self.year_col);
        self.rows.retain(|row| {
            let month = row.get(month_col).map(String::as_str).unwrap_or("");
            let year = row.get(year_col).map(String::as_str).unwrap_or("");
            !record.key_matches(month, year)
        });
        if self.rows.len() < before {
            debug!(
                "Replacing the existing row for {} {}",
                record.month(),
                record.year()
            );
        }
        self.rows.push(record.to_row(&self.headers));
    }

    /// Renders the table, header row first, for writing back to the sheet.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![self.headers.clone()];
        rows.extend(self.rows.iter().cloned());
        rows
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// Drops rows and columns that contain nothing but empty cells.
fn drop_empty(raw: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let rows: Vec<Vec<String>> = raw
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let keep: Vec<bool> = (0..width)
        .map(|col| {
            rows.iter()
                .any(|row| row.get(col).is_some_and(|cell| !cell.trim().is_empty()))
        })
        .collect();
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .filter(|(col, _)| keep[*col])
                .map(|(_, cell)| cell)
                .collect()
        })
        .collect()
}

fn find_header(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}
