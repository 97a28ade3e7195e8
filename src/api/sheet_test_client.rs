//! Implements the very simple `Sheet` trait using in-memory data for testing
//! purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that
//! we can run the whole app, top-to-bottom, without using Google Sheets.

use crate::api::Sheet;
use crate::Result;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{LazyLock, Mutex};

/// Per-process sheet contents keyed by spreadsheet id, so tests that use
/// distinct ids do not interfere with each other.
static STATE: LazyLock<Mutex<HashMap<String, Vec<Vec<String>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// An implementation of the `Sheet` trait that does not use Google sheets.
/// A spreadsheet id that has never been written is seeded with a couple of
/// months of existing data.
pub(crate) struct TestSheet {
    spreadsheet_id: String,
}

impl TestSheet {
    pub(crate) fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    /// The rows currently held for this spreadsheet id.
    pub(crate) fn get_state(&self) -> Vec<Vec<String>> {
        let mut state = STATE.lock().unwrap();
        state
            .entry(self.spreadsheet_id.clone())
            .or_insert_with(seed_data)
            .clone()
    }

    /// Replaces the rows held for this spreadsheet id.
    pub(crate) fn set_state(&self, rows: Vec<Vec<String>>) {
        STATE
            .lock()
            .unwrap()
            .insert(self.spreadsheet_id.clone(), rows);
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self) -> Result<Vec<Vec<String>>> {
        Ok(self.get_state())
    }

    async fn replace(&mut self, rows: &[Vec<String>]) -> Result<()> {
        self.set_state(rows.to_vec());
        Ok(())
    }
}

/// Provides the seed data from this module.
fn seed_data() -> Vec<Vec<String>> {
    load_csv(SEED_DATA).unwrap()
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let bytes = csv_data.as_bytes();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .from_reader(Cursor::new(bytes));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: Vec<String> = record.iter().map(|field| field.to_string()).collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Seed sales data.
const SEED_DATA: &str = r##"Month,Year,Passenger,Pickup,Commercial,PPV_SUV,Total
Oct,2567,18300,21120,3150,7430,50000
Nov,2567,17890,20650,2980,7210,48730
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_and_replace() {
        let mut sheet = TestSheet::new("test-seed-and-replace");
        let rows = sheet.get().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "Month");

        let new_rows = vec![vec!["Month".to_string()], vec!["Jan".to_string()]];
        sheet.replace(&new_rows).await.unwrap();
        assert_eq!(sheet.get().await.unwrap(), new_rows);
    }
}
