//! Extracts the aggregate sales figures from a source workbook.
//!
//! The source files have no stable schema: the totals row is located by a
//! marker scan and column positions are resolved per file, by keyword match
//! against the header text or by an explicit column map. Individual bad cells
//! degrade to zero so that a single stray value never sinks the whole upload.

mod grid;
mod resolver;

pub use resolver::{ColumnMap, MarkerPolicy};

use crate::error::NotFound;
use crate::model::SalesFigures;
use crate::Result;
use calamine::Data;
use resolver::{FixedResolver, KeywordResolver, PpvColumn, ResolveColumns, ResolvedColumns};
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::debug;

/// The worksheet that carries the figures in the monthly report files.
pub const DEFAULT_SHEET_NAME: &str = "Retail Sales Record by Brand";

/// The text that marks the totals row of a summary block.
pub const DEFAULT_MARKER: &str = "TTL.";

/// Controls how the extractor locates and reads the totals row.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExtractOptions {
    pub sheet_name: String,
    pub marker: String,
    pub marker_policy: MarkerPolicy,
    pub pickup_keywords: Vec<String>,
    pub commercial_keywords: Vec<String>,
    pub ppv_keywords: Vec<String>,
    /// When present, bypasses keyword resolution entirely.
    pub columns: Option<ColumnMap>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            marker_policy: MarkerPolicy::default(),
            pickup_keywords: to_strings(&["PICK UP 1 TON", "DOUBLE CAB"]),
            commercial_keywords: to_strings(&["VAN", "BUS", "PICK UP < 1 TON"]),
            ppv_keywords: to_strings(&["PPV"]),
            columns: None,
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// A cell that was expected to be numeric but was not. The cell contributes
/// zero to its figure; the warning exists so strict callers can audit it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CellWarning {
    pub role: &'static str,
    pub column: usize,
    pub raw: String,
}

impl Display for CellWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "column {} ({}): '{}' is not numeric, counted as 0",
            self.column, self.role, self.raw
        )
    }
}

/// The result of a successful extraction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Extraction {
    pub figures: SalesFigures,
    pub warnings: Vec<CellWarning>,
}

/// Opens the workbook at `path` and extracts the figures from its configured
/// worksheet. Returns `NotFound` (downcastable) when the worksheet or the
/// marker row is absent.
pub fn extract_workbook(path: &Path, options: &ExtractOptions) -> Result<Extraction> {
    let rows = grid::load_sheet(path, &options.sheet_name)?;
    extract_from_rows(&rows, options)
}

/// Extracts the figures from an already-loaded cell grid.
pub fn extract_from_rows(rows: &[Vec<Data>], options: &ExtractOptions) -> Result<Extraction> {
    let marker_row = resolver::find_marker_row(rows, &options.marker, options.marker_policy)
        .ok_or_else(|| NotFound::Marker {
            marker: options.marker.clone(),
        })?;
    debug!("Totals row found at index {marker_row}");

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let columns = resolve_columns(rows, width, options);
    debug!("Resolved columns: {columns:?}");

    let row = &rows[marker_row];
    let mut warnings = Vec::new();
    let mut read = |col: Option<usize>, role: &'static str| -> f64 {
        read_cell(row, col, role, &mut warnings)
    };

    let total = read(columns.total, "total");
    let pickup: f64 = columns
        .pickup
        .iter()
        .map(|&col| read(Some(col), "pickup"))
        .sum();
    let commercial_group: f64 = columns
        .commercial
        .iter()
        .map(|&col| read(Some(col), "commercial"))
        .sum();
    let commercial_subtotal = read(columns.commercial_subtotal, "commercial subtotal");
    // The keyword group and the explicit subtotal column can disagree; the
    // larger value is taken as authoritative to avoid double-counting.
    let commercial = commercial_group.max(commercial_subtotal);
    let ppv = match columns.ppv {
        PpvColumn::Direct(col) => read(Some(col), "ppv"),
        PpvColumn::Base(col) => total - read(Some(col), "ppv base"),
        PpvColumn::Missing => 0.0,
    };

    Ok(Extraction {
        figures: SalesFigures::derive(total, pickup, commercial, ppv),
        warnings,
    })
}

fn resolve_columns(rows: &[Vec<Data>], width: usize, options: &ExtractOptions) -> ResolvedColumns {
    match &options.columns {
        Some(map) => FixedResolver::new(map.clone()).resolve(&[]),
        None => {
            let header_text = resolver::header_text(rows, width);
            KeywordResolver::new(
                options.pickup_keywords.clone(),
                options.commercial_keywords.clone(),
                options.ppv_keywords.clone(),
            )
            .resolve(&header_text)
        }
    }
}

/// Reads one cell of the totals row as a number. Empty or missing cells are
/// silently zero; non-numeric text is zero with a warning.
fn read_cell(
    row: &[Data],
    col: Option<usize>,
    role: &'static str,
    warnings: &mut Vec<CellWarning>,
) -> f64 {
    let Some(col) = col else {
        return 0.0;
    };
    let Some(cell) = row.get(col) else {
        return 0.0;
    };
    match grid::cell_number(cell) {
        Some(value) => value,
        None => {
            let raw = grid::cell_text(cell);
            if !raw.trim().is_empty() {
                let warning = CellWarning { role, column: col, raw };
                debug!("{warning}");
                warnings.push(warning);
            }
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    fn n(value: f64) -> Data {
        Data::Float(value)
    }

    /// A grid shaped like the real report files: title rows, merged headers
    /// across rows 5-7, then the totals row marked "TTL." in column A.
    ///
    /// Columns: labels, two pickup, two commercial, ppv, subtotal, total.
    fn sample_grid() -> Vec<Vec<Data>> {
        vec![
            vec![s("RETAIL SALES RECORD")],
            vec![],
            vec![],
            vec![],
            vec![
                s("BRAND"),
                s("PICK UP"),
                s("DOUBLE"),
                s("VAN"),
                s("BUS"),
                s("PPV"),
                s("COMMERCIAL"),
                s("GRAND"),
            ],
            vec![
                Data::Empty,
                s("1 TON"),
                s("CAB"),
                Data::Empty,
                Data::Empty,
                Data::Empty,
                s("TTL"),
                s("TOTAL"),
            ],
            vec![],
            vec![s("Brand A"), n(60.0), n(30.0), n(20.0), n(10.0), n(40.0), n(25.0), n(600.0)],
            vec![
                s("TTL."),
                n(100.0),
                n(50.0),
                n(30.0),
                n(20.0),
                n(80.0),
                n(45.0),
                n(1000.0),
            ],
        ]
    }

    #[test]
    fn test_extract_worked_example() {
        let extraction = extract_from_rows(&sample_grid(), &ExtractOptions::default()).unwrap();
        let figures = extraction.figures;
        assert_eq!(figures.total, 1000);
        assert_eq!(figures.pickup, 150);
        // max(30 + 20, 45) = 50
        assert_eq!(figures.commercial, 50);
        assert_eq!(figures.ppv_suv, 80);
        assert_eq!(figures.passenger, 720);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_extract_invariant_holds() {
        let figures = extract_from_rows(&sample_grid(), &ExtractOptions::default())
            .unwrap()
            .figures;
        assert_eq!(
            figures.passenger + figures.pickup + figures.commercial + figures.ppv_suv,
            figures.total
        );
    }

    #[test]
    fn test_extract_no_marker_is_not_found() {
        let rows = vec![vec![s("just")], vec![s("data")]];
        let err = extract_from_rows(&rows, &ExtractOptions::default()).unwrap_err();
        let not_found = err.downcast_ref::<NotFound>().expect("should be NotFound");
        assert_eq!(
            *not_found,
            NotFound::Marker {
                marker: "TTL.".to_string()
            }
        );
    }

    #[test]
    fn test_extract_non_numeric_cell_counts_as_zero() {
        let mut grid = sample_grid();
        // Overwrite a commercial-group cell with a placeholder.
        grid[8][3] = s("N/A");
        let extraction = extract_from_rows(&grid, &ExtractOptions::default()).unwrap();
        // Group sum drops to 20, so the subtotal column (45) wins.
        assert_eq!(extraction.figures.commercial, 45);
        assert_eq!(extraction.warnings.len(), 1);
        assert_eq!(extraction.warnings[0].role, "commercial");
        assert_eq!(extraction.warnings[0].column, 3);
        assert_eq!(extraction.warnings[0].raw, "N/A");
    }

    #[test]
    fn test_extract_empty_cells_are_silent_zeros() {
        let mut grid = sample_grid();
        grid[8][1] = Data::Empty;
        let extraction = extract_from_rows(&grid, &ExtractOptions::default()).unwrap();
        assert_eq!(extraction.figures.pickup, 50);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_marker_policy_selects_different_blocks() {
        let mut grid = sample_grid();
        // Append a second, unrelated summary block with its own totals row.
        grid.push(vec![]);
        grid.push(vec![s("BY REGION")]);
        grid.push(vec![
            s("TTL."),
            n(1.0),
            n(2.0),
            n(3.0),
            n(4.0),
            n(5.0),
            n(6.0),
            n(7.0),
        ]);

        let first = extract_from_rows(&grid, &ExtractOptions::default()).unwrap();
        assert_eq!(first.figures.total, 1000);

        let second = extract_from_rows(
            &grid,
            &ExtractOptions {
                marker_policy: MarkerPolicy::SecondAnywhere,
                ..ExtractOptions::default()
            },
        )
        .unwrap();
        assert_eq!(second.figures.total, 7);
    }

    #[test]
    fn test_fixed_column_map_overrides_keywords() {
        let options = ExtractOptions {
            columns: Some(ColumnMap {
                total: Some(7),
                commercial_subtotal: None,
                pickup: vec![1],
                commercial: vec![3],
                ppv: Some(5),
                ppv_base: None,
            }),
            ..ExtractOptions::default()
        };
        let figures = extract_from_rows(&sample_grid(), &options).unwrap().figures;
        assert_eq!(figures.pickup, 100);
        assert_eq!(figures.commercial, 30);
        assert_eq!(figures.ppv_suv, 80);
        assert_eq!(figures.total, 1000);
        assert_eq!(figures.passenger, 1000 - 100 - 30 - 80);
    }

    #[test]
    fn test_ppv_base_column_derives_ppv() {
        // Treat the subtotal column (45) as "everything but PPV".
        let options = ExtractOptions {
            columns: Some(ColumnMap {
                total: Some(7),
                pickup: vec![1, 2],
                commercial: vec![3, 4],
                ppv_base: Some(6),
                ..ColumnMap::default()
            }),
            ..ExtractOptions::default()
        };
        let figures = extract_from_rows(&sample_grid(), &options).unwrap().figures;
        assert_eq!(figures.ppv_suv, 1000 - 45);
    }

    #[test]
    fn test_extract_short_marker_row_degrades_to_zero() {
        let mut grid = sample_grid();
        grid[8].truncate(2); // marker row loses most of its cells
        let extraction = extract_from_rows(&grid, &ExtractOptions::default()).unwrap();
        assert_eq!(extraction.figures.total, 0);
        assert_eq!(extraction.figures.pickup, 100);
    }
}
