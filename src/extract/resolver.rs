//! Marker-row selection and column-role resolution.
//!
//! Column positions for the same logical quantity drift between source-file
//! versions, so resolution is pluggable: the default resolver matches header
//! text against keyword sets, and a fixed resolver applies a pre-declared
//! column map for layouts that are known to be stable.

use crate::extract::grid::cell_text;
use calamine::Data;
use serde::{Deserialize, Serialize};

/// The header rows whose text is concatenated per column before keyword
/// matching. Spanning several rows absorbs merged-cell headers.
const HEADER_ROWS: std::ops::Range<usize> = 4..7;

/// Which occurrence of the totals marker identifies the totals row.
///
/// Historical source files disagree on this, and the two policies can land on
/// different rows when a sheet carries a second summary block further down.
/// The choice is therefore a named configuration value, never an implicit one.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerPolicy {
    /// Scan the first column top to bottom and take the first row whose text
    /// contains the marker. This stops at the first summary block.
    #[default]
    FirstInLeadColumn,
    /// Scan every column and take the second distinct row containing the
    /// marker. Falls back to the only occurrence when just one row matches.
    SecondAnywhere,
}

serde_plain::derive_display_from_serialize!(MarkerPolicy);
serde_plain::derive_fromstr_from_deserialize!(MarkerPolicy);

/// Finds the totals row according to `policy`. Marker matching is a plain
/// substring test on the cell text.
pub(crate) fn find_marker_row(
    rows: &[Vec<Data>],
    marker: &str,
    policy: MarkerPolicy,
) -> Option<usize> {
    match policy {
        MarkerPolicy::FirstInLeadColumn => rows.iter().position(|row| {
            row.first()
                .is_some_and(|cell| cell_text(cell).contains(marker))
        }),
        MarkerPolicy::SecondAnywhere => {
            let mut matches = rows.iter().enumerate().filter_map(|(ix, row)| {
                row.iter()
                    .any(|cell| cell_text(cell).contains(marker))
                    .then_some(ix)
            });
            let first = matches.next();
            matches.next().or(first)
        }
    }
}

/// An explicit column layout for workbooks with a known, stable structure.
/// When present in the configuration it bypasses keyword matching entirely.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ColumnMap {
    /// Zero-based index of the grand-total column.
    pub total: Option<usize>,
    /// Zero-based index of the commercial subtotal column.
    pub commercial_subtotal: Option<usize>,
    /// Columns summed into the pickup figure.
    #[serde(default)]
    pub pickup: Vec<usize>,
    /// Columns summed into the commercial figure.
    #[serde(default)]
    pub commercial: Vec<usize>,
    /// Column holding the PPV/SUV figure directly.
    pub ppv: Option<usize>,
    /// Column holding everything-but-PPV; when set (and `ppv` is not), the
    /// PPV figure is derived as `total - ppv_base`.
    pub ppv_base: Option<usize>,
}

/// Where the PPV/SUV figure comes from after resolution.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum PpvColumn {
    /// Read the figure from this column.
    Direct(usize),
    /// Derive the figure as `total` minus this column.
    Base(usize),
    /// No column resolved, the figure degrades to zero.
    Missing,
}

/// Concrete column indices for each logical role.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct ResolvedColumns {
    pub(crate) total: Option<usize>,
    pub(crate) commercial_subtotal: Option<usize>,
    pub(crate) pickup: Vec<usize>,
    pub(crate) commercial: Vec<usize>,
    pub(crate) ppv: PpvColumn,
}

/// Maps logical column roles to concrete indices given the combined header
/// text of the sheet.
pub(crate) trait ResolveColumns {
    fn resolve(&self, header_text: &[String]) -> ResolvedColumns;
}

/// Resolves columns by matching header text against keyword sets. The total
/// and commercial-subtotal roles are positional: last and second-to-last
/// column of the grid.
pub(crate) struct KeywordResolver {
    pickup_keywords: Vec<String>,
    commercial_keywords: Vec<String>,
    ppv_keywords: Vec<String>,
}

impl KeywordResolver {
    pub(crate) fn new(
        pickup_keywords: Vec<String>,
        commercial_keywords: Vec<String>,
        ppv_keywords: Vec<String>,
    ) -> Self {
        Self {
            pickup_keywords,
            commercial_keywords,
            ppv_keywords,
        }
    }
}

impl ResolveColumns for KeywordResolver {
    fn resolve(&self, header_text: &[String]) -> ResolvedColumns {
        let width = header_text.len();
        let ppv = match find_columns(header_text, &self.ppv_keywords).first() {
            Some(&col) => PpvColumn::Direct(col),
            None => PpvColumn::Missing,
        };
        ResolvedColumns {
            total: width.checked_sub(1),
            commercial_subtotal: width.checked_sub(2),
            pickup: find_columns(header_text, &self.pickup_keywords),
            commercial: find_columns(header_text, &self.commercial_keywords),
            ppv,
        }
    }
}

/// Resolves columns from a pre-declared `ColumnMap`, ignoring header text.
pub(crate) struct FixedResolver {
    map: ColumnMap,
}

impl FixedResolver {
    pub(crate) fn new(map: ColumnMap) -> Self {
        Self { map }
    }
}

impl ResolveColumns for FixedResolver {
    fn resolve(&self, _header_text: &[String]) -> ResolvedColumns {
        let ppv = match (self.map.ppv, self.map.ppv_base) {
            (Some(col), _) => PpvColumn::Direct(col),
            (None, Some(col)) => PpvColumn::Base(col),
            (None, None) => PpvColumn::Missing,
        };
        ResolvedColumns {
            total: self.map.total,
            commercial_subtotal: self.map.commercial_subtotal,
            pickup: self.map.pickup.clone(),
            commercial: self.map.commercial.clone(),
            ppv,
        }
    }
}

/// Builds the per-column header text by concatenating the header rows. The
/// result always has `width` entries; cells past the end of a row contribute
/// nothing.
pub(crate) fn header_text(rows: &[Vec<Data>], width: usize) -> Vec<String> {
    let mut text = vec![String::new(); width];
    for row_ix in HEADER_ROWS {
        let Some(row) = rows.get(row_ix) else {
            break;
        };
        for (col, cell) in row.iter().enumerate().take(width) {
            let cell_text = cell_text(cell);
            if !cell_text.is_empty() {
                if !text[col].is_empty() {
                    text[col].push(' ');
                }
                text[col].push_str(&cell_text);
            }
        }
    }
    text
}

/// The indices of columns whose header text contains any of the keywords,
/// case-insensitively.
pub(crate) fn find_columns(header_text: &[String], keywords: &[String]) -> Vec<usize> {
    header_text
        .iter()
        .enumerate()
        .filter_map(|(ix, text)| {
            let upper = text.to_uppercase();
            keywords
                .iter()
                .any(|k| upper.contains(&k.to_uppercase()))
                .then_some(ix)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_find_marker_row_first_in_lead_column() {
        let rows = vec![
            vec![s("GRAND TTL. SUMMARY"), s("x")],
            vec![s("nothing")],
            vec![s("TTL."), s("y")],
            vec![s("other"), s("TTL.")],
        ];
        // Row 0 contains the marker in column A, so it wins even though a
        // cleaner match exists below.
        assert_eq!(
            find_marker_row(&rows, "TTL.", MarkerPolicy::FirstInLeadColumn),
            Some(0)
        );
    }

    #[test]
    fn test_find_marker_row_second_anywhere() {
        let rows = vec![
            vec![s("header")],
            vec![s("TTL."), s("first block")],
            vec![s("more data")],
            vec![s("notes"), s("TTL.")],
        ];
        assert_eq!(
            find_marker_row(&rows, "TTL.", MarkerPolicy::SecondAnywhere),
            Some(3)
        );
    }

    #[test]
    fn test_find_marker_row_second_anywhere_falls_back_to_sole_match() {
        let rows = vec![vec![s("x")], vec![s("TTL.")]];
        assert_eq!(
            find_marker_row(&rows, "TTL.", MarkerPolicy::SecondAnywhere),
            Some(1)
        );
    }

    #[test]
    fn test_find_marker_row_none() {
        let rows = vec![vec![s("a")], vec![s("b")]];
        assert_eq!(
            find_marker_row(&rows, "TTL.", MarkerPolicy::FirstInLeadColumn),
            None
        );
        assert_eq!(
            find_marker_row(&rows, "TTL.", MarkerPolicy::SecondAnywhere),
            None
        );
    }

    #[test]
    fn test_marker_policy_round_trip() {
        use std::str::FromStr;
        assert_eq!(
            MarkerPolicy::from_str("first-in-lead-column").unwrap(),
            MarkerPolicy::FirstInLeadColumn
        );
        assert_eq!(MarkerPolicy::SecondAnywhere.to_string(), "second-anywhere");
    }

    #[test]
    fn test_header_text_absorbs_merged_rows() {
        let mut rows = vec![vec![], vec![], vec![], vec![]];
        rows.push(vec![s("PICK UP"), s("VAN")]);
        rows.push(vec![s("1 TON"), Data::Empty]);
        rows.push(vec![Data::Empty, s("& BUS")]);
        let text = header_text(&rows, 3);
        assert_eq!(text, vec!["PICK UP 1 TON", "VAN & BUS", ""]);
    }

    #[test]
    fn test_find_columns_case_insensitive() {
        let text = vec![
            "Pick Up 1 Ton".to_string(),
            "DOUBLE CAB 4x4".to_string(),
            "Sedan".to_string(),
        ];
        assert_eq!(
            find_columns(&text, &keywords(&["PICK UP 1 TON", "DOUBLE CAB"])),
            vec![0, 1]
        );
        assert!(find_columns(&text, &keywords(&["BUS"])).is_empty());
    }

    #[test]
    fn test_keyword_resolver_positional_roles() {
        let text = vec![
            String::new(),
            "PICK UP 1 TON".to_string(),
            "PPV".to_string(),
            "COM SUBTOTAL".to_string(),
            "TOTAL".to_string(),
        ];
        let resolver = KeywordResolver::new(
            keywords(&["PICK UP 1 TON"]),
            keywords(&["VAN"]),
            keywords(&["PPV"]),
        );
        let resolved = resolver.resolve(&text);
        assert_eq!(resolved.total, Some(4));
        assert_eq!(resolved.commercial_subtotal, Some(3));
        assert_eq!(resolved.pickup, vec![1]);
        assert!(resolved.commercial.is_empty());
        assert_eq!(resolved.ppv, PpvColumn::Direct(2));
    }

    #[test]
    fn test_fixed_resolver_ppv_base() {
        let map = ColumnMap {
            total: Some(7),
            ppv_base: Some(5),
            ..ColumnMap::default()
        };
        let resolved = FixedResolver::new(map).resolve(&[]);
        assert_eq!(resolved.total, Some(7));
        assert_eq!(resolved.ppv, PpvColumn::Base(5));
    }
}
