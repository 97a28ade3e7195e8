use crate::model::{Month, Year};
use serde::{Deserialize, Serialize};

/// The column order of the shared sales sheet.
pub const SALES_HEADERS: [&str; 7] = [
    "Month",
    "Year",
    "Passenger",
    "Pickup",
    "Commercial",
    "PPV_SUV",
    "Total",
];

/// The four reported segment totals plus the grand total, as extracted from a
/// source workbook. Passenger is always the residual, so the segments sum to
/// the total by construction.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SalesFigures {
    pub passenger: i64,
    pub pickup: i64,
    pub commercial: i64,
    pub ppv_suv: i64,
    pub total: i64,
}

impl SalesFigures {
    /// Derives the figures from raw cell values. Each input is truncated to an
    /// integer first (fractional amounts in source files are discarded, not
    /// rounded), then passenger is computed as the residual so that
    /// `passenger + pickup + commercial + ppv_suv == total` holds exactly.
    pub fn derive(total: f64, pickup: f64, commercial: f64, ppv_suv: f64) -> Self {
        let total = total.trunc() as i64;
        let pickup = pickup.trunc() as i64;
        let commercial = commercial.trunc() as i64;
        let ppv_suv = ppv_suv.trunc() as i64;
        Self {
            passenger: total - pickup - commercial - ppv_suv,
            pickup,
            commercial,
            ppv_suv,
            total,
        }
    }
}

/// One row of the shared sales sheet: the figures for a single (month, year)
/// period. The `(month, year)` pair is the natural key, at most one row per
/// period exists in the sheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SalesRecord {
    month: Month,
    year: Year,
    #[serde(flatten)]
    figures: SalesFigures,
}

impl SalesRecord {
    pub fn new(month: Month, year: Year, figures: SalesFigures) -> Self {
        Self {
            month,
            year,
            figures,
        }
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn year(&self) -> &Year {
        &self.year
    }

    pub fn figures(&self) -> &SalesFigures {
        &self.figures
    }

    /// True when `month` and `year` cells from an existing sheet row identify
    /// the same period as this record.
    pub fn key_matches(&self, month: &str, year: &str) -> bool {
        month.trim() == self.month.to_string() && year.trim() == self.year.as_str()
    }

    /// The value for a named sheet column. Unknown columns map to an empty
    /// string so that a sheet with extra columns survives a rewrite.
    pub fn value_for(&self, header: &str) -> String {
        match header.trim() {
            "Month" => self.month.to_string(),
            "Year" => self.year.to_string(),
            "Passenger" => self.figures.passenger.to_string(),
            "Pickup" => self.figures.pickup.to_string(),
            "Commercial" => self.figures.commercial.to_string(),
            "PPV_SUV" => self.figures.ppv_suv.to_string(),
            "Total" => self.figures.total.to_string(),
            _ => String::new(),
        }
    }

    /// Converts the record to a sheet row following the `headers` order.
    pub fn to_row(&self, headers: &[String]) -> Vec<String> {
        headers.iter().map(|h| self.value_for(h)).collect()
    }
}
