//! Types that represent the core data model, such as `SalesRecord` and the
//! in-memory `SalesTable` that mirrors the shared sheet.
mod month;
mod record;
mod table;

pub use month::{Month, Year};
pub use record::{SalesFigures, SalesRecord, SALES_HEADERS};
pub use table::SalesTable;
