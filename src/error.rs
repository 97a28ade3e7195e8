use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Returned when the source workbook does not contain the structure extraction
/// needs. This is a warning condition, not a failure: callers downcast it and
/// report it to the user without writing anything to the remote sheet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NotFound {
    /// The named worksheet does not exist in the workbook.
    Sheet { name: String },
    /// No row matched the totals marker under the configured policy.
    Marker { marker: String },
}

impl Display for NotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFound::Sheet { name } => {
                write!(f, "the workbook has no worksheet named '{name}'")
            }
            NotFound::Marker { marker } => {
                write!(f, "no totals row matched the marker '{marker}'")
            }
        }
    }
}

impl std::error::Error for NotFound {}
