//! Error type shared by the workbook model.

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by the model itself: bad addresses, bad sheet
/// names, writes outside the grid. I/O never appears here.
#[derive(Debug, Error)]
pub enum Error {
    /// The input does not parse as an A1 cell reference.
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// The input does not parse as an A1:B2 range reference.
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u16, u16),

    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Empty, too long, or containing a character sheet names forbid.
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    #[error("Range {0} overlaps an existing merged region")]
    MergedRegionOverlap(String),

    /// Escape hatch for callers layering their own failures on top.
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
