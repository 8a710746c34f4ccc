//! Error type for the legacy XLS reader.

use thiserror::Error;

pub type XlsResult<T> = std::result::Result<T, XlsError>;

/// Failures while opening the compound file or decoding BIFF records.
///
/// The `cfb` crate reports through `std::io::Error`, so container
/// problems surface as `Io`.
#[derive(Debug, Error)]
pub enum XlsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Not a compound file, or no `Workbook` stream inside it.
    #[error("Invalid XLS format: {0}")]
    InvalidFormat(String),

    /// A BIFF version other than BIFF8 (Excel 97 and later).
    #[error("Unsupported XLS version: {0}")]
    UnsupportedVersion(String),

    /// A record that does not decode as its type requires.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Core error: {0}")]
    Core(#[from] facture_core::Error),
}
