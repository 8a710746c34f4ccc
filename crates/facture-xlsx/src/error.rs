//! Error type for the XLSX codec.

use thiserror::Error;

pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Anything that can go wrong while reading or writing the zip
/// container and its XML parts.
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The file is not an XLSX package at all.
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// The archive is a zip but lacks a part the format requires.
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// A part exists but its content does not parse.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Core error: {0}")]
    Core(#[from] facture_core::Error),
}
