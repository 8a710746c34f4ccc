//! Error types for facture-engine

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`EngineError`]
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors produced while filling and writing templates
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-bounds cell address, naming the offending key
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Input rejected before any workbook work happened
    #[error("{0}")]
    Validation(String),

    /// No file at the template path
    #[error("Template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The template file exists but could not be decoded
    #[error("Failed to load template {}: {message}", .path.display())]
    Template { path: PathBuf, message: String },

    /// The resolved output path left the output directory
    #[error("Output path escapes the output directory: {}", .0.display())]
    PathOutsideOutputDir(PathBuf),

    /// The output path points at the template file itself
    #[error("Refusing to overwrite the template: {}", .0.display())]
    TemplateOverwrite(PathBuf),

    /// An output file or directory could not be written
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: facture_xlsx::XlsxError,
    },

    /// Workbook model error
    #[error(transparent)]
    Core(facture_core::Error),
}

impl From<facture_core::Error> for EngineError {
    fn from(err: facture_core::Error) -> Self {
        match err {
            facture_core::Error::InvalidAddress(msg) => EngineError::InvalidAddress(msg),
            other => EngineError::Core(other),
        }
    }
}
