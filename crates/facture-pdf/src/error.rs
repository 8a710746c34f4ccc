//! Error types for PDF conversion.

use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("LibreOffice not found. Install LibreOffice and ensure 'libreoffice' or 'soffice' is in PATH.")]
    RendererNotFound,

    #[error("Failed to run LibreOffice: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("LibreOffice conversion failed ({status}): {stderr}")]
    ConversionFailed { status: ExitStatus, stderr: String },

    #[error("Conversion timeout: LibreOffice did not finish within {0} seconds")]
    Timeout(u64),

    #[error("LibreOffice exited successfully but no PDF was produced")]
    MissingOutput,
}

pub type Result<T> = std::result::Result<T, RenderError>;
