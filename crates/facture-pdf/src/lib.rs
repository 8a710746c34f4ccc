//! Spreadsheet-to-PDF conversion for facture.
//!
//! Drives a headless LibreOffice (`--convert-to pdf`) as a short-lived
//! child process. No UNO bindings are involved: the converter executable
//! is located on the host (`/snap/bin/libreoffice`, then `libreoffice`,
//! then `soffice`), run with null stdio, and bounded by a timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use facture_pdf::PdfRenderer;
//!
//! # async fn example() -> facture_pdf::error::Result<()> {
//! let renderer = PdfRenderer::new();
//! let pdf = renderer.render("uploads/invoice.xlsx", "uploads").await?;
//! println!("wrote {}", pdf.display());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod renderer;

pub use error::RenderError;
pub use renderer::PdfRenderer;
