//! # facture
//!
//! A Rust toolkit for generating Excel invoices from a template workbook.
//!
//! Facture opens a prepared `.xlsx` or `.xls` template, fills the cells an
//! invoice needs (customer block, invoice number, line items, total), and
//! writes the result as a new XLSX file. The template itself is never
//! modified; every fill works on a fresh copy.
//!
//! ## Features
//!
//! - Read and write XLSX files (Office Open XML)
//! - Read XLS templates (legacy BIFF8 format) - optional
//! - Copy-on-write template filling via [`Template`] and [`ChangeSet`]
//! - Typed field values, so a "5" from a form lands as the number 5
//! - Filename sanitation for user-supplied output names
//! - Batch generation from job lists
//!
//! ## Example
//!
//! ```rust
//! use facture::prelude::*;
//!
//! // Build a template in memory (normally this comes from Template::open)
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_value("A1", "INVOICE").unwrap();
//! sheet.set_formula("D36", "SUM(D17:D24)").unwrap();
//!
//! // Fill a copy of it
//! let template = Template::from_workbook(workbook);
//! let mut changes = ChangeSet::new();
//! changes.set("A12", FieldValue::parse("Acme Ltd")).unwrap();
//! changes.set("D5", FieldValue::parse("1042")).unwrap();
//! let filled = template.apply(&changes).unwrap();
//!
//! let sheet = filled.workbook().worksheet(0).unwrap();
//! assert_eq!(sheet.value("D5").unwrap(), CellValue::Number(1042.0));
//!
//! // Save to file
//! // filled.workbook().save("invoice.xlsx").unwrap();
//! ```

pub mod prelude;

// Re-export core types
pub use facture_core::{
    Alignment,
    Border,
    BorderEdge,
    CellAddress,
    CellData,

    CellError,
    CellRange,
    // Cell types
    CellValue,
    Color,
    DefinedName,
    // Error types
    Error,
    Fill,
    Font,
    Formula,
    HorizontalAlignment,
    LineStyle,
    NumberFormat,
    PatternType,

    Result,
    SharedString,

    // Style types
    Style,
    StylePool,
    Underline,
    VerticalAlignment,
    // Main types
    Workbook,
    WorkbookSettings,
    Worksheet,

    MAX_COLS,
    // Constants
    MAX_ROWS,
    MAX_SHEET_NAME_LEN,
};

// Re-export invoice generation types
pub use facture_engine::{
    generate_batch, generate_invoice, output_basename, safe_filename, BatchJob, BatchReport,
    ChangeSet, EngineError, EngineResult, FieldValue, GeneratedWorkbook, InvoiceItem,
    InvoicePayload, JobOutcome, NumberInput, OutputWriter, Template,
};

// Re-export I/O types
pub use facture_xlsx::{XlsxError, XlsxReader, XlsxWriter};

#[cfg(feature = "xls")]
pub use facture_xls::{XlsError, XlsReader};

use std::path::Path;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open a workbook from a file, picking the reader by extension
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save the workbook to a file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => {
                XlsxReader::read_file(path).map_err(|e| Error::other(e.to_string()))
            }
            #[cfg(feature = "xls")]
            Some("xls") => XlsReader::read_file(path).map_err(|e| Error::other(e.to_string())),
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        // Output is always OOXML; legacy formats are read-only.
        match extension.as_deref() {
            Some("xlsx") => {
                XlsxWriter::write_file(self, path).map_err(|e| Error::other(e.to_string()))
            }
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }
}
