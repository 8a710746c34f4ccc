//! # facture-core
//!
//! In-memory workbook model for the facture invoice generator.
//!
//! The types here carry everything a loaded template needs to survive a
//! read-modify-write cycle intact:
//! - [`CellValue`] - cell contents (numbers, strings, booleans, errors, formulas)
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//! - [`Style`] - cell formatting, deduplicated through a [`StylePool`]
//! - [`Workbook`] and [`Worksheet`] - the document structure
//!
//! Everything is `Clone`: generation works on a deep copy of the loaded
//! template, so the original workbook value is never touched.
//!
//! ## Example
//!
//! ```rust
//! use facture_core::{Workbook, CellValue};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_value("A1", "Invoice").unwrap();
//! sheet.set_value("B1", 42.0).unwrap();
//!
//! // Indices are 0-based: (row, col)
//! sheet.set_value_at(1, 0, CellValue::from("Total")).unwrap();
//! ```

pub mod address;
pub mod dates;
pub mod error;
pub mod storage;
pub mod style;
pub mod value;
pub mod workbook;
pub mod worksheet;

pub use address::{CellAddress, CellRange};
pub use error::{Error, Result};
pub use storage::{CellData, CellStorage};
pub use style::{
    Alignment, Border, BorderEdge, Color, Fill, Font, HorizontalAlignment, LineStyle,
    NumberFormat, PatternType, Style, StylePool, Underline, VerticalAlignment,
};
pub use value::{CellError, CellValue, Formula, SharedString, StringPool};
pub use workbook::{DefinedName, Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
