//! # facture-xlsx
//!
//! XLSX (Office Open XML) reader and writer for facture workbooks.
//!
//! The codec round-trips what an invoice template needs to survive a
//! fill: cell values, formulas with cached results, styles, number
//! formats, merged regions, row heights, column widths, and the date
//! system flag.

pub mod error;
pub mod reader;
pub mod writer;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
