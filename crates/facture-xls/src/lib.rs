//! # facture-xls
//!
//! XLS (BIFF8) reader for facture.
//!
//! This crate reads the legacy Excel binary format (.xls) so that old
//! invoice templates can be opened. Output always goes through the
//! `facture-xlsx` writer; there is no XLS writer here.

pub mod biff;
pub mod error;
pub mod reader;

mod styles;

pub use error::{XlsError, XlsResult};
pub use reader::XlsReader;
