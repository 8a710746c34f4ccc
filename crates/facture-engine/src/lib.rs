//! # facture-engine
//!
//! The template-filling core of facture: load an invoice template once,
//! then stamp out generated workbooks from invoice payloads or raw cell
//! change sets.
//!
//! The flow is copy-on-write. A [`Template`] is an immutable snapshot
//! of the spreadsheet on disk; every generation clones it, applies its
//! writes, and hands back an owned [`GeneratedWorkbook`] that an
//! [`OutputWriter`] serializes to `.xlsx` under a sanitized name. The
//! template value and the template file are never touched.
//!
//! ## Example
//!
//! ```rust
//! use facture_core::Workbook;
//! use facture_engine::{ChangeSet, FieldValue, Template};
//!
//! let mut workbook = Workbook::new();
//! workbook.worksheet_mut(0).unwrap().set_value("A1", "Header").unwrap();
//! let template = Template::from_workbook(workbook);
//!
//! let mut changes = ChangeSet::new();
//! changes.set("A2", FieldValue::parse("John Doe")).unwrap();
//! changes.set("B2", FieldValue::parse("5000")).unwrap();
//!
//! let generated = template.apply(&changes).unwrap();
//! let sheet = generated.workbook().worksheet(0).unwrap();
//! assert_eq!(sheet.value("A1").unwrap().as_str(), Some("Header"));
//! assert_eq!(sheet.value("B2").unwrap().as_number(), Some(5000.0));
//! ```

pub mod batch;
pub mod changes;
pub mod error;
pub mod field;
pub mod filename;
pub mod invoice;
pub mod output;
pub mod template;

pub use batch::{generate_batch, BatchJob, BatchReport, JobOutcome};
pub use changes::ChangeSet;
pub use error::{EngineError, EngineResult};
pub use field::FieldValue;
pub use filename::{output_basename, safe_filename};
pub use invoice::{generate_invoice, InvoiceItem, InvoicePayload, NumberInput};
pub use output::OutputWriter;
pub use template::{GeneratedWorkbook, Template};
