//! Prelude module - common imports for facture users
//!
//! ```rust
//! use facture::prelude::*;
//! ```

pub use crate::{
    Alignment,
    // Batch types
    BatchJob,
    BatchReport,
    Border,

    CellAddress,
    CellRange,
    // Cell types
    CellValue,
    // Filling types
    ChangeSet,
    Color,

    // Error types
    EngineError,
    EngineResult,
    Error,

    FieldValue,
    Fill,
    Font,
    Formula,
    GeneratedWorkbook,
    HorizontalAlignment,

    // Invoice types
    InvoiceItem,
    InvoicePayload,
    JobOutcome,
    NumberFormat,
    NumberInput,
    OutputWriter,
    Result,

    Style,
    // Main types
    Template,
    VerticalAlignment,
    Workbook,
    // Extension traits
    WorkbookExt,
    Worksheet,

    // I/O types
    XlsxReader,
    XlsxWriter,
};
