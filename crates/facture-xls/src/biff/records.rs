//! BIFF8 record type constants, per [MS-XLS] §2.3.
//!
//! Only the records the reader consumes are listed.

// Stream structure
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;

// Workbook globals
pub const BOUNDSHEET: u16 = 0x0085; // Per-sheet entry: stream offset, visibility, type, name
pub const SST: u16 = 0x00FC; // Shared String Table
pub const DATEMODE: u16 = 0x0022; // Date system flag, 1900 or 1904
pub const PALETTE: u16 = 0x0092; // Replacement for the built-in 56-color palette
pub const FONT: u16 = 0x0031; // One font of the font table
pub const FORMAT: u16 = 0x041E; // Custom number format code
pub const XF: u16 = 0x00E0; // Extended Format, one cell format

// Cell records
pub const LABELSST: u16 = 0x00FD; // String cell referencing the SST by index
pub const LABEL: u16 = 0x0204; // String cell with the text inline (pre-SST form)
pub const NUMBER: u16 = 0x0203; // Numeric cell, full IEEE 754 double
pub const RK: u16 = 0x027E; // Numeric cell in the compressed RK encoding
pub const MULRK: u16 = 0x00BD; // Run of RK cells sharing one row
pub const BLANK: u16 = 0x0201; // Formatted cell without a value
pub const MULBLANK: u16 = 0x00BE; // Run of formatted blanks in one row
pub const BOOLERR: u16 = 0x0205; // Boolean or error-code cell
pub const FORMULA: u16 = 0x0006; // Formula cell, cached result included
pub const STRING: u16 = 0x0207; // String result belonging to the previous FORMULA

// Sheet structure
pub const ROW: u16 = 0x0208; // Row properties: height, hidden flag, format
pub const COLINFO: u16 = 0x007D; // Column run properties: width, hidden flag, format
pub const MERGECELLS: u16 = 0x00E5; // Merged cell ranges

// BOF subtypes (the `dt` field)
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
pub const BOF_WORKSHEET: u16 = 0x0010;

/// BIFF version we support.
pub const BIFF8_VERSION: u16 = 0x0600;
