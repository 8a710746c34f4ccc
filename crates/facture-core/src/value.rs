//! Cell values and string interning

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An interned string shared between cells.
///
/// Workbooks repeat the same text in many cells (item types, headers),
/// so string cells hold an `Arc<str>` handed out by the [`StringPool`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SharedString(pub Arc<str>);

impl SharedString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString(Arc::from(s))
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString(Arc::from(s.as_str()))
    }
}

/// Interning pool for cell strings.
///
/// Each distinct string is stored once; repeated inserts return clones of
/// the same `Arc`.
#[derive(Debug, Default, Clone)]
pub struct StringPool {
    strings: HashMap<Arc<str>, SharedString>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the shared handle.
    pub fn intern(&mut self, s: &str) -> SharedString {
        if let Some(existing) = self.strings.get(s) {
            return existing.clone();
        }
        let arc: Arc<str> = Arc::from(s);
        let shared = SharedString(arc.clone());
        self.strings.insert(arc, shared.clone());
        shared
    }

    /// Number of distinct strings in the pool.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Error values a cell can hold, with their BIFF error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #NULL!
    Null,
    /// #DIV/0!
    DivideByZero,
    /// #VALUE!
    Value,
    /// #REF!
    Ref,
    /// #NAME?
    Name,
    /// #NUM!
    Num,
    /// #N/A
    NotAvailable,
    /// #GETTING_DATA
    GettingData,
}

impl CellError {
    /// The literal error text as it appears in a sheet.
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::DivideByZero => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::NotAvailable => "#N/A",
            CellError::GettingData => "#GETTING_DATA",
        }
    }

    /// BIFF error code used by the legacy binary format.
    pub fn biff_code(&self) -> u8 {
        match self {
            CellError::Null => 0x00,
            CellError::DivideByZero => 0x07,
            CellError::Value => 0x0F,
            CellError::Ref => 0x17,
            CellError::Name => 0x1D,
            CellError::Num => 0x24,
            CellError::NotAvailable => 0x2A,
            CellError::GettingData => 0x2B,
        }
    }

    /// Decode a BIFF error code.
    pub fn from_biff_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(CellError::Null),
            0x07 => Some(CellError::DivideByZero),
            0x0F => Some(CellError::Value),
            0x17 => Some(CellError::Ref),
            0x1D => Some(CellError::Name),
            0x24 => Some(CellError::Num),
            0x2A => Some(CellError::NotAvailable),
            0x2B => Some(CellError::GettingData),
            _ => None,
        }
    }

    /// Parse the display text ("#REF!", "#DIV/0!", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::DivideByZero),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::NotAvailable),
            "#GETTING_DATA" => Some(CellError::GettingData),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A formula with its last computed value.
///
/// Formulas are carried as stored text plus the cached result read from
/// or written to the file; nothing here evaluates them.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    /// Formula text without the leading '='
    pub text: String,
    /// Result cached in the file, if any
    pub cached_value: Option<Box<CellValue>>,
}

impl Formula {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cached_value: None,
        }
    }

    pub fn with_cached_value(text: impl Into<String>, value: CellValue) -> Self {
        Self {
            text: text.into(),
            cached_value: Some(Box::new(value)),
        }
    }
}

/// The value held by a single cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    /// Owned string (used transiently before interning)
    String(String),
    /// Interned string from the workbook pool
    SharedString(SharedString),
    Error(CellError),
    Formula(Formula),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Short type tag, used in log lines and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Number(_) => "number",
            CellValue::Bool(_) => "boolean",
            CellValue::String(_) | CellValue::SharedString(_) => "string",
            CellValue::Error(_) => "error",
            CellValue::Formula(_) => "formula",
        }
    }

    /// Numeric content, if this cell holds one.
    ///
    /// Formulas yield their cached value when it is numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Formula(f) => f.cached_value.as_deref().and_then(CellValue::as_number),
            _ => None,
        }
    }

    /// String content, if this cell holds one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            CellValue::SharedString(s) => Some(s.as_str()),
            CellValue::Formula(f) => f.cached_value.as_deref().and_then(CellValue::as_str),
            _ => None,
        }
    }

    /// Display text as a sheet would show it (formulas show as "=text").
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::SharedString(s) => s.as_str().to_string(),
            CellValue::Error(e) => e.as_str().to_string(),
            CellValue::Formula(f) => format!("={}", f.text),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

impl From<Formula> for CellValue {
    fn from(f: Formula) -> Self {
        CellValue::Formula(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn string_pool_interns_duplicates() {
        let mut pool = StringPool::new();
        let a = pool.intern("Services");
        let b = pool.intern("Services");
        let c = pool.intern("Goods");

        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert!(!Arc::ptr_eq(&a.0, &c.0));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn error_codes_round_trip() {
        for err in [
            CellError::Null,
            CellError::DivideByZero,
            CellError::Value,
            CellError::Ref,
            CellError::Name,
            CellError::Num,
            CellError::NotAvailable,
            CellError::GettingData,
        ] {
            assert_eq!(CellError::from_biff_code(err.biff_code()), Some(err));
            assert_eq!(CellError::parse(err.as_str()), Some(err));
        }
        assert_eq!(CellError::from_biff_code(0x55), None);
        assert_eq!(CellError::parse("#BOGUS!"), None);
    }

    #[test]
    fn formula_cached_value_flows_through_accessors() {
        let formula = Formula::with_cached_value("B17*C17", CellValue::Number(25.0));
        let value = CellValue::Formula(formula);
        assert_eq!(value.as_number(), Some(25.0));
        assert_eq!(value.to_display_string(), "=B17*C17");
    }

    #[test]
    fn display_strings() {
        assert_eq!(CellValue::Number(42.0).to_display_string(), "42");
        assert_eq!(CellValue::Number(2.5).to_display_string(), "2.5");
        assert_eq!(CellValue::Bool(true).to_display_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_display_string(), "");
        assert_eq!(
            CellValue::Error(CellError::Ref).to_display_string(),
            "#REF!"
        );
    }

    #[test]
    fn conversions() {
        assert_eq!(CellValue::from(3), CellValue::Number(3.0));
        assert_eq!(CellValue::from("x"), CellValue::String("x".into()));
        assert_eq!(CellValue::from(true), CellValue::Bool(true));
        assert!(CellValue::default().is_empty());
    }
}
