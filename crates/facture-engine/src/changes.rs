//! Cell-level change sets

use std::collections::BTreeMap;

use facture_core::CellAddress;

use crate::error::{EngineError, EngineResult};
use crate::field::FieldValue;

/// The set of cell writes for one generated output.
///
/// Keys are canonical addresses, so `a1` and `A1` land on the same
/// entry and the later write wins. Iteration order is row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    entries: BTreeMap<CellAddress, FieldValue>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a write, parsing and bounds-checking the address.
    pub fn set(&mut self, address: &str, value: FieldValue) -> EngineResult<()> {
        let addr = Self::parse_address(address)?;
        self.entries.insert(addr, value);
        Ok(())
    }

    /// Add a write for an already-validated address.
    pub fn set_at(&mut self, address: CellAddress, value: FieldValue) {
        self.entries.insert(address, value);
    }

    pub fn get(&self, address: &CellAddress) -> Option<&FieldValue> {
        self.entries.get(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellAddress, &FieldValue)> {
        self.entries.iter()
    }

    /// Parse one `CELL=VALUE` assignment line, classifying the value.
    pub fn parse_assignment(line: &str) -> EngineResult<(CellAddress, FieldValue)> {
        let (cell, value) = line.split_once('=').ok_or_else(|| {
            EngineError::Validation(format!("Expected CELL=VALUE, got '{}'", line.trim()))
        })?;
        let addr = Self::parse_address(cell)?;
        Ok((addr, FieldValue::parse(value.trim())))
    }

    fn parse_address(address: &str) -> EngineResult<CellAddress> {
        match CellAddress::parse(address) {
            Ok(addr) => Ok(addr),
            // Core's address messages already name the offending input
            Err(facture_core::Error::InvalidAddress(msg)) => Err(EngineError::InvalidAddress(msg)),
            Err(_) => Err(EngineError::InvalidAddress(format!(
                "'{}' is out of bounds",
                address.trim()
            ))),
        }
    }
}
