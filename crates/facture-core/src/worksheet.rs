//! Worksheet: a named grid of cells

use crate::address::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::storage::{CellData, CellStorage};
use crate::style::Style;
use crate::value::{CellValue, Formula};
use crate::{MAX_COLS, MAX_ROWS};

/// A single sheet in a workbook.
///
/// Cell access comes in paired forms: `*_at(row, col)` with 0-based
/// indices, and A1-string variants that parse the address first and
/// surface parse failures as errors.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    visible: bool,
    cells: CellStorage,
}

impl Worksheet {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            visible: true,
            cells: CellStorage::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name_unchecked<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn validate_position(row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        Ok(())
    }

    // --- Reading cells ---

    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Value at an A1 address; empty cells read as [`CellValue::Empty`].
    pub fn value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.value_at(addr.row, addr.col))
    }

    pub fn value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    pub fn style_index_at(&self, row: u32, col: u16) -> u32 {
        self.cells.get(row, col).map(|c| c.style_index).unwrap_or(0)
    }

    pub fn style_by_index(&self, style_index: u32) -> Option<&Style> {
        self.cells.style_pool().get(style_index)
    }

    pub fn style_at(&self, row: u32, col: u16) -> Option<&Style> {
        let idx = self.style_index_at(row, col);
        if idx == 0 {
            return None;
        }
        self.style_by_index(idx)
    }

    pub fn style(&self, address: &str) -> Result<Option<&Style>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.style_at(addr.row, addr.col))
    }

    // --- Writing cells ---

    pub fn set_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_value_at(addr.row, addr.col, value)
    }

    pub fn set_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        Self::validate_position(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    /// Store a formula without a cached result. A leading '=' is stripped.
    pub fn set_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_formula_at(addr.row, addr.col, formula)
    }

    pub fn set_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        let text = formula.strip_prefix('=').unwrap_or(formula);
        self.set_value_at(row, col, CellValue::Formula(Formula::new(text)))
    }

    pub fn set_style(&mut self, address: &str, style: &Style) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_style_at(addr.row, addr.col, style)
    }

    pub fn set_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        Self::validate_position(row, col)?;
        let idx = self.cells.style_pool_mut().get_or_insert(style.clone());
        self.cells.set_style(row, col, idx);
        Ok(())
    }

    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.clear_cell_at(addr.row, addr.col);
        Ok(())
    }

    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(row, col);
    }

    // --- Extent and iteration ---

    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bounding rectangle of populated cells.
    pub fn used_range(&self) -> Option<CellRange> {
        let (min_row, min_col, max_row, max_col) = self.cells.used_bounds()?;
        Some(CellRange::from_indices(min_row, min_col, max_row, max_col))
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells.iter_row(row)
    }

    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.row_indices()
    }

    // --- Row and column dimensions ---

    pub fn row_height(&self, row: u32) -> f64 {
        self.cells.row_height(row)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.cells.set_row_height(row, height);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.cells.is_row_hidden(row)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        self.cells.set_row_hidden(row, hidden);
    }

    pub fn column_width(&self, col: u16) -> f64 {
        self.cells.column_width(col)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.cells.set_column_width(col, width);
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.cells.is_column_hidden(col)
    }

    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        self.cells.set_column_hidden(col, hidden);
    }

    pub fn custom_row_heights(&self) -> &std::collections::BTreeMap<u32, f64> {
        self.cells.custom_row_heights()
    }

    pub fn hidden_rows(&self) -> &std::collections::BTreeMap<u32, bool> {
        self.cells.hidden_rows()
    }

    pub fn custom_column_widths(&self) -> &std::collections::BTreeMap<u16, f64> {
        self.cells.custom_column_widths()
    }

    pub fn hidden_columns(&self) -> &std::collections::BTreeMap<u16, bool> {
        self.cells.hidden_columns()
    }

    // --- Merged regions ---

    pub fn merged_regions(&self) -> &[CellRange] {
        self.cells.merged_regions()
    }

    /// Merge a rectangular range. Overlapping an existing region is an error.
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        Self::validate_position(range.end.row, range.end.col)?;
        if self
            .cells
            .merged_regions()
            .iter()
            .any(|existing| existing.overlaps(range))
        {
            return Err(Error::MergedRegionOverlap(range.to_a1_string()));
        }
        self.cells.add_merged_region(*range);
        Ok(())
    }

    /// Remove a merged region matching this exact range.
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        let pos = self
            .cells
            .merged_regions()
            .iter()
            .position(|existing| existing == range);
        match pos {
            Some(idx) => {
                self.cells.remove_merged_region(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_merged_at(&self, row: u32, col: u16) -> bool {
        self.cells.is_merged(row, col)
    }
}
