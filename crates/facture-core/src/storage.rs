//! Sparse cell storage
//!
//! Cells live in nested maps keyed by row then column, so iteration is
//! row-major and memory stays proportional to the number of populated
//! cells. Each sheet owns its own string and style pools.

use std::collections::BTreeMap;

use crate::address::CellRange;
use crate::style::StylePool;
use crate::value::{CellValue, StringPool};

/// A cell's value together with its style pool index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    pub value: CellValue,
    /// Index into the sheet's style pool; 0 is the default style.
    pub style_index: u32,
}

impl CellData {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style_index: 0,
        }
    }

    pub fn with_style(value: CellValue, style_index: u32) -> Self {
        Self { value, style_index }
    }

    /// Empty value and default style; such cells are dropped from storage.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style_index == 0
    }
}

/// Sparse storage for one sheet's cells, dimensions, and merged regions.
#[derive(Debug, Clone, Default)]
pub struct CellStorage {
    cells: BTreeMap<u32, BTreeMap<u16, CellData>>,
    merged_regions: Vec<CellRange>,
    row_heights: BTreeMap<u32, f64>,
    hidden_rows: BTreeMap<u32, bool>,
    column_widths: BTreeMap<u16, f64>,
    hidden_columns: BTreeMap<u16, bool>,
    default_row_height: f64,
    default_column_width: f64,
    string_pool: StringPool,
    style_pool: StylePool,
}

const DEFAULT_ROW_HEIGHT: f64 = 15.0;
const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

impl CellStorage {
    pub fn new() -> Self {
        Self {
            default_row_height: DEFAULT_ROW_HEIGHT,
            default_column_width: DEFAULT_COLUMN_WIDTH,
            ..Self::default()
        }
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(&row).and_then(|r| r.get(&col))
    }

    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.cells.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Store a cell outright, replacing value and style.
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        if data.is_empty() {
            self.remove(row, col);
            return;
        }
        self.cells.entry(row).or_default().insert(col, data);
    }

    /// Set a cell's value, keeping any existing style.
    ///
    /// Owned strings are interned through the sheet's string pool.
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        let value = match value {
            CellValue::String(s) => CellValue::SharedString(self.string_pool.intern(&s)),
            other => other,
        };

        let style_index = self.get(row, col).map(|c| c.style_index).unwrap_or(0);
        self.set(row, col, CellData { value, style_index });
    }

    /// Set a cell's style index, keeping any existing value.
    pub fn set_style(&mut self, row: u32, col: u16, style_index: u32) {
        let value = self
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty);
        self.set(row, col, CellData { value, style_index });
    }

    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellData> {
        let row_map = self.cells.get_mut(&row)?;
        let removed = row_map.remove(&col);
        if row_map.is_empty() {
            self.cells.remove(&row);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of populated cells.
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// (min_row, min_col, max_row, max_col) of populated cells.
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let min_row = *self.cells.keys().next()?;
        let max_row = *self.cells.keys().next_back()?;

        let mut min_col = u16::MAX;
        let mut max_col = 0u16;
        for row_map in self.cells.values() {
            if let (Some(first), Some(last)) = (row_map.keys().next(), row_map.keys().next_back()) {
                min_col = min_col.min(*first);
                max_col = max_col.max(*last);
            }
        }

        Some((min_row, min_col, max_row, max_col))
    }

    /// Row-major iteration over populated cells.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, data)| (row, col, data)))
    }

    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(&col, data)| (col, data)))
    }

    /// Indices of rows that hold at least one cell.
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.keys().copied()
    }

    // --- Row and column dimensions ---

    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    pub fn row_height(&self, row: u32) -> f64 {
        self.row_heights
            .get(&row)
            .copied()
            .unwrap_or(self.default_row_height)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden_rows.get(&row).copied().unwrap_or(false)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        if hidden {
            self.hidden_rows.insert(row, true);
        } else {
            self.hidden_rows.remove(&row);
        }
    }

    pub fn default_column_width(&self) -> f64 {
        self.default_column_width
    }

    pub fn column_width(&self, col: u16) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.hidden_columns.get(&col).copied().unwrap_or(false)
    }

    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        if hidden {
            self.hidden_columns.insert(col, true);
        } else {
            self.hidden_columns.remove(&col);
        }
    }

    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    pub fn hidden_rows(&self) -> &BTreeMap<u32, bool> {
        &self.hidden_rows
    }

    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    pub fn hidden_columns(&self) -> &BTreeMap<u16, bool> {
        &self.hidden_columns
    }

    // --- Merged regions ---

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    pub fn add_merged_region(&mut self, range: CellRange) {
        self.merged_regions.push(range);
    }

    pub fn remove_merged_region(&mut self, index: usize) -> Option<CellRange> {
        if index < self.merged_regions.len() {
            Some(self.merged_regions.remove(index))
        } else {
            None
        }
    }

    pub fn is_merged(&self, row: u32, col: u16) -> bool {
        let addr = crate::CellAddress::new(row, col);
        self.merged_regions.iter().any(|r| r.contains(&addr))
    }

    // --- Pools ---

    pub fn string_pool(&self) -> &StringPool {
        &self.string_pool
    }

    pub fn string_pool_mut(&mut self) -> &mut StringPool {
        &mut self.string_pool
    }

    pub fn style_pool(&self) -> &StylePool {
        &self.style_pool
    }

    pub fn style_pool_mut(&mut self) -> &mut StylePool {
        &mut self.style_pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_value_keeps_style() {
        let mut storage = CellStorage::new();
        storage.set(4, 3, CellData::with_style(CellValue::Number(1.0), 7));
        storage.set_value(4, 3, CellValue::Number(2.0));

        let cell = storage.get(4, 3).unwrap();
        assert_eq!(cell.value, CellValue::Number(2.0));
        assert_eq!(cell.style_index, 7);
    }

    #[test]
    fn set_style_keeps_value() {
        let mut storage = CellStorage::new();
        storage.set_value(0, 0, CellValue::Number(42.0));
        storage.set_style(0, 0, 3);

        let cell = storage.get(0, 0).unwrap();
        assert_eq!(cell.value, CellValue::Number(42.0));
        assert_eq!(cell.style_index, 3);
    }

    #[test]
    fn strings_are_interned() {
        let mut storage = CellStorage::new();
        storage.set_value(0, 0, CellValue::from("Services"));
        storage.set_value(1, 0, CellValue::from("Services"));

        assert_eq!(storage.string_pool().len(), 1);
        assert!(matches!(
            storage.get(0, 0).unwrap().value,
            CellValue::SharedString(_)
        ));
    }

    #[test]
    fn empty_cells_are_dropped() {
        let mut storage = CellStorage::new();
        storage.set_value(5, 5, CellValue::Number(1.0));
        assert_eq!(storage.cell_count(), 1);

        storage.set(5, 5, CellData::new(CellValue::Empty));
        assert_eq!(storage.cell_count(), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn style_only_cells_survive() {
        let mut storage = CellStorage::new();
        storage.set_style(2, 2, 5);
        assert_eq!(storage.cell_count(), 1);
        assert!(storage.get(2, 2).unwrap().value.is_empty());
    }

    #[test]
    fn used_bounds_tracks_extremes() {
        let mut storage = CellStorage::new();
        assert_eq!(storage.used_bounds(), None);

        storage.set_value(11, 0, CellValue::Number(1.0));
        storage.set_value(35, 3, CellValue::Number(2.0));
        assert_eq!(storage.used_bounds(), Some((11, 0, 35, 3)));
    }

    #[test]
    fn iteration_is_row_major() {
        let mut storage = CellStorage::new();
        storage.set_value(1, 1, CellValue::Number(3.0));
        storage.set_value(0, 2, CellValue::Number(1.0));
        storage.set_value(0, 0, CellValue::Number(0.0));

        let order: Vec<(u32, u16)> = storage.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 0), (0, 2), (1, 1)]);
    }

    #[test]
    fn row_and_column_dimensions() {
        let mut storage = CellStorage::new();
        assert_eq!(storage.row_height(3), DEFAULT_ROW_HEIGHT);

        storage.set_row_height(3, 20.0);
        storage.set_column_width(2, 14.5);
        storage.set_row_hidden(9, true);

        assert_eq!(storage.row_height(3), 20.0);
        assert_eq!(storage.column_width(2), 14.5);
        assert!(storage.is_row_hidden(9));
        assert!(!storage.is_row_hidden(8));

        storage.set_row_hidden(9, false);
        assert!(storage.hidden_rows().is_empty());
    }

    #[test]
    fn clone_is_independent() {
        let mut original = CellStorage::new();
        original.set_value(0, 0, CellValue::from("Template"));

        let mut copy = original.clone();
        copy.set_value(0, 0, CellValue::from("Filled"));

        assert_eq!(original.get(0, 0).unwrap().value.as_str(), Some("Template"));
        assert_eq!(copy.get(0, 0).unwrap().value.as_str(), Some("Filled"));
    }
}
