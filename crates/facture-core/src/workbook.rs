//! Workbook: an ordered collection of worksheets

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// Characters that may not appear in a sheet name.
const INVALID_NAME_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

/// Workbook-level settings read from and written to the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookSettings {
    /// Date serials count from 1904-01-01 instead of 1900.
    pub date_1904: bool,
}

/// A named reference like `Total = Sheet1!$D$36`.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    pub name: String,
    /// Target in sheet-qualified A1 form
    pub refers_to: String,
    /// Sheet scope; `None` means workbook-global
    pub sheet_id: Option<usize>,
    pub hidden: bool,
}

/// A workbook holding one or more sheets.
#[derive(Debug, Clone)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    active_sheet: usize,
    settings: WorkbookSettings,
    defined_names: Vec<DefinedName>,
}

impl Workbook {
    /// A workbook with a single empty "Sheet1".
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.worksheets.push(Worksheet::new("Sheet1"));
        wb
    }

    /// A workbook with no sheets; readers start from this.
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            active_sheet: 0,
            settings: WorkbookSettings::default(),
            defined_names: Vec::new(),
        }
    }

    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    // --- Sheet access ---

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|s| s.name() == name)
    }

    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|s| s.name() == name)
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    pub fn worksheets_mut(&mut self) -> impl Iterator<Item = &mut Worksheet> {
        self.worksheets.iter_mut()
    }

    /// Index of the sheet shown when the file opens.
    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.active_sheet = index;
        Ok(())
    }

    // --- Adding and removing sheets ---

    /// Add a sheet with a generated name, returning its index.
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.generate_sheet_name();
        self.add_worksheet_with_name(name)
    }

    /// Add a sheet with the given name, returning its index.
    pub fn add_worksheet_with_name<S: Into<String>>(&mut self, name: S) -> Result<usize> {
        let name = name.into();
        self.validate_sheet_name(&name)?;
        self.worksheets.push(Worksheet::new(name));
        Ok(self.worksheets.len() - 1)
    }

    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        let removed = self.worksheets.remove(index);
        if self.active_sheet >= self.worksheets.len() && self.active_sheet > 0 {
            self.active_sheet = self.worksheets.len() - 1;
        }
        Ok(removed)
    }

    pub fn rename_worksheet(&mut self, index: usize, name: &str) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        // Renaming a sheet to its own name is a no-op
        if self.worksheets[index].name() != name {
            self.validate_sheet_name(name)?;
        }
        self.worksheets[index].set_name_unchecked(name);
        Ok(())
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("sheet name is empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "sheet name '{}' exceeds {} characters",
                name, MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| INVALID_NAME_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "sheet name '{}' contains '{}'",
                name, c
            )));
        }
        // Sheet names are case-insensitive in the file format
        if self
            .worksheets
            .iter()
            .any(|s| s.name().eq_ignore_ascii_case(name))
        {
            return Err(Error::DuplicateSheetName(name.to_string()));
        }
        Ok(())
    }

    fn generate_sheet_name(&self) -> String {
        let mut n = self.worksheets.len() + 1;
        loop {
            let candidate = format!("Sheet{}", n);
            if !self
                .worksheets
                .iter()
                .any(|s| s.name().eq_ignore_ascii_case(&candidate))
            {
                return candidate;
            }
            n += 1;
        }
    }

    // --- Defined names ---

    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    pub fn add_defined_name(&mut self, name: DefinedName) {
        self.defined_names.push(name);
    }

    pub fn defined_name(&self, name: &str) -> Option<&DefinedName> {
        self.defined_names.iter().find(|d| d.name == name)
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_has_one_sheet() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.worksheet(0).unwrap().name(), "Sheet1");
    }

    #[test]
    fn add_generates_unique_names() {
        let mut wb = Workbook::new();
        let idx = wb.add_worksheet().unwrap();
        assert_eq!(wb.worksheet(idx).unwrap().name(), "Sheet2");

        wb.add_worksheet_with_name("Sheet3").unwrap();
        let idx = wb.add_worksheet().unwrap();
        assert_eq!(wb.worksheet(idx).unwrap().name(), "Sheet4");
    }

    #[test]
    fn name_validation() {
        let mut wb = Workbook::new();
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb
            .add_worksheet_with_name("a-name-well-over-thirty-one-characters-long")
            .is_err());
        assert!(wb.add_worksheet_with_name("bad/name").is_err());
        assert!(wb.add_worksheet_with_name("bad[name]").is_err());
        // Duplicates are case-insensitive
        assert!(matches!(
            wb.add_worksheet_with_name("SHEET1"),
            Err(Error::DuplicateSheetName(_))
        ));
    }

    #[test]
    fn rename_to_same_name_is_noop() {
        let mut wb = Workbook::new();
        wb.rename_worksheet(0, "Sheet1").unwrap();
        wb.rename_worksheet(0, "Invoice").unwrap();
        assert_eq!(wb.worksheet(0).unwrap().name(), "Invoice");

        wb.add_worksheet_with_name("Other").unwrap();
        assert!(wb.rename_worksheet(1, "invoice").is_err());
    }

    #[test]
    fn remove_adjusts_active_sheet() {
        let mut wb = Workbook::new();
        wb.add_worksheet().unwrap();
        wb.add_worksheet().unwrap();
        wb.set_active_sheet(2).unwrap();

        wb.remove_worksheet(2).unwrap();
        assert_eq!(wb.active_sheet(), 1);
        assert!(wb.set_active_sheet(5).is_err());
    }

    #[test]
    fn lookup_by_name() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Invoice").unwrap();
        assert!(wb.worksheet_by_name("Invoice").is_some());
        assert!(wb.worksheet_by_name("invoice").is_none());
        assert!(wb.worksheet_by_name("Missing").is_none());
    }

    #[test]
    fn defined_names_round_trip() {
        let mut wb = Workbook::new();
        wb.add_defined_name(DefinedName {
            name: "Total".into(),
            refers_to: "Sheet1!$D$36".into(),
            sheet_id: None,
            hidden: false,
        });

        assert_eq!(wb.defined_name("Total").unwrap().refers_to, "Sheet1!$D$36");
        assert!(wb.defined_name("Missing").is_none());
    }
}
