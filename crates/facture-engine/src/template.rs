//! Template loading and copy-on-write generation

use std::path::{Path, PathBuf};

use facture_core::Workbook;
#[cfg(feature = "xls")]
use facture_xls::XlsReader;
use facture_xlsx::XlsxReader;
use log::info;

use crate::changes::ChangeSet;
use crate::error::{EngineError, EngineResult};

/// An immutable workbook snapshot loaded from a template file.
///
/// The snapshot is never written to. Every generation starts from a
/// fresh clone, so one `Template` can back any number of outputs and
/// the file on disk stays byte-identical.
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    workbook: Workbook,
}

impl Template {
    /// Load a template, dispatching on the file extension:
    /// `.xlsx`/`.xlsm` through the OOXML reader, `.xls` through the
    /// legacy BIFF8 reader (feature `xls`, on by default).
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(EngineError::TemplateNotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let workbook = match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => {
                XlsxReader::read_file(path).map_err(|e| EngineError::Template {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            }
            #[cfg(feature = "xls")]
            Some("xls") => XlsReader::read_file(path).map_err(|e| EngineError::Template {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            _ => {
                return Err(EngineError::Template {
                    path: path.to_path_buf(),
                    message: "unsupported file format".into(),
                })
            }
        };

        info!(
            "Loaded template {} ({} sheets)",
            path.display(),
            workbook.sheet_count()
        );
        Ok(Template {
            path: path.to_path_buf(),
            workbook,
        })
    }

    /// Wrap an in-memory workbook, for callers that build templates
    /// programmatically.
    pub fn from_workbook(workbook: Workbook) -> Self {
        Template {
            path: PathBuf::new(),
            workbook,
        }
    }

    /// Path the template was loaded from; empty for in-memory templates.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Clone the full workbook for one generation.
    pub(crate) fn instantiate(&self) -> Workbook {
        self.workbook.clone()
    }

    /// Apply a change set to a fresh copy of the template.
    ///
    /// Writes land on the active sheet. A written cell keeps its
    /// template style; every other cell keeps value, style, and formula
    /// untouched.
    pub fn apply(&self, changes: &ChangeSet) -> EngineResult<GeneratedWorkbook> {
        let mut workbook = self.instantiate();
        let active = workbook.active_sheet();
        let count = workbook.sheet_count();
        let sheet = workbook
            .worksheet_mut(active)
            .ok_or(EngineError::Core(facture_core::Error::SheetOutOfBounds(
                active, count,
            )))?;

        for (addr, value) in changes.iter() {
            sheet.set_value_at(addr.row, addr.col, value.to_cell_value())?;
        }

        Ok(GeneratedWorkbook::new(workbook))
    }
}

/// The product of one generation: an owned workbook, detached from the
/// template it was cloned from.
#[derive(Debug, Clone)]
pub struct GeneratedWorkbook {
    workbook: Workbook,
}

impl GeneratedWorkbook {
    pub(crate) fn new(workbook: Workbook) -> Self {
        GeneratedWorkbook { workbook }
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use facture_core::{CellValue, Style};
    use pretty_assertions::assert_eq;

    fn template_with_header() -> Template {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.set_value("A1", "Header").unwrap();
        sheet.set_style("A1", &Style::new().bold(true)).unwrap();
        sheet.set_formula("C3", "A1&\" copy\"").unwrap();
        Template::from_workbook(workbook)
    }

    #[test]
    fn untouched_cells_survive_apply() {
        let template = template_with_header();

        let mut changes = ChangeSet::new();
        changes.set("A2", FieldValue::parse("John Doe")).unwrap();
        changes.set("B2", FieldValue::parse("5000")).unwrap();
        let generated = template.apply(&changes).unwrap();

        let sheet = generated.workbook().worksheet(0).unwrap();
        assert_eq!(sheet.value("A1").unwrap().as_str(), Some("Header"));
        assert_eq!(sheet.value("A2").unwrap().as_str(), Some("John Doe"));
        assert_eq!(sheet.value("B2").unwrap(), CellValue::Number(5000.0));
        assert!(sheet.style("A1").unwrap().map(|s| s.font.bold).unwrap_or(false));
        match sheet.value("C3").unwrap() {
            CellValue::Formula(f) => assert_eq!(f.text, "A1&\" copy\""),
            other => panic!("expected formula, got {other:?}"),
        }
    }

    #[test]
    fn the_template_itself_is_never_mutated() {
        let template = template_with_header();
        let before = template.workbook().clone();

        let mut changes = ChangeSet::new();
        changes.set("A1", FieldValue::parse("overwritten")).unwrap();
        template.apply(&changes).unwrap();

        let sheet = template.workbook().worksheet(0).unwrap();
        assert_eq!(sheet.value("A1").unwrap().as_str(), Some("Header"));
        assert_eq!(
            sheet.cell_count(),
            before.worksheet(0).unwrap().cell_count()
        );
    }

    #[test]
    fn writes_keep_the_template_style() {
        let template = template_with_header();

        let mut changes = ChangeSet::new();
        changes.set("A1", FieldValue::parse("replaced")).unwrap();
        let generated = template.apply(&changes).unwrap();

        let sheet = generated.workbook().worksheet(0).unwrap();
        assert!(sheet.style("A1").unwrap().map(|s| s.font.bold).unwrap_or(false));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = Template::open("no/such/template.xlsx").unwrap_err();
        assert!(matches!(err, EngineError::TemplateNotFound(_)));
    }
}
