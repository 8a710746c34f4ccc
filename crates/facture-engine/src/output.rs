//! Output file writing

use std::fs;
use std::path::{Component, Path, PathBuf};

use facture_xlsx::XlsxWriter;
use log::info;

use crate::error::{EngineError, EngineResult};
use crate::filename::output_basename;
use crate::template::GeneratedWorkbook;

/// Writes generated workbooks under one output directory.
///
/// Output is always the modern `.xlsx` container, whatever format the
/// template was loaded from. Names are sanitized before they touch the
/// filesystem and the resolved path must stay a single component below
/// the output directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    template_path: Option<PathBuf>,
}

impl OutputWriter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        OutputWriter {
            output_dir: output_dir.into(),
            template_path: None,
        }
    }

    /// Refuse writes that would land on the given template file.
    pub fn guard_template<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Serialize a workbook to `<output_dir>/<sanitized name>.xlsx`,
    /// creating the directory on demand. Returns the written path.
    pub fn write(&self, generated: &GeneratedWorkbook, name: &str) -> EngineResult<PathBuf> {
        let file_name = format!("{}.xlsx", output_basename(name));
        let path = self.output_dir.join(&file_name);
        self.ensure_inside(&path)?;

        fs::create_dir_all(&self.output_dir).map_err(|e| EngineError::Write {
            path: self.output_dir.clone(),
            source: e.into(),
        })?;

        if self.is_template(&path) {
            return Err(EngineError::TemplateOverwrite(path));
        }

        XlsxWriter::write_file(generated.workbook(), &path).map_err(|e| EngineError::Write {
            path: path.clone(),
            source: e,
        })?;

        info!("Excel file generated: {}", path.display());
        Ok(path)
    }

    /// The joined path must be exactly one plain component below the
    /// output directory.
    fn ensure_inside(&self, path: &Path) -> EngineResult<()> {
        let inside = path
            .strip_prefix(&self.output_dir)
            .map(|rest| {
                let mut parts = rest.components();
                matches!(parts.next(), Some(Component::Normal(_))) && parts.next().is_none()
            })
            .unwrap_or(false);
        if inside {
            Ok(())
        } else {
            Err(EngineError::PathOutsideOutputDir(path.to_path_buf()))
        }
    }

    /// Compare against the guarded template path through the
    /// filesystem, so `uploads/../template.xlsx` style aliases match.
    fn is_template(&self, path: &Path) -> bool {
        let template = match &self.template_path {
            Some(t) => t,
            None => return false,
        };
        let resolved = match (path.parent(), path.file_name()) {
            (Some(dir), Some(name)) => dir.canonicalize().ok().map(|d| d.join(name)),
            _ => None,
        };
        match (template.canonicalize().ok(), resolved) {
            (Some(t), Some(r)) => t == r,
            _ => template.as_path() == path,
        }
    }
}
