//! Shared application state.

use std::path::PathBuf;

use facture_engine::{EngineResult, OutputWriter, Template};
use facture_pdf::PdfRenderer;

use crate::ServerConfig;

/// State shared across workers via `web::Data`.
///
/// The template is loaded once at startup; each request fills a fresh
/// copy, so concurrent requests never see each other's writes.
pub struct AppState {
    pub(crate) template: Template,
    pub(crate) writer: OutputWriter,
    pub(crate) renderer: PdfRenderer,
    pub(crate) output_dir: PathBuf,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> EngineResult<Self> {
        let template = Template::open(&config.template_path)?;
        let writer =
            OutputWriter::new(&config.output_dir).guard_template(&config.template_path);
        Ok(Self {
            template,
            writer,
            renderer: PdfRenderer::new(),
            output_dir: config.output_dir.clone(),
        })
    }

    /// Swap the PDF renderer, e.g. to point at a specific LibreOffice.
    pub fn with_renderer(mut self, renderer: PdfRenderer) -> Self {
        self.renderer = renderer;
        self
    }
}
