//! PDF conversion by driving a headless LibreOffice child process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{RenderError, Result};

/// Executables probed, in order, when no explicit binary is configured.
/// Snap installs are tried first because snap wrappers are not always on PATH.
const CANDIDATES: [&str; 3] = ["/snap/bin/libreoffice", "libreoffice", "soffice"];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Converts spreadsheets to PDF with `libreoffice --headless --convert-to pdf`.
///
/// The converter runs as a short-lived child process with null stdio
/// (stderr is captured for error reporting) and is killed if it exceeds
/// the configured timeout.
pub struct PdfRenderer {
    /// Explicit converter executable. If None, probes `CANDIDATES`.
    binary: Option<PathBuf>,
    /// How long a single conversion may run before the child is killed.
    timeout: Duration,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            binary: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific converter executable instead of probing the defaults.
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Override the conversion timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Convert `input` to a PDF in `out_dir` and return the PDF path.
    ///
    /// LibreOffice names the output after the input stem, so
    /// `uploads/invoice.xlsx` becomes `<out_dir>/invoice.pdf`.
    pub async fn render(&self, input: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let out_dir = out_dir.as_ref();
        let input = absolutize(input.as_ref());

        tracing::info!("Converting {} to PDF", input.display());

        let candidates: Vec<PathBuf> = match &self.binary {
            Some(bin) => vec![bin.clone()],
            None => CANDIDATES.iter().map(PathBuf::from).collect(),
        };

        let mut spawned = None;
        for bin in &candidates {
            let mut cmd = Command::new(bin);
            cmd.arg("--headless")
                .arg("--convert-to")
                .arg("pdf")
                .arg("--outdir")
                .arg(out_dir)
                .arg(&input);
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
            cmd.kill_on_drop(true);

            tracing::debug!("Starting LibreOffice: {:?}", cmd);
            match cmd.spawn() {
                Ok(child) => {
                    spawned = Some(child);
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!("Converter candidate {} not found", bin.display());
                }
                Err(e) => return Err(RenderError::Spawn(e)),
            }
        }
        let child = spawned.ok_or(RenderError::RendererNotFound)?;

        // On timeout the child future is dropped, which kills the process.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(RenderError::Timeout(self.timeout.as_secs())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RenderError::ConversionFailed {
                status: output.status,
                stderr,
            });
        }

        let pdf = pdf_destination(&input, out_dir);
        if !pdf.is_file() {
            return Err(RenderError::MissingOutput);
        }

        tracing::info!("PDF file generated: {}", pdf.display());
        Ok(pdf)
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

/// LibreOffice names the converted file after the input stem.
fn pdf_destination(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    out_dir.join(format!("{stem}.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_is_named_after_the_input_stem() {
        let pdf = pdf_destination(Path::new("uploads/my_invoice.xlsx"), Path::new("uploads"));
        assert_eq!(pdf, Path::new("uploads/my_invoice.pdf"));
    }

    #[test]
    fn destination_keeps_inner_dots() {
        let pdf = pdf_destination(Path::new("/tmp/in/archive.2024.xlsx"), Path::new("/tmp/out"));
        assert_eq!(pdf, Path::new("/tmp/out/archive.2024.pdf"));
    }

    #[tokio::test]
    async fn missing_binary_is_renderer_not_found() {
        let renderer = PdfRenderer::new().binary("/nonexistent/facture-test-soffice");
        let err = renderer.render("in.xlsx", "out").await.unwrap_err();
        assert!(matches!(err, RenderError::RendererNotFound));
    }

    #[tokio::test]
    async fn failing_converter_reports_its_exit() {
        // `false` ignores its arguments and exits non-zero.
        let renderer = PdfRenderer::new().binary("false");
        let err = renderer.render("in.xlsx", "out").await.unwrap_err();
        match err {
            RenderError::ConversionFailed { status, .. } => assert!(!status.success()),
            other => panic!("expected ConversionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exit_without_output_is_reported() {
        // `true` exits successfully without writing anything.
        let dir = tempfile::tempdir().unwrap();
        let renderer = PdfRenderer::new().binary("true");
        let err = renderer.render("in.xlsx", dir.path()).await.unwrap_err();
        assert!(matches!(err, RenderError::MissingOutput));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_conversion_returns_the_pdf_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let xlsx = dir.path().join("invoice.xlsx");
        std::fs::write(&xlsx, b"stub").unwrap();

        // Mimics LibreOffice: writes <outdir>/<stem>.pdf and exits 0.
        let script = dir.path().join("fake-soffice");
        std::fs::write(
            &script,
            "#!/bin/sh\nbase=$(basename \"$6\")\ntouch \"$5/${base%.*}.pdf\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let renderer = PdfRenderer::new().binary(&script);
        let pdf = renderer.render(&xlsx, &out).await.unwrap();

        assert_eq!(pdf, out.join("invoice.pdf"));
        assert!(pdf.is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_converter_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-soffice");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let renderer = PdfRenderer::new()
            .binary(&script)
            .timeout(Duration::from_millis(100));
        let err = renderer.render("in.xlsx", dir.path()).await.unwrap_err();
        assert!(matches!(err, RenderError::Timeout(_)));
    }
}
