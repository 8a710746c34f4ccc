//! Route handlers for the invoice API.

use std::io;
use std::path::Path;

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, post, web, HttpResponse};
use facture_engine::{generate_invoice, safe_filename, ChangeSet, InvoicePayload};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Body of `POST /api/generate`.
///
/// `output_filename` defaults to "invoice" when absent, but an explicit
/// blank one fails validation like the other required fields.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub invoice: InvoicePayload,
    #[serde(default = "default_output_filename")]
    pub output_filename: String,
    #[serde(default = "default_generate_pdf")]
    pub generate_pdf: bool,
}

fn default_output_filename() -> String {
    "invoice".to_string()
}

fn default_generate_pdf() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub excel_file: String,
    pub pdf_file: Option<String>,
    pub message: String,
}

#[post("/api/generate")]
pub async fn generate(
    state: web::Data<AppState>,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    if request.output_filename.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "All required fields must be filled".to_string(),
        ));
    }

    let worker_state = state.clone();
    let output_name = request.output_filename.clone();
    let payload = request.invoice;
    let excel_path = web::block(move || {
        let generated = generate_invoice(&worker_state.template, &payload, &ChangeSet::new())?;
        worker_state.writer.write(&generated, &output_name)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let excel_file = file_name_string(&excel_path);

    // A failed conversion still delivers the spreadsheet.
    let mut pdf_file = None;
    if request.generate_pdf {
        match state.renderer.render(&excel_path, &state.output_dir).await {
            Ok(pdf_path) => pdf_file = Some(file_name_string(&pdf_path)),
            Err(e) => {
                tracing::warn!("PDF generation failed for {}: {e}", excel_path.display());
            }
        }
    }

    Ok(HttpResponse::Ok().json(GenerateResponse {
        success: true,
        excel_file,
        pdf_file,
        message: "Files generated successfully!".to_string(),
    }))
}

#[get("/api/download/{filename}")]
pub async fn download(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let raw = path.into_inner();
    // Path extraction percent-decodes, so an encoded separator lands here.
    if raw.contains('/') || raw.contains('\\') || raw.contains("..") {
        return Err(ApiError::BadRequest(format!("Invalid filename: {raw}")));
    }

    let name = safe_filename(&raw);
    let file_path = state.output_dir.join(&name);
    tracing::debug!("Download request for {}", file_path.display());

    let bytes = web::block(move || std::fs::read(&file_path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ApiError::NotFound(format!("File not found: {name}")),
            _ => ApiError::Internal(e.to_string()),
        })?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&name))
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(name)],
        })
        .body(bytes))
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".pdf") {
        "application/pdf"
    } else if name.ends_with(".xlsx") {
        XLSX_CONTENT_TYPE
    } else {
        "application/octet-stream"
    }
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
