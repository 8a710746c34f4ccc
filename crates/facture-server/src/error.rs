//! Error responses for the HTTP API.
//!
//! Every error body has the shape `{"error": "<message>"}`, including
//! the plain-text cases the API grew out of, so clients parse one shape.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use facture_engine::EngineError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(msg) = self {
            tracing::error!("Internal error: {msg}");
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

/// Validation failures map to 400, everything else is a server fault.
impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Validation(msg) => ApiError::BadRequest(msg),
            bad @ EngineError::InvalidAddress(_) => ApiError::BadRequest(bad.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
