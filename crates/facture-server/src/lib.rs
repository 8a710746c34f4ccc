//! HTTP API for the facture invoice generator.
//!
//! Serves three routes: `POST /api/generate` fills the invoice template
//! and writes the result (plus an optional PDF) into the output
//! directory, `GET /api/download/{filename}` hands a generated file
//! back as an attachment, and `GET /health` answers liveness probes.
//!
//! The template is loaded once at startup and shared read-only across
//! workers; every generation fills a fresh copy.
//!
//! # Example
//!
//! ```rust,no_run
//! use facture_server::{run, ServerConfig};
//!
//! # async fn example() -> std::io::Result<()> {
//! run(ServerConfig::default()).await
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod state;

use std::path::PathBuf;

use actix_web::{middleware, web, App, HttpServer};

pub use error::ApiError;
pub use handlers::{GenerateRequest, GenerateResponse};
pub use state::AppState;

pub const DEFAULT_PORT: u16 = 5000;

/// Maximum accepted JSON body size (50 MB).
pub const JSON_BODY_LIMIT: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Invoice template the generator fills.
    pub template_path: PathBuf,
    /// Where generated files land and downloads are served from.
    pub output_dir: PathBuf,
    /// Bind address. The default exposes the app on the local network.
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("template.xlsx"),
            output_dir: PathBuf::from("uploads"),
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Register the API routes. Shared by `run` and the handler tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::generate)
        .service(handlers::download)
        .service(handlers::health);
}

/// JSON extractor config: large bodies allowed, errors in the API shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

/// Load the template and serve the API until the process is stopped.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = AppState::from_config(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let data = web::Data::new(state);

    tracing::info!(
        "Serving invoices from {} on http://{}:{}",
        config.template_path.display(),
        config.bind_addr,
        config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(json_config())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
