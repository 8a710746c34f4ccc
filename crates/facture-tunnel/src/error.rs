//! Error types for tunnel supervision.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error(
        "Tunnel binary not found: {}. Download cloudflared and place it there, or point at another binary.",
        .0.display()
    )]
    BinaryNotFound(PathBuf),

    #[error("No cloudflared build for this architecture: {0}")]
    UnsupportedPlatform(&'static str),

    #[error("Failed to spawn process: {0}")]
    Spawn(std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TunnelError>;
