//! Error types for the Shuttle analysis engine.

use thiserror::Error;

use crate::types::SessionId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid court region: {0}")]
    InvalidCourt(String),

    #[error("Degenerate geometry: {0}")]
    Geometry(String),

    #[error("Pose oracle initialization failed: {0}")]
    OracleInit(String),

    #[error("Pose inference error: {0}")]
    Inference(String),

    #[error("Frame decode error: {0}")]
    FrameDecode(String),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid threshold '{name}': {reason}")]
    InvalidThreshold { name: &'static str, reason: String },

    #[error("Heatmap rendering error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
