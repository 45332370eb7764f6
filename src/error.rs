// ============================================================
// Pipeline Error Taxonomy
// ============================================================
// Every failure the pipeline can raise below the application
// layer. The application and CLI layers wrap these in anyhow
// with context naming the stage and the failing path.
//
// Nothing here is retried: each variant is fatal to the run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    // ── Configuration ────────────────────────────────────────────────────────
    #[error("could not find config file: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    // ── Data ─────────────────────────────────────────────────────────────────
    #[error("could not find data source: {0}")]
    DataNotFound(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ── Model / tokenizer ────────────────────────────────────────────────────
    #[error("model '{identifier}': {message}")]
    Model { identifier: String, message: String },

    #[error("tokenizer '{identifier}': {message}")]
    Tokenizer { identifier: String, message: String },

    // ── Promotion policy ─────────────────────────────────────────────────────
    #[error("promotion policy error: {0}")]
    Policy(String),

    // ── Remote object store (source error kept intact) ───────────────────────
    #[error("object store request failed")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("artifact integrity check failed: {0}")]
    Integrity(String),

    // ── Pass-through from dependencies ───────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn model(identifier: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Model { identifier: identifier.into(), message: message.to_string() }
    }

    pub fn tokenizer(identifier: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Tokenizer { identifier: identifier.into(), message: message.to_string() }
    }

    /// Box an object-store client error without altering it.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }
}
