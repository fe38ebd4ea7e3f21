//! Error types for OCR processing.

use thiserror::Error;

/// Result type for processing operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors that can occur during OCR processing.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tool not found: {tool}. Please install it.")]
    ToolNotFound { tool: String },

    #[error("Worker initialization failed: {0}")]
    Init(String),

    #[error("Recognition error: {0}")]
    Recognition(String),

    #[error("Attempt timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("OCR failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("Parse error: {0}")]
    Parse(String),
}
