//! Fatal pipeline errors.
//!
//! Per-file download and extraction failures are not here: the orchestrator
//! recovers those into the session's error list and keeps going. These
//! variants abort the run and leave the session `failed`.

use thiserror::Error;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a session run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session {session_id} does not belong to user {user_id}")]
    Unauthorized {
        session_id: String,
        user_id: String,
    },

    #[error("No text could be extracted from any file: {}", .errors.join("; "))]
    AggregateExtraction { errors: Vec<String> },

    #[error("Persistence error: {0}")]
    Persistence(#[from] cram_db::DbError),
}
