//! Cram Ingest - The file processing pipeline.
//!
//! Turns a session's uploaded files into plain text and chunk records:
//! multi-strategy download, per-format extraction with OCR fallback,
//! boundary-aware chunking, and the orchestrator that drives a whole
//! session to one terminal outcome.

mod chunker;
mod download;
mod error;
mod extract;
mod pipeline;

pub use chunker::Chunker;
pub use download::{DownloadError, DownloadManager};
pub use error::{PipelineError, PipelineResult};
pub use extract::{Extracted, ExtractError, ExtractionRoute, Extractor};
pub use pipeline::{SessionPipeline, SessionRunResult};
