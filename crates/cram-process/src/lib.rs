//! Cram Process - OCR for image-like study material.
//!
//! This crate provides:
//! - An `OcrBackend` trait abstracting the recognition engine
//! - A Tesseract CLI backend (relies on tesseract being installed)
//! - A retry controller with confidence tracking and worker recycling

mod engine;
mod error;
mod retry;
mod tesseract;

pub use engine::{OcrBackend, OcrOutcome};
pub use error::{ProcessError, ProcessResult};
pub use retry::{OcrController, OcrText};
pub use tesseract::TesseractBackend;

/// Check if the required external tools are available.
pub fn check_dependencies() -> Vec<(&'static str, bool)> {
    vec![("tesseract", which::which("tesseract").is_ok())]
}
