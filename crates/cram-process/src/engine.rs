//! OCR engine abstraction.

use crate::error::ProcessResult;
use async_trait::async_trait;

/// Output of a single recognition attempt.
#[derive(Debug, Clone)]
pub struct OcrOutcome {
    /// The recognized text.
    pub text: String,
    /// Confidence score for the whole result (0-100).
    pub confidence: f32,
}

/// A recognition engine.
///
/// The controller in [`crate::OcrController`] owns worker lifecycle: it calls
/// `spawn` lazily, hands the worker back to `recognize`, and `shutdown`s it
/// when recycling or terminating. Backends never manage retries themselves.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    type Worker: Send;

    /// Bring up a worker ready to recognize.
    async fn spawn(&self) -> ProcessResult<Self::Worker>;

    /// Run recognition on raw file bytes.
    async fn recognize(
        &self,
        worker: &mut Self::Worker,
        bytes: &[u8],
        media_type: &str,
    ) -> ProcessResult<OcrOutcome>;

    /// Tear down a worker.
    async fn shutdown(&self, worker: Self::Worker);
}
