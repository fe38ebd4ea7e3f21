//! Per-format text extraction dispatcher.
//!
//! Routes a downloaded payload to the right extractor based on its media
//! type, with OCR fallback for formats that may carry no text layer.

mod docx;
mod pdf;

use cram_core::MediaKind;
use cram_process::{OcrBackend, OcrController, ProcessError};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from text extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No usable text content (route: {route:?})")]
    NoTextContent { route: ExtractionRoute },

    #[error("PDF extraction failed both ways (native: {native}; ocr: {ocr})")]
    PdfBothFailed { native: String, ocr: String },

    #[error("Word document extraction failed: {0}")]
    Docx(String),

    #[error("File of type {media_type} is not valid UTF-8: {reason}")]
    Utf8 { media_type: String, reason: String },

    #[error("OCR failed: {0}")]
    Ocr(#[from] ProcessError),
}

/// Which path produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRoute {
    /// Image handed straight to OCR.
    Ocr,
    /// PDF with an embedded text layer.
    PdfNative,
    /// Scanned PDF recovered via OCR.
    PdfOcrFallback,
    /// Word document body text.
    Docx,
    /// Declared text type decoded as UTF-8.
    Utf8,
    /// Unknown type that sniffed as readable UTF-8.
    Utf8Sniffed,
    /// Unknown type, every cheaper route exhausted.
    OcrLastResort,
}

/// Extracted text plus provenance.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub text: String,
    pub route: ExtractionRoute,
    /// Present only when OCR produced the text.
    pub ocr_confidence: Option<f32>,
    pub low_confidence: bool,
}

impl Extracted {
    fn plain(text: String, route: ExtractionRoute) -> Self {
        Self {
            text,
            route,
            ocr_confidence: None,
            low_confidence: false,
        }
    }
}

/// Dispatches extraction by media type.
pub struct Extractor<'a, B: OcrBackend> {
    ocr: &'a OcrController<B>,
    max_ocr_attempts: u32,
}

impl<'a, B: OcrBackend> Extractor<'a, B> {
    pub fn new(ocr: &'a OcrController<B>, max_ocr_attempts: u32) -> Self {
        Self {
            ocr,
            max_ocr_attempts,
        }
    }

    /// Extract text from `bytes` according to `media_type`.
    ///
    /// Fails when no route yields non-empty text; a whitespace-only result
    /// counts as empty. `file_name` is carried for diagnostics only.
    pub async fn extract(
        &self,
        bytes: &[u8],
        file_name: &str,
        media_type: &str,
    ) -> Result<Extracted, ExtractError> {
        let kind = MediaKind::from_mime(media_type);
        debug!(
            "Extracting {:?} content from {} ({} bytes)",
            kind,
            file_name,
            bytes.len()
        );

        let extracted = match kind {
            MediaKind::Image => self.ocr_route(bytes, media_type, ExtractionRoute::Ocr).await?,
            MediaKind::Pdf => self.extract_pdf(bytes, file_name, media_type).await?,
            MediaKind::Word => {
                let text = docx::extract_text(bytes).map_err(ExtractError::Docx)?;
                Extracted::plain(text, ExtractionRoute::Docx)
            }
            MediaKind::Presentation => {
                // Slide decks render better through OCR than through any
                // text-layer heuristic we have.
                self.ocr_route(bytes, media_type, ExtractionRoute::Ocr).await?
            }
            MediaKind::Text => {
                let text = std::str::from_utf8(bytes).map_err(|e| ExtractError::Utf8 {
                    media_type: media_type.to_string(),
                    reason: e.to_string(),
                })?;
                Extracted::plain(text.to_string(), ExtractionRoute::Utf8)
            }
            MediaKind::Other => self.extract_unknown(bytes, media_type).await?,
        };

        if extracted.text.trim().is_empty() {
            return Err(ExtractError::NoTextContent {
                route: extracted.route,
            });
        }
        Ok(extracted)
    }

    /// Native PDF text first; OCR only when the text layer is missing or
    /// unreadable.
    async fn extract_pdf(
        &self,
        bytes: &[u8],
        file_name: &str,
        media_type: &str,
    ) -> Result<Extracted, ExtractError> {
        let native_failure = match pdf::extract_text(bytes) {
            Ok(text) if !text.trim().is_empty() => {
                return Ok(Extracted::plain(text, ExtractionRoute::PdfNative));
            }
            Ok(_) => "no embedded text layer".to_string(),
            Err(e) => e,
        };

        warn!(
            "Native PDF extraction of {} unusable ({}), falling back to OCR",
            file_name, native_failure
        );

        match self
            .ocr_route(bytes, media_type, ExtractionRoute::PdfOcrFallback)
            .await
        {
            Ok(extracted) => Ok(extracted),
            Err(e) => Err(ExtractError::PdfBothFailed {
                native: native_failure,
                ocr: e.to_string(),
            }),
        }
    }

    /// Unknown types: accept readable UTF-8, otherwise OCR as a last resort.
    async fn extract_unknown(
        &self,
        bytes: &[u8],
        media_type: &str,
    ) -> Result<Extracted, ExtractError> {
        if let Ok(text) = std::str::from_utf8(bytes) {
            if looks_like_text(text) {
                return Ok(Extracted::plain(
                    text.to_string(),
                    ExtractionRoute::Utf8Sniffed,
                ));
            }
        }
        self.ocr_route(bytes, media_type, ExtractionRoute::OcrLastResort)
            .await
    }

    async fn ocr_route(
        &self,
        bytes: &[u8],
        media_type: &str,
        route: ExtractionRoute,
    ) -> Result<Extracted, ExtractError> {
        let result = self
            .ocr
            .recognize_with_retry(bytes, media_type, self.max_ocr_attempts)
            .await?;
        Ok(Extracted {
            text: result.text,
            route,
            ocr_confidence: Some(result.confidence),
            low_confidence: result.low_confidence,
        })
    }
}

/// Heuristic: valid UTF-8 that is mostly printable counts as text.
fn looks_like_text(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    let control = trimmed
        .chars()
        .filter(|c| c.is_control() && !c.is_whitespace())
        .count();
    (control as f64) / (trimmed.chars().count() as f64) < 0.05
}
