//! Session processing pipeline.
//!
//! Drives one study session end to end: load and authorize, download and
//! extract each file, chunk the text, generate study materials, and persist
//! results with a terminal status. Individual file failures are recorded and
//! skipped; only a session with no usable text at all fails outright.

use crate::chunker::Chunker;
use crate::download::DownloadManager;
use crate::error::{PipelineError, PipelineResult};
use crate::extract::Extractor;
use cram_config::Config;
use cram_core::{
    ChunkRecord, Flashcard, ProcessingError, Session, SessionResults, SessionStatus,
};
use cram_db::Database;
use cram_ollama::ContentGenerator;
use cram_process::{OcrBackend, OcrController};
use tracing::{debug, info, warn};

/// Outcome of a pipeline run, for callers that report progress.
#[derive(Debug, Clone)]
pub struct SessionRunResult {
    pub session_id: String,
    pub status: SessionStatus,
    pub successful_files: usize,
    pub failed_files: usize,
}

/// Orchestrates processing of a single session.
pub struct SessionPipeline<B: OcrBackend, G: ContentGenerator> {
    db: Database,
    downloads: DownloadManager,
    ocr: OcrController<B>,
    chunker: Chunker,
    generator: G,
    max_ocr_attempts: u32,
}

impl<B: OcrBackend, G: ContentGenerator> SessionPipeline<B, G> {
    pub fn new(db: Database, config: &Config, backend: B, generator: G) -> Self {
        Self {
            db,
            downloads: DownloadManager::new(config.download.clone()),
            ocr: OcrController::new(backend, config.ocr.clone()),
            chunker: Chunker::new(&config.chunking),
            generator,
            max_ocr_attempts: config.ocr.max_attempts,
        }
    }

    /// Process `session_id` on behalf of `user_id`.
    ///
    /// On any fatal error the session is marked failed before the error
    /// propagates. The OCR worker is released in every case.
    pub async fn run(&self, session_id: &str, user_id: &str) -> PipelineResult<SessionRunResult> {
        let result = self.run_inner(session_id, user_id).await;
        self.ocr.shutdown().await;

        if let Err(e) = &result {
            // Best effort; the session may not exist or may already be
            // terminal, in which case its status stands.
            if let Err(db_err) = self.db.mark_session_failed(session_id, &e.to_string()) {
                warn!(
                    "Could not record failure for session {}: {}",
                    session_id, db_err
                );
            }
        }
        result
    }

    async fn run_inner(&self, session_id: &str, user_id: &str) -> PipelineResult<SessionRunResult> {
        let session = match self.db.get_session(session_id) {
            Ok(session) => session,
            Err(cram_db::DbError::NotFound(_)) => {
                return Err(PipelineError::NotFound(session_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if session.user_id != user_id {
            return Err(PipelineError::Unauthorized {
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
            });
        }

        self.db
            .update_session_status(session_id, SessionStatus::Processing)?;
        info!(
            "Processing session {} ({} files)",
            session_id,
            session.files.len()
        );

        let (texts, chunks, successful, errors) = self.process_files(&session).await;

        if texts.is_empty() {
            return Err(PipelineError::AggregateExtraction {
                errors: errors.iter().map(|e| e.to_string()).collect(),
            });
        }

        let combined = texts.join("\n\n");
        let mut results = SessionResults {
            summary: None,
            flashcards: Vec::new(),
            study_guide: None,
            total_text_length: combined.chars().count() as i64,
            total_chunks: chunks.len() as i64,
            successful_files: successful,
            processing_errors: None,
        };

        self.generate_materials(&session, &combined, &mut results).await;

        self.db.replace_chunks(session_id, &chunks)?;

        let status = if errors.is_empty() {
            SessionStatus::Completed
        } else {
            results.processing_errors = Some(errors.iter().map(|e| e.to_string()).collect());
            SessionStatus::CompletedWithErrors
        };
        self.db
            .update_session_results(session_id, status, &results)?;

        info!(
            "Session {} finished as {} ({} ok, {} failed)",
            session_id,
            status.as_str(),
            results.successful_files.len(),
            errors.len()
        );

        Ok(SessionRunResult {
            session_id: session_id.to_string(),
            status,
            successful_files: results.successful_files.len(),
            failed_files: errors.len(),
        })
    }

    /// Download, extract, and chunk every file. Failures are collected, not
    /// propagated; a later file still gets its chance.
    async fn process_files(
        &self,
        session: &Session,
    ) -> (
        Vec<String>,
        Vec<ChunkRecord>,
        Vec<String>,
        Vec<ProcessingError>,
    ) {
        let extractor = Extractor::new(&self.ocr, self.max_ocr_attempts);

        let mut texts = Vec::new();
        let mut chunks = Vec::new();
        let mut successful = Vec::new();
        let mut errors = Vec::new();

        for file in &session.files {
            debug!("Processing file {} ({})", file.file_name, file.media_type);

            let bytes = match self.downloads.fetch(&file.url, &file.file_name).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping {}: {}", file.file_name, e);
                    errors.push(ProcessingError {
                        file_name: file.file_name.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let extracted = match extractor
                .extract(&bytes, &file.file_name, &file.media_type)
                .await
            {
                Ok(extracted) => extracted,
                Err(e) => {
                    warn!("Skipping {}: {}", file.file_name, e);
                    errors.push(ProcessingError {
                        file_name: file.file_name.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if extracted.low_confidence {
                warn!(
                    "Keeping low-confidence OCR text for {} ({:.0}%)",
                    file.file_name,
                    extracted.ocr_confidence.unwrap_or(0.0)
                );
            }

            for (i, content) in self.chunker.chunk(&extracted.text).into_iter().enumerate() {
                chunks.push(ChunkRecord {
                    file_name: file.file_name.clone(),
                    media_type: file.media_type.clone(),
                    chunk_index: i as i32,
                    content,
                });
            }

            texts.push(extracted.text);
            successful.push(file.file_name.clone());
        }

        (texts, chunks, successful, errors)
    }

    /// Generate each requested study material. A failure degrades only that
    /// one field to a placeholder; the rest still generate, and the session's
    /// terminal status is unaffected.
    async fn generate_materials(
        &self,
        session: &Session,
        combined: &str,
        results: &mut SessionResults,
    ) {
        if session.preferences.summary {
            match self.generator.summary(combined).await {
                Ok(summary) => results.summary = Some(summary),
                Err(e) => {
                    warn!("Summary generation failed: {}", e);
                    results.summary = Some(format!("Summary generation failed: {}", e));
                }
            }
        }

        if session.preferences.flashcards {
            match self.generator.flashcards(combined).await {
                Ok(cards) => results.flashcards = cards,
                Err(e) => {
                    warn!("Flashcard generation failed: {}", e);
                    results.flashcards = vec![Flashcard {
                        question: "Flashcard generation failed".to_string(),
                        answer: e.to_string(),
                    }];
                }
            }
        }

        if session.preferences.study_guide {
            match self.generator.study_guide(combined).await {
                Ok(guide) => results.study_guide = Some(guide),
                Err(e) => {
                    warn!("Study guide generation failed: {}", e);
                    results.study_guide = Some(format!("Study guide generation failed: {}", e));
                }
            }
        }
    }
}
