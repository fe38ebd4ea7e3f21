//! Confidence-driven retry controller for OCR.

use crate::engine::{OcrBackend, OcrOutcome};
use crate::error::{ProcessError, ProcessResult};
use cram_config::OcrConfig;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Final OCR result after retries.
#[derive(Debug, Clone)]
pub struct OcrText {
    pub text: String,
    pub confidence: f32,
    /// Set when the best result stayed below the acceptance threshold.
    pub low_confidence: bool,
}

enum WorkerState<W> {
    Uninitialized,
    Ready(W),
}

/// Wraps an [`OcrBackend`] with bounded retries, confidence tracking, and
/// worker lifecycle management.
///
/// The worker mutex serializes initialization: concurrent callers wait for
/// the in-flight spawn instead of starting a second one.
pub struct OcrController<B: OcrBackend> {
    backend: B,
    config: OcrConfig,
    worker: Mutex<WorkerState<B::Worker>>,
}

impl<B: OcrBackend> OcrController<B> {
    pub fn new(backend: B, config: OcrConfig) -> Self {
        Self {
            backend,
            config,
            worker: Mutex::new(WorkerState::Uninitialized),
        }
    }

    /// Recognize `bytes`, retrying up to `max_attempts` times.
    ///
    /// Returns immediately once an attempt yields non-empty text at or above
    /// the acceptance threshold. After exhausting attempts, the best result
    /// seen is returned with `low_confidence` set. Fails only when no attempt
    /// produced any text at all.
    pub async fn recognize_with_retry(
        &self,
        bytes: &[u8],
        media_type: &str,
        max_attempts: u32,
    ) -> ProcessResult<OcrText> {
        let mut best: Option<OcrOutcome> = None;
        let mut last_error: Option<ProcessError> = None;

        for attempt in 1..=max_attempts.max(1) {
            if attempt > 1 {
                tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }

            match self.attempt(bytes, media_type).await {
                Ok(outcome) => {
                    let has_text = !outcome.text.trim().is_empty();

                    if has_text && outcome.confidence >= self.config.accept_confidence {
                        debug!(
                            "OCR accepted on attempt {}/{} at {:.0}% confidence",
                            attempt, max_attempts, outcome.confidence
                        );
                        return Ok(OcrText {
                            text: outcome.text,
                            confidence: outcome.confidence,
                            low_confidence: false,
                        });
                    }

                    debug!(
                        "OCR attempt {}/{} below threshold ({:.0}% < {:.0}%)",
                        attempt, max_attempts, outcome.confidence, self.config.accept_confidence
                    );

                    if has_text
                        && best
                            .as_ref()
                            .map_or(true, |b| outcome.confidence > b.confidence)
                    {
                        best = Some(outcome);
                    }

                    // Recycle the worker before trying again; a fresh worker
                    // sometimes reads a poor scan better.
                    self.teardown().await;
                }
                Err(e) => {
                    warn!("OCR attempt {}/{} failed: {}", attempt, max_attempts, e);
                    if worker_poisoned(&e) {
                        // Never reuse a worker that reported itself broken.
                        self.teardown().await;
                    }
                    last_error = Some(e);
                }
            }
        }

        if let Some(best) = best {
            warn!(
                "Returning low-confidence OCR result ({:.0}% after {} attempts)",
                best.confidence, max_attempts
            );
            return Ok(OcrText {
                text: best.text,
                confidence: best.confidence,
                low_confidence: true,
            });
        }

        Err(ProcessError::Exhausted {
            attempts: max_attempts,
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt produced text".to_string()),
        })
    }

    /// Explicit teardown entry point for the hosting process.
    pub async fn shutdown(&self) {
        self.teardown().await;
    }

    async fn attempt(&self, bytes: &[u8], media_type: &str) -> ProcessResult<OcrOutcome> {
        let mut guard = self.worker.lock().await;

        if matches!(*guard, WorkerState::Uninitialized) {
            let init_timeout = Duration::from_secs(self.config.init_timeout_seconds);
            let worker = timeout(init_timeout, self.backend.spawn())
                .await
                .map_err(|_| ProcessError::Timeout {
                    seconds: init_timeout.as_secs(),
                })??;
            *guard = WorkerState::Ready(worker);
        }

        let attempt_timeout = Duration::from_secs(self.config.attempt_timeout_seconds);
        match &mut *guard {
            WorkerState::Ready(worker) => {
                match timeout(
                    attempt_timeout,
                    self.backend.recognize(worker, bytes, media_type),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProcessError::Timeout {
                        seconds: attempt_timeout.as_secs(),
                    }),
                }
            }
            WorkerState::Uninitialized => {
                Err(ProcessError::Init("worker unavailable".to_string()))
            }
        }
    }

    async fn teardown(&self) {
        let mut guard = self.worker.lock().await;
        if let WorkerState::Ready(worker) =
            std::mem::replace(&mut *guard, WorkerState::Uninitialized)
        {
            self.backend.shutdown(worker).await;
        }
    }
}

/// Whether an error message indicates the worker itself is in a bad state.
fn worker_poisoned(error: &ProcessError) -> bool {
    const MARKERS: &[&str] = &["corrupt", "poisoned", "terminated", "invalid worker"];

    match error {
        ProcessError::Recognition(msg) | ProcessError::Init(msg) => {
            let msg = msg.to_ascii_lowercase();
            MARKERS.iter().any(|m| msg.contains(m))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Backend that replays a scripted sequence of attempt results.
    struct ScriptedBackend {
        script: StdMutex<VecDeque<ProcessResult<OcrOutcome>>>,
        spawns: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(script: Vec<ProcessResult<OcrOutcome>>) -> Self {
            Self {
                script: StdMutex::new(script.into()),
                spawns: AtomicUsize::new(0),
                shutdowns: AtomicUsize::new(0),
            }
        }

        fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl OcrBackend for ScriptedBackend {
        type Worker = ();

        async fn spawn(&self) -> ProcessResult<()> {
            self.spawns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn recognize(
            &self,
            _worker: &mut (),
            _bytes: &[u8],
            _media_type: &str,
        ) -> ProcessResult<OcrOutcome> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProcessError::Recognition("script exhausted".to_string())))
        }

        async fn shutdown(&self, _worker: ()) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ok(text: &str, confidence: f32) -> ProcessResult<OcrOutcome> {
        Ok(OcrOutcome {
            text: text.to_string(),
            confidence,
        })
    }

    fn test_config() -> OcrConfig {
        OcrConfig {
            retry_delay_ms: 0,
            ..OcrConfig::default()
        }
    }

    fn controller(script: Vec<ProcessResult<OcrOutcome>>) -> OcrController<ScriptedBackend> {
        OcrController::new(ScriptedBackend::new(script), test_config())
    }

    #[tokio::test]
    async fn test_accepts_at_threshold_without_further_attempts() {
        let ctl = controller(vec![
            ok("low", 40.0),
            ok("better", 55.0),
            ok("good", 72.0),
            ok("never read", 99.0),
        ]);

        let result = ctl
            .recognize_with_retry(b"img", "image/png", 5)
            .await
            .unwrap();

        assert_eq!(result.text, "good");
        assert_eq!(result.confidence, 72.0);
        assert!(!result.low_confidence);
        // The fourth scripted attempt was never consumed.
        assert_eq!(ctl.backend.remaining(), 1);
    }

    #[tokio::test]
    async fn test_returns_best_below_threshold_after_exhaustion() {
        let ctl = controller(vec![ok("a", 40.0), ok("b", 55.0), ok("c", 60.0)]);

        let result = ctl
            .recognize_with_retry(b"img", "image/png", 3)
            .await
            .unwrap();

        assert_eq!(result.text, "c");
        assert_eq!(result.confidence, 60.0);
        assert!(result.low_confidence);
    }

    #[tokio::test]
    async fn test_keeps_best_not_latest() {
        let ctl = controller(vec![ok("peak", 65.0), ok("worse", 30.0), ok("bad", 20.0)]);

        let result = ctl
            .recognize_with_retry(b"img", "image/png", 3)
            .await
            .unwrap();

        assert_eq!(result.text, "peak");
        assert_eq!(result.confidence, 65.0);
    }

    #[tokio::test]
    async fn test_all_attempts_erroring_fails() {
        let ctl = controller(vec![
            Err(ProcessError::Recognition("boom".to_string())),
            Err(ProcessError::Timeout { seconds: 45 }),
            Err(ProcessError::Recognition("boom again".to_string())),
        ]);

        let err = ctl
            .recognize_with_retry(b"img", "image/png", 3)
            .await
            .unwrap_err();

        match err {
            ProcessError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.contains("boom again"));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_text_is_not_a_result() {
        let ctl = controller(vec![ok("", 95.0), ok("", 90.0)]);

        let err = ctl
            .recognize_with_retry(b"img", "image/png", 2)
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::Exhausted { .. }));
    }

    #[tokio::test]
    async fn test_poisoned_worker_forces_respawn() {
        let ctl = controller(vec![
            Err(ProcessError::Recognition("worker state corrupt".to_string())),
            ok("recovered", 88.0),
        ]);

        let result = ctl
            .recognize_with_retry(b"img", "image/png", 3)
            .await
            .unwrap();

        assert_eq!(result.text, "recovered");
        // First spawn, then a respawn after the poisoned error.
        assert_eq!(ctl.backend.spawns.load(Ordering::SeqCst), 2);
        assert_eq!(ctl.backend.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_worker_recycled_between_low_confidence_attempts() {
        let ctl = controller(vec![ok("a", 10.0), ok("b", 80.0)]);

        let result = ctl
            .recognize_with_retry(b"img", "image/png", 3)
            .await
            .unwrap();

        assert_eq!(result.text, "b");
        assert_eq!(ctl.backend.spawns.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_explicit_shutdown_releases_worker() {
        let ctl = controller(vec![ok("x", 90.0)]);
        ctl.recognize_with_retry(b"img", "image/png", 1)
            .await
            .unwrap();

        ctl.shutdown().await;
        assert_eq!(ctl.backend.shutdowns.load(Ordering::SeqCst), 1);

        // Idempotent
        ctl.shutdown().await;
        assert_eq!(ctl.backend.shutdowns.load(Ordering::SeqCst), 1);
    }
}
