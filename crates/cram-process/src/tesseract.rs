//! Tesseract CLI backend.

use crate::engine::{OcrBackend, OcrOutcome};
use crate::error::{ProcessError, ProcessResult};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// OCR backend that shells out to the tesseract binary.
pub struct TesseractBackend {
    language: String,
}

/// A resolved, ready-to-run tesseract installation.
pub struct TesseractWorker {
    binary: PathBuf,
}

impl TesseractBackend {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    type Worker = TesseractWorker;

    async fn spawn(&self) -> ProcessResult<TesseractWorker> {
        let binary = which::which("tesseract").map_err(|_| ProcessError::ToolNotFound {
            tool: "tesseract".to_string(),
        })?;

        // Confirm the binary actually runs before handing it out.
        let output = Command::new(&binary).arg("--version").output().await?;
        if !output.status.success() {
            return Err(ProcessError::Init(format!(
                "tesseract --version failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!("Tesseract worker ready at {:?}", binary);
        Ok(TesseractWorker { binary })
    }

    async fn recognize(
        &self,
        worker: &mut TesseractWorker,
        bytes: &[u8],
        media_type: &str,
    ) -> ProcessResult<OcrOutcome> {
        // Tesseract reads from disk, so stage the bytes in a temp file with
        // a suffix matching the declared type.
        let mut image = tempfile::Builder::new()
            .prefix("cram-ocr-")
            .suffix(extension_for(media_type))
            .tempfile()?;
        image.write_all(bytes)?;
        image.flush()?;

        debug!("Running OCR on {} bytes of {}", bytes.len(), media_type);

        // TSV output carries per-word confidence scores.
        let output = Command::new(&worker.binary)
            .arg(image.path())
            .arg("stdout")
            .args(["-l", &self.language])
            .args(["--oem", "3"]) // LSTM + legacy engine
            .args(["--psm", "1"]) // Automatic page segmentation with OSD
            .arg("tsv")
            .output()
            .await?;

        if !output.status.success() && output.stdout.is_empty() {
            return Err(ProcessError::Recognition(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_tsv(&String::from_utf8_lossy(&output.stdout))
    }

    async fn shutdown(&self, _worker: TesseractWorker) {
        // Nothing persistent to release for the CLI engine.
    }
}

fn extension_for(media_type: &str) -> &'static str {
    match media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        "image/webp" => ".webp",
        _ => ".png",
    }
}

/// Reconstruct text and an overall confidence from tesseract TSV output.
///
/// Word rows are level 5; the conf column is -1 for non-word rows and for
/// words tesseract could not score.
fn parse_tsv(tsv: &str) -> ProcessResult<OcrOutcome> {
    let mut text = String::new();
    let mut confidences: Vec<f32> = Vec::new();
    let mut current_line: Option<(String, String, String)> = None;

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level = fields[0];
        if level != "5" {
            continue;
        }

        let word = fields[11].trim();
        if word.is_empty() {
            continue;
        }

        let conf: f32 = fields[10]
            .parse()
            .map_err(|_| ProcessError::Parse(format!("bad confidence value: {}", fields[10])))?;
        if conf >= 0.0 {
            confidences.push(conf);
        }

        let key = (
            fields[2].to_string(), // block
            fields[3].to_string(), // paragraph
            fields[4].to_string(), // line
        );
        match &current_line {
            None => {}
            Some(prev) if *prev == key => text.push(' '),
            Some(prev) if prev.0 == key.0 && prev.1 == key.1 => text.push('\n'),
            Some(_) => text.push_str("\n\n"),
        }
        current_line = Some(key);
        text.push_str(word);
    }

    let confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f32>() / confidences.len() as f32
    };

    Ok(OcrOutcome { text, confidence })
}
