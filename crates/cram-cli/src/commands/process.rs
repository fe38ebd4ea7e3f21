//! Process command - run the pipeline for one session.

use super::{get_config, get_database};
use anyhow::{Context, Result};
use colored::Colorize;
use cram_core::SessionStatus;
use cram_ingest::SessionPipeline;
use cram_ollama::StudyGenerator;
use cram_process::TesseractBackend;
use tokio::runtime::Runtime;

pub fn run(id: &str, user: &str) -> Result<()> {
    let db = get_database()?;
    let config = get_config()?;

    let backend = TesseractBackend::new(&config.ocr.language);
    let generator =
        StudyGenerator::from_config(&config.ollama).context("Failed to create Ollama client")?;
    let pipeline = SessionPipeline::new(db.clone(), &config, backend, generator);

    println!("{} session {}...", "Processing".cyan().bold(), id);

    let rt = Runtime::new().context("Failed to create async runtime")?;
    let run = rt
        .block_on(pipeline.run(id, user))
        .context("Session processing failed")?;

    match run.status {
        SessionStatus::Completed => {
            println!(
                "{} Completed: {} file(s) processed",
                "✓".green(),
                run.successful_files
            );
        }
        SessionStatus::CompletedWithErrors => {
            println!(
                "{} Completed with errors: {} ok, {} failed",
                "!".yellow(),
                run.successful_files,
                run.failed_files
            );
        }
        other => {
            println!("{} Finished as {}", "!".yellow(), other.as_str());
        }
    }
    println!("  View results: {}", format!("cram show {}", id).cyan());

    Ok(())
}
