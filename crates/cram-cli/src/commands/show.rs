//! Show command - display a session's study materials.

use super::get_database;
use anyhow::Result;
use colored::Colorize;
use cram_core::SessionStatus;

pub fn run(id: &str, with_chunks: bool) -> Result<()> {
    let db = get_database()?;
    let session = db.get_session(id)?;

    println!("📚 {}", format!("Session {}", session.id).white().bold());
    println!("{}", "─".repeat(70));

    println!("  {}: {}", "User".cyan(), session.user_id);
    println!("  {}: {}", "Status".cyan(), status_label(session.status));
    println!(
        "  {}: {}",
        "Created".cyan(),
        session.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(processed) = session.processed_at {
        println!(
            "  {}: {}",
            "Processed".cyan(),
            processed.format("%Y-%m-%d %H:%M:%S")
        );
    }

    println!();
    println!("{}", "Files".white().bold());
    for file in &session.files {
        let marker = if session
            .results
            .successful_files
            .contains(&file.file_name)
        {
            "✓".green()
        } else if session.status.is_terminal() {
            "✗".red()
        } else {
            "○".yellow()
        };
        println!("  {} {} ({})", marker, file.file_name, file.media_type);
    }

    if let Some(ref message) = session.error_message {
        println!();
        println!("{}", "Error".red().bold());
        println!("  {}", message);
    }

    if let Some(ref errors) = session.results.processing_errors {
        println!();
        println!("{}", "Processing Errors".yellow().bold());
        for error in errors {
            println!("  {} {}", "•".dimmed(), error);
        }
    }

    if let Some(ref summary) = session.results.summary {
        println!();
        println!("{}", "Summary".white().bold());
        println!("{}", "─".repeat(70));
        println!("{}", summary);
    }

    if !session.results.flashcards.is_empty() {
        println!();
        println!(
            "{} ({})",
            "Flashcards".white().bold(),
            session.results.flashcards.len()
        );
        println!("{}", "─".repeat(70));
        for (i, card) in session.results.flashcards.iter().enumerate() {
            println!("  {}. {}", i + 1, card.question.cyan());
            println!("     {}", card.answer);
        }
    }

    if let Some(ref guide) = session.results.study_guide {
        println!();
        println!("{}", "Study Guide".white().bold());
        println!("{}", "─".repeat(70));
        println!("{}", guide);
    }

    if session.status.is_terminal() && session.status != SessionStatus::Failed {
        println!();
        println!(
            "  {} {} chunks from {} characters of text",
            "Stats:".dimmed(),
            session.results.total_chunks,
            session.results.total_text_length
        );
    }

    if with_chunks {
        let chunks = db.get_chunks(id)?;
        println!();
        println!("{} ({})", "Chunks".white().bold(), chunks.len());
        println!("{}", "─".repeat(70));
        for chunk in &chunks {
            println!(
                "  {} {}#{}",
                "•".dimmed(),
                chunk.file_name,
                chunk.chunk_index
            );
            let preview: String = chunk.content.chars().take(120).collect();
            println!("    {}", preview.dimmed());
        }
    }

    Ok(())
}

fn status_label(status: SessionStatus) -> colored::ColoredString {
    match status {
        SessionStatus::Pending => status.as_str().yellow(),
        SessionStatus::Processing => status.as_str().blue(),
        SessionStatus::Completed => status.as_str().green(),
        SessionStatus::CompletedWithErrors => status.as_str().yellow(),
        SessionStatus::Failed => status.as_str().red(),
    }
}
