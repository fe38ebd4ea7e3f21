//! Status command - list recent sessions.

use super::get_database;
use anyhow::Result;
use colored::Colorize;
use cram_core::SessionStatus;

pub fn run(limit: i64) -> Result<()> {
    let db = get_database()?;
    let sessions = db.list_recent_sessions(limit)?;

    println!("{}", "Recent Sessions".cyan().bold());
    println!("{}", "─".repeat(70));

    if sessions.is_empty() {
        println!("  No sessions yet. Create one with {}", "cram create".cyan());
        return Ok(());
    }

    for session in &sessions {
        let marker = match session.status {
            SessionStatus::Pending => "○".yellow(),
            SessionStatus::Processing => "◐".blue(),
            SessionStatus::Completed => "●".green(),
            SessionStatus::CompletedWithErrors => "◍".yellow(),
            SessionStatus::Failed => "✗".red(),
        };
        println!(
            "  {} {} {} {} file(s), {}",
            marker,
            session.id.dimmed(),
            session.user_id,
            session.file_count,
            session.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
