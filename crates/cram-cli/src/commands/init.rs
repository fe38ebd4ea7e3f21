//! Initialize cram.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use cram_config::Config;
use cram_db::Database;

pub fn run() -> Result<()> {
    let paths = get_paths()?;

    if paths.is_initialized() {
        println!("{} Cram is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        println!("  Database: {}", paths.database_file.display());
        return Ok(());
    }

    println!("{}", "Initializing cram...".cyan().bold());

    paths.ensure_dirs().context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
    println!(
        "  {} Created config: {}",
        "✓".green(),
        paths.config_file.display()
    );

    let _db = Database::open(&paths.database_file).context("Failed to initialize database")?;
    println!(
        "  {} Created database: {}",
        "✓".green(),
        paths.database_file.display()
    );

    println!();
    println!("{}", "Cram initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  1. Register a session: {}",
        "cram create --user you notes.pdf=https://...=application/pdf".cyan()
    );
    println!("  2. Process it: {}", "cram process <id> --user you".cyan());
    println!("  3. Review results: {}", "cram show <id>".cyan());

    Ok(())
}
