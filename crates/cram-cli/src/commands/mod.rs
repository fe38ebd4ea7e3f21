//! CLI command implementations.

pub mod create;
pub mod init;
pub mod process;
pub mod show;
pub mod status;

use anyhow::{Context, Result};
use cram_config::{AppPaths, Config};
use cram_db::Database;

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Get a database connection, ensuring cram is initialized.
pub fn get_database() -> Result<Database> {
    let paths = get_paths()?;

    if !paths.is_initialized() {
        anyhow::bail!("Cram is not initialized. Run 'cram init' first.");
    }

    Database::open(&paths.database_file).context("Failed to open database")
}

/// Load the configuration, falling back to defaults when no file exists.
pub fn get_config() -> Result<Config> {
    let paths = get_paths()?;
    Config::load_from(&paths.config_file).context("Failed to load configuration")
}
