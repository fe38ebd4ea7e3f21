//! Cram DB - SQLite-backed session store.

mod database;
mod error;
mod migrations;
mod operations;

pub use database::Database;
pub use error::{DbError, DbResult};
pub use operations::sessions::SessionSummary;
