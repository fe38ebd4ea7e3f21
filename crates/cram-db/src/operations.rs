//! Database CRUD operations.

pub mod chunks;
pub mod sessions;
