//! Cram Core - Core types and domain models for the Cram study pipeline.

mod types;

pub use types::*;
