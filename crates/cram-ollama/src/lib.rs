//! Cram Ollama - LLM-backed study content generation.
//!
//! Provides an async client for Ollama's generate API and a
//! [`ContentGenerator`] implementation that turns extracted session text into
//! summaries, flashcards, and study guides.

mod client;
mod error;
mod studygen;
mod types;

pub use client::OllamaClient;
pub use error::{OllamaError, OllamaResult};
pub use studygen::{ContentGenerator, StudyGenerator};
pub use types::*;
