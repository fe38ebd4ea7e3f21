//! Boundary-preferring text chunker.
//!
//! Splits extracted text into overlapping chunks sized for LLM context
//! windows. Splits land on natural boundaries where possible: paragraph
//! break, then line break, then sentence end, then word boundary, with a
//! hard cut as the last resort.

use cram_config::ChunkingConfig;
use tracing::debug;

/// Splits text into overlapping chunks.
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            chunk_overlap: config.chunk_overlap.min(config.chunk_size.saturating_sub(1)),
        }
    }

    /// Split `text` into chunks of at most `chunk_size` characters, each
    /// overlapping the previous by `chunk_overlap` characters.
    ///
    /// Sizes are measured in characters, not bytes, so multi-byte input
    /// never splits inside a code point. Empty or whitespace-only input
    /// yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let window_end = (start + self.chunk_size).min(chars.len());

            let end = if window_end == chars.len() {
                window_end
            } else {
                self.break_point(&chars, start, window_end)
            };

            chunks.push(chars[start..end].iter().collect());

            if end == chars.len() {
                break;
            }
            // Step back by the overlap, but always make forward progress.
            start = end.saturating_sub(self.chunk_overlap).max(start + 1);
        }

        debug!(
            "Chunked {} characters into {} chunks",
            chars.len(),
            chunks.len()
        );
        chunks
    }

    /// Find the best split position in `(floor, window_end]`, searching
    /// backward from the window end. Only the back half of the window is
    /// considered so chunks never collapse to slivers.
    fn break_point(&self, chars: &[char], start: usize, window_end: usize) -> usize {
        let floor = start + self.chunk_size / 2;

        // Paragraph break: split after "\n\n"
        for i in (floor..window_end).rev() {
            if i >= 1 && chars[i - 1] == '\n' && chars[i] == '\n' {
                return i + 1;
            }
        }

        // Line break
        for i in (floor..window_end).rev() {
            if chars[i] == '\n' {
                return i + 1;
            }
        }

        // Sentence end followed by whitespace; split before the whitespace
        for i in (floor.max(1)..window_end).rev() {
            if matches!(chars[i - 1], '.' | '!' | '?') && chars[i].is_whitespace() {
                return i;
            }
        }

        // Word boundary
        for i in (floor..window_end).rev() {
            if chars[i] == ' ' {
                return i + 1;
            }
        }

        // Hard cut
        window_end
    }
}
