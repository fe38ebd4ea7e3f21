//! Native PDF text extraction.

use tracing::debug;

/// Extract embedded text from a PDF byte buffer.
///
/// Returns the cleaned text, which may be empty for scanned PDFs that
/// carry no text layer; callers decide whether to fall back to OCR.
pub fn extract_text(bytes: &[u8]) -> Result<String, String> {
    let raw = pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string())?;
    let content = clean_pdf_text(&raw);
    debug!("Extracted {} characters of native PDF text", content.len());
    Ok(content)
}

/// Clean up extracted PDF text.
fn clean_pdf_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        // Collapse runs of blank lines into a single one
        .fold(Vec::new(), |mut acc, line| {
            let last_was_empty = acc.last().map(|s: &String| s.is_empty()).unwrap_or(false);
            if !(line.is_empty() && last_was_empty) {
                acc.push(line.to_string());
            }
            acc
        })
        .join("\n")
        // Form feeds mark page breaks
        .replace('\x0C', "\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_pdf_text_collapses_blank_runs() {
        let messy = "  Hello  \n\n\n\nWorld  \n\nTest";
        let cleaned = clean_pdf_text(messy);
        assert!(!cleaned.contains("\n\n\n"));
        assert!(cleaned.contains("Hello"));
        assert!(cleaned.contains("World"));
    }

    #[test]
    fn test_clean_pdf_text_trims_lines() {
        assert_eq!(clean_pdf_text("   a   \n   b   "), "a\nb");
    }

    #[test]
    fn test_extract_text_rejects_garbage() {
        assert!(extract_text(b"definitely not a pdf").is_err());
    }
}
