//! Study material generation from extracted session text.

use crate::client::OllamaClient;
use crate::error::{OllamaError, OllamaResult};
use crate::types::{GenerateOptions, GenerateRequest};
use async_trait::async_trait;
use cram_config::OllamaConfig;
use cram_core::Flashcard;
use tracing::debug;

/// Upper bound on prompt context, leaving room for instructions.
const MAX_CONTEXT_CHARS: usize = 12_000;

/// Produces study materials from aggregate session text.
///
/// Each method is independently fault-tolerant at the call site: the pipeline
/// degrades a failed field rather than aborting the run.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn summary(&self, text: &str) -> OllamaResult<String>;
    async fn flashcards(&self, text: &str) -> OllamaResult<Vec<Flashcard>>;
    async fn study_guide(&self, text: &str) -> OllamaResult<String>;
}

/// Ollama-backed [`ContentGenerator`].
pub struct StudyGenerator {
    client: OllamaClient,
    model: String,
}

impl StudyGenerator {
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Ok(Self {
            client: OllamaClient::from_config(config)?,
            model: config.model.clone(),
        })
    }

    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    async fn generate(&self, prompt: String, options: GenerateOptions) -> OllamaResult<String> {
        let request = GenerateRequest::new(&self.model, prompt).with_options(options);
        let response = self.client.generate(request).await?;
        Ok(response.response.trim().to_string())
    }
}

#[async_trait]
impl ContentGenerator for StudyGenerator {
    async fn summary(&self, text: &str) -> OllamaResult<String> {
        let prompt = format!(
            "Summarize the following study material in 3-5 concise paragraphs. \
             Focus on the main topics and key points. Do not include any preamble \
             like 'Here is a summary' - provide the summary directly.\n\nMaterial:\n{}",
            truncate_chars(text, MAX_CONTEXT_CHARS)
        );

        let summary = self
            .generate(prompt, GenerateOptions::new().with_temperature(0.3))
            .await?;
        debug!("Generated summary: {} chars", summary.len());
        Ok(summary)
    }

    async fn flashcards(&self, text: &str) -> OllamaResult<Vec<Flashcard>> {
        let prompt = format!(
            "Create 10 flashcards from the following study material. Respond with \
             ONLY a JSON array, no other text, where each element is an object with \
             \"question\" and \"answer\" string fields.\n\nMaterial:\n{}",
            truncate_chars(text, MAX_CONTEXT_CHARS)
        );

        let raw = self
            .generate(prompt, GenerateOptions::new().with_temperature(0.5))
            .await?;
        let cards = parse_flashcards(&raw)?;
        debug!("Generated {} flashcards", cards.len());
        Ok(cards)
    }

    async fn study_guide(&self, text: &str) -> OllamaResult<String> {
        let prompt = format!(
            "Create a structured study guide in markdown from the following material. \
             Use headings for major topics, bullet points for key facts, and end with \
             a short list of review questions.\n\nMaterial:\n{}",
            truncate_chars(text, MAX_CONTEXT_CHARS)
        );

        let guide = self
            .generate(prompt, GenerateOptions::new().with_temperature(0.4))
            .await?;
        debug!("Generated study guide: {} chars", guide.len());
        Ok(guide)
    }
}

/// Truncate on a char boundary so multi-byte text never panics.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

/// Parse a flashcard list out of model output.
///
/// Models often wrap JSON in code fences or add chatter around it, so locate
/// the outermost array before deserializing.
fn parse_flashcards(raw: &str) -> OllamaResult<Vec<Flashcard>> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let start = cleaned.find('[');
    let end = cleaned.rfind(']');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => {
            return Err(OllamaError::BadOutput(format!(
                "no JSON array in flashcard response: {}",
                truncate_chars(cleaned, 120)
            )))
        }
    };

    let cards: Vec<Flashcard> = serde_json::from_str(json)?;
    if cards.is_empty() {
        return Err(OllamaError::BadOutput(
            "model returned an empty flashcard array".to_string(),
        ));
    }
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flashcards_plain_array() {
        let raw = r#"[{"question": "What is Rust?", "answer": "A systems language."}]"#;
        let cards = parse_flashcards(raw).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "What is Rust?");
    }

    #[test]
    fn test_parse_flashcards_fenced_with_chatter() {
        let raw = "Sure! Here are your flashcards:\n```json\n[\n  {\"question\": \"Q1\", \"answer\": \"A1\"},\n  {\"question\": \"Q2\", \"answer\": \"A2\"}\n]\n```\nLet me know if you need more.";
        let cards = parse_flashcards(raw).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].answer, "A2");
    }

    #[test]
    fn test_parse_flashcards_rejects_prose() {
        let err = parse_flashcards("I could not create flashcards.").unwrap_err();
        assert!(matches!(err, OllamaError::BadOutput(_)));
    }

    #[test]
    fn test_parse_flashcards_rejects_empty_array() {
        let err = parse_flashcards("[]").unwrap_err();
        assert!(matches!(err, OllamaError::BadOutput(_)));
    }

    #[test]
    fn test_truncate_chars_is_boundary_safe() {
        let text = "日本語のテキストです".repeat(10);
        let truncated = truncate_chars(&text, 5);
        assert!(truncated.starts_with("日本語のテ"));
        assert!(truncated.ends_with("..."));
        // Short input passes through untouched
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
