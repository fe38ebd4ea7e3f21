//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &PathBuf) -> ConfigResult<()> {
        let default_config = Self::default_config_string();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, default_config)?;
        Ok(())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if !(0.0..=100.0).contains(&self.ocr.accept_confidence) {
            return Err(ConfigError::Invalid(format!(
                "ocr.accept_confidence ({}) must be between 0 and 100",
                self.ocr.accept_confidence
            )));
        }
        if self.ocr.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "ocr.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Cram Configuration
# Turn a batch of study files into summaries, flashcards, and study guides.

[general]
# Data directory for database and cache
# data_dir = "~/.local/share/cram"

[download]
# Per-attempt timeout in seconds
timeout_seconds = 30

# Delay between transport strategies after a failure, in milliseconds
strategy_delay_ms = 1000

# Maximum redirects followed by the standard client
max_redirects = 10

[ocr]
# Tesseract language code
language = "eng"

# Accept an OCR result immediately at or above this confidence (0-100)
accept_confidence = 70.0

# Maximum recognition attempts per file
max_attempts = 3

# Per-attempt recognition timeout in seconds
attempt_timeout_seconds = 45

# Worker initialization timeout in seconds
init_timeout_seconds = 15

# Delay between attempts in milliseconds
retry_delay_ms = 500

[chunking]
# Target chunk size in characters
chunk_size = 1000

# Characters of overlap between consecutive chunks
chunk_overlap = 100

[ollama]
# Ollama server address
host = "http://localhost:11434"

# Model used for summaries, flashcards, and study guides
model = "llama3.1:8b"

# Request timeout in seconds
timeout_seconds = 120
"#
        .to_string()
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Override for the data directory.
    pub data_dir: Option<PathBuf>,
}

/// Download manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub timeout_seconds: u64,
    pub strategy_delay_ms: u64,
    pub max_redirects: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            strategy_delay_ms: 1000,
            max_redirects: 10,
        }
    }
}

/// OCR engine and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub language: String,
    pub accept_confidence: f32,
    pub max_attempts: u32,
    pub attempt_timeout_seconds: u64,
    pub init_timeout_seconds: u64,
    pub retry_delay_ms: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            accept_confidence: 70.0,
            max_attempts: 3,
            attempt_timeout_seconds: 45,
            init_timeout_seconds: 15,
            retry_delay_ms: 500,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// Ollama connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            timeout_seconds: 120,
        }
    }
}
