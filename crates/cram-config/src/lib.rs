//! Cram Config - Configuration loading and platform paths.

mod config;
mod error;
mod paths;

pub use config::{
    ChunkingConfig, Config, DownloadConfig, GeneralConfig, OcrConfig, OllamaConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use paths::AppPaths;
