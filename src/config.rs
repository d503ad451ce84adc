//! Configuration management for Docq
//!
//! Loads a TOML config file, applies `DOCQ_SECTION__KEY` environment variable
//! overrides, and validates the result. Every field has a safe default; the
//! completion credential is read from the environment only and never stored.

use crate::error::{DocqError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Source and index directory locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned for .pdf/.md/.txt source files
    pub data_dir: PathBuf,
    /// Directory holding the two persisted index artifacts
    pub index_dir: PathBuf,
}

/// Chunk window sizes, in characters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub text_chunk_chars: usize,
    pub pdf_chunk_chars: usize,
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "fastembed" (local ONNX model) or "hashing" (deterministic, no I/O)
    pub backend: String,
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
}

/// Retrieval and context-assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks retrieved per query inside the pipeline
    pub top_k: usize,
    /// Minimum best-chunk cosine similarity for auto-routing to documents
    pub confidence_threshold: f32,
    /// Character budget for the assembled context
    pub max_context_chars: usize,
}

/// Completion provider (OpenAI-compatible chat endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Pipeline routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// When false, queries never fall back to open-domain chat
    pub allow_general_chat: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            index_dir: PathBuf::from("index/store"),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            text_chunk_chars: 700,
            pdf_chunk_chars: 900,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "fastembed".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            batch_size: 64,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            confidence_threshold: 0.12,
            max_context_chars: 10_000,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.2,
            max_tokens: 700,
            timeout_secs: 60,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            allow_general_chat: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            completion: CompletionConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocqError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DocqError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| DocqError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Default config file location: ~/.config/docq/config.toml
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| DocqError::Config("Cannot determine config directory".to_string()))?;
        Ok(base.join("docq").join("config.toml"))
    }

    /// Apply environment variable overrides
    /// Environment variables in format: DOCQ_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("DOCQ_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "PATHS__DATA_DIR" => {
                self.paths.data_dir = PathBuf::from(value);
            }
            "PATHS__INDEX_DIR" => {
                self.paths.index_dir = PathBuf::from(value);
            }
            "EMBEDDING__BACKEND" => {
                self.embedding.backend = value.to_string();
            }
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            "RETRIEVAL__CONFIDENCE_THRESHOLD" => {
                self.retrieval.confidence_threshold =
                    value.parse().map_err(|_| DocqError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as float", value),
                    })?;
            }
            "COMPLETION__BASE_URL" => {
                self.completion.base_url = value.trim_end_matches('/').to_string();
            }
            "COMPLETION__MODEL" => {
                self.completion.model = value.to_string();
            }
            _ => {
                tracing::debug!("Unknown config override: DOCQ_{}", path);
            }
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(DocqError::InvalidConfigValue {
                path: "embedding.dimension".to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }
        if self.embedding.backend != "fastembed" && self.embedding.backend != "hashing" {
            return Err(DocqError::InvalidConfigValue {
                path: "embedding.backend".to_string(),
                message: format!(
                    "Unknown backend '{}'. Supported: fastembed, hashing",
                    self.embedding.backend
                ),
            });
        }
        if self.chunking.text_chunk_chars == 0 || self.chunking.pdf_chunk_chars == 0 {
            return Err(DocqError::InvalidConfigValue {
                path: "chunking".to_string(),
                message: "Chunk sizes must be greater than zero".to_string(),
            });
        }
        if self.retrieval.top_k == 0 {
            return Err(DocqError::InvalidConfigValue {
                path: "retrieval.top_k".to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }
        if !(-1.0..=1.0).contains(&self.retrieval.confidence_threshold) {
            return Err(DocqError::InvalidConfigValue {
                path: "retrieval.confidence_threshold".to_string(),
                message: "Cosine similarity threshold must be within [-1, 1]".to_string(),
            });
        }
        Ok(())
    }
}
