use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub kgqa: KgqaConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub recognizer: RecognizerConfig,
}

/// Core settings
#[derive(Debug, Clone, Deserialize)]
pub struct KgqaConfig {
    /// GraphML file holding the entity graph
    pub graph_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which embedder backs the semantic intent fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local feature-hashing embedder, no network
    Hashing,
    /// OpenAI embeddings API
    Openai,
}

/// Embeddings configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_provider")]
    pub provider: EmbeddingProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Entity recognizer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerConfig {
    /// Run the gazetteer pass before substring matching
    #[serde(default = "default_structured")]
    pub structured: bool,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            structured: default_structured(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> EmbeddingProvider {
    EmbeddingProvider::Hashing
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    100
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_structured() -> bool {
    true
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KGQA_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("KGQA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_file(&config_path)
    }

    /// Load and validate a specific config file
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if !self.kgqa.graph_path.exists() {
            anyhow::bail!(
                "graph_path does not exist: {}. Set graph_path in config.toml to your GraphML file.",
                self.kgqa.graph_path.display()
            );
        }

        if !self.kgqa.graph_path.is_file() {
            anyhow::bail!(
                "graph_path must be a file, not a directory: {}",
                self.kgqa.graph_path.display()
            );
        }

        if self.embeddings.dimensions == 0 {
            anyhow::bail!("embeddings.dimensions must be greater than 0");
        }

        if self.embeddings.provider == EmbeddingProvider::Openai {
            std::env::var(&self.embeddings.api_key_env).with_context(|| {
                format!(
                    "Environment variable {} not set. Set it in your .env file or as an environment variable with your OpenAI API key.",
                    self.embeddings.api_key_env
                )
            })?;

            if self.embeddings.batch_size == 0 {
                anyhow::bail!("embeddings.batch_size must be greater than 0");
            }
        }

        Ok(())
    }

    /// Get the GraphML path
    pub fn graph_path(&self) -> &Path {
        &self.kgqa.graph_path
    }
}
