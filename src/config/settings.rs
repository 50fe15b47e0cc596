//! Configuration settings for Colloquy.

use crate::error::{ColloquyError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub chat: ChatSettings,
    pub research: ResearchSettings,
    pub review: ReviewSettings,
    pub rag: RagSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub tools: ToolSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Load a `.env` file from the working directory at startup.
    pub load_dotenv: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.colloquy".to_string(),
            load_dotenv: true,
        }
    }
}

/// Connection settings for the OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// API base URL (OpenRouter by default).
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// HTTP timeout for model requests, in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Tool-search chatbot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub model: String,
    /// Sampling temperature. None leaves it to the provider.
    pub temperature: Option<f32>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-chat-v3.1:free".to_string(),
            temperature: None,
        }
    }
}

/// Research agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    pub model: String,
    pub temperature: f32,
    /// Maximum model calls per question before giving up.
    pub max_iterations: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-chat-v3.1:free".to_string(),
            temperature: 0.0,
            max_iterations: 15,
        }
    }
}

/// Resume reviewer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            model: "openai/gpt-oss-120b:free".to_string(),
            temperature: 0.2,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for response generation.
    pub model: String,
    pub temperature: f32,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Minimum cosine similarity for a chunk to be used.
    pub min_score: f32,
    /// Conversation turns kept between questions. 0 keeps everything.
    pub max_history_turns: usize,
    /// Rewrite follow-up questions into standalone ones before retrieval.
    pub condense_question: bool,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-chat-v3.1".to_string(),
            temperature: 0.1,
            top_k: 3,
            min_score: 0.0,
            max_history_turns: 0,
            condense_question: true,
        }
    }
}

/// Text splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Break points in priority order. An empty string means a hard cut.
    pub separators: Vec<String>,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// fastembed all-MiniLM-L6-v2 on the CPU (default).
    #[default]
    Local,
    /// OpenAI embeddings API.
    Openai,
    /// Feature-hashing stub for tests and fully offline runs.
    Hashing,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "fastembed" => Ok(EmbeddingProvider::Local),
            "openai" => Ok(EmbeddingProvider::Openai),
            "hashing" | "hash" => Ok(EmbeddingProvider::Hashing),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::Local => write!(f, "local"),
            EmbeddingProvider::Openai => write!(f, "openai"),
            EmbeddingProvider::Hashing => write!(f, "hashing"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Embedding model to use (openai provider).
    pub model: String,
    /// Embedding dimensions for the openai and hashing providers. The local
    /// model always produces 384.
    pub dimensions: u32,
    /// API base URL for the openai provider.
    pub base_url: String,
    /// Environment variable holding the embeddings API key.
    pub api_key_env: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Local,
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Path to the SQLite database.
    pub path: String,
    /// Collection used when none is given on the command line.
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            path: "~/.colloquy/vectors.db".to_string(),
            collection: "pdf_summarizer_memory".to_string(),
        }
    }
}

/// External tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Environment variable holding the NewsAPI key.
    pub news_api_key_env: String,
    /// Web search results returned to the model.
    pub search_results: usize,
    /// News articles fetched from the API.
    pub news_page_size: usize,
    /// News articles included in the tool output.
    pub news_articles: usize,
    /// Character cap on the Wikipedia summary.
    pub wikipedia_max_chars: usize,
    /// User-Agent sent to search and Wikipedia endpoints.
    pub user_agent: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            news_api_key_env: "NEWSAPI_KEY".to_string(),
            search_results: 5,
            news_page_size: 5,
            news_articles: 3,
            wikipedia_max_chars: 1500,
            user_agent: concat!("colloquy/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject combinations the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(ColloquyError::Config(
                "chunking.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ColloquyError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(ColloquyError::Config("rag.top_k must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ColloquyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("colloquy")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.path)
    }

    /// Read the chat model API key from the configured environment variable.
    pub fn llm_api_key(&self) -> Result<String> {
        read_key(&self.llm.api_key_env)
    }

    /// Read the embeddings API key from the configured environment variable.
    pub fn embedding_api_key(&self) -> Result<String> {
        read_key(&self.embedding.api_key_env)
    }

    /// Read the NewsAPI key from the configured environment variable.
    pub fn news_api_key(&self) -> Result<String> {
        read_key(&self.tools.news_api_key_env)
    }
}

fn read_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(ColloquyError::Config(format!(
            "{var} is empty. Set it in your environment or in a .env file."
        ))),
        Err(_) => Err(ColloquyError::Config(format!(
            "{var} not set. Set it in your environment or in a .env file."
        ))),
    }
}
