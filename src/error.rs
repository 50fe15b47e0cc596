//! Error types for Colloquy.

use thiserror::Error;

/// Library-level error type for Colloquy operations.
#[derive(Error, Debug)]
pub enum ColloquyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type: {0}. Please provide a .pdf, .txt, or .md file.")]
    UnsupportedFile(String),

    #[error("The file is empty or no text could be extracted: {0}")]
    EmptyDocument(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("Model returned invalid structured output: {message}")]
    Validation { message: String, raw: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Model API error: {0}")]
    OpenAI(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool failed: {0}")]
    ToolFailed(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl From<lopdf::Error> for ColloquyError {
    fn from(e: lopdf::Error) -> Self {
        ColloquyError::Pdf(e.to_string())
    }
}

/// Result type alias for Colloquy operations.
pub type Result<T> = std::result::Result<T, ColloquyError>;
