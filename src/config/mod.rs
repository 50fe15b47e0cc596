//! Configuration module for Colloquy.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts, RagPrompts, ResearchPrompts, ReviewPrompts};
pub use settings::{
    ChatSettings, ChunkingSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings,
    LlmSettings, PromptSettings, RagSettings, ResearchSettings, ReviewSettings, Settings,
    ToolSettings, VectorStoreSettings,
};
