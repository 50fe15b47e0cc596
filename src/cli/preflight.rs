//! Pre-flight checks before expensive operations.
//!
//! Validates that API keys and inputs are available before a loop starts, so
//! a missing key fails fast instead of on the first prompt.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::Result;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chat model only.
    Chat,
    /// Chat model only.
    Research,
    /// Chat model only.
    Review,
    /// Chat model and embeddings.
    DocQa,
    /// Embeddings only.
    Ingest,
    /// Embeddings only.
    Search,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Chat | Operation::Research | Operation::Review => {
            settings.llm_api_key()?;
        }
        Operation::DocQa => {
            settings.llm_api_key()?;
            check_embedding_key(settings)?;
        }
        Operation::Ingest | Operation::Search => {
            check_embedding_key(settings)?;
        }
    }
    Ok(())
}

fn check_embedding_key(settings: &Settings) -> Result<()> {
    match settings.embedding.provider {
        EmbeddingProvider::Openai => settings.embedding_api_key().map(|_| ()),
        EmbeddingProvider::Local | EmbeddingProvider::Hashing => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_with_hashing_embedder_needs_nothing() {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::Hashing;
        assert!(check(Operation::Search, &settings).is_ok());
        assert!(check(Operation::Ingest, &settings).is_ok());
    }

    #[test]
    fn test_docqa_with_default_settings_needs_only_chat_key() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "COLLOQUY_TEST_DOCQA_CHAT_KEY".to_string();
        settings.embedding.api_key_env = "COLLOQUY_TEST_UNSET_EMBEDDING_KEY".to_string();
        std::env::set_var("COLLOQUY_TEST_DOCQA_CHAT_KEY", "sk-test");

        assert!(check(Operation::DocQa, &settings).is_ok());
        assert!(check(Operation::Ingest, &settings).is_ok());

        settings.embedding.provider = EmbeddingProvider::Openai;
        let err = check(Operation::DocQa, &settings).unwrap_err();
        assert!(err.to_string().contains("COLLOQUY_TEST_UNSET_EMBEDDING_KEY"));
    }

    #[test]
    fn test_missing_llm_key_fails() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "COLLOQUY_TEST_UNSET_LLM_KEY".to_string();
        let err = check(Operation::Chat, &settings).unwrap_err();
        assert!(err.to_string().contains("COLLOQUY_TEST_UNSET_LLM_KEY"));
    }
}
