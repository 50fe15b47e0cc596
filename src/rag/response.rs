//! RAG response generation.

use super::context::{format_context_for_display, format_context_for_prompt};
use super::{ContextBuilder, ContextChunk};
use crate::config::Prompts;
use crate::conversation::{HistoryPolicy, Transcript, Turn};
use crate::error::{ColloquyError, Result};
use crate::llm::{ChatModel, CompletionOptions};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Conversational question answering over one collection.
pub struct RagEngine {
    model: Arc<dyn ChatModel>,
    context_builder: ContextBuilder,
    prompts: Prompts,
    temperature: Option<f32>,
    condense_question: bool,
    history_policy: HistoryPolicy,
    history: Vec<Turn>,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(model: Arc<dyn ChatModel>, context_builder: ContextBuilder) -> Self {
        Self {
            model,
            context_builder,
            prompts: Prompts::default(),
            temperature: None,
            condense_question: true,
            history_policy: HistoryPolicy::Unbounded,
            history: Vec::new(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Rewrite follow-ups into standalone questions before retrieval.
    pub fn with_condense_question(mut self, enabled: bool) -> Self {
        self.condense_question = enabled;
        self
    }

    pub fn with_history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.history_policy = policy;
        self
    }

    /// Conversation so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Answer a message in the context of the conversation so far.
    ///
    /// History is only extended when the answer succeeds.
    #[instrument(skip(self), fields(message = %message))]
    pub async fn chat(&mut self, message: &str) -> Result<RagResponse> {
        info!("Chat message: {}", message);

        let standalone = if self.condense_question && !self.history.is_empty() {
            Some(self.condense(message).await?)
        } else {
            None
        };
        let query = standalone.as_deref().unwrap_or(message);

        let context_chunks = self.context_builder.build(query).await?;

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(&context_chunks));
        let system = self.prompts.render_with_custom(&self.prompts.rag.system, &vars);

        let mut transcript = Transcript::with_system(&system);
        transcript.extend(self.history.iter().cloned());
        transcript.push(Turn::user(message));

        let options = CompletionOptions::default().with_temperature(self.temperature);
        let reply = self.model.complete(&transcript, &options).await?;

        let answer = reply
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ColloquyError::Rag("Empty response from LLM".to_string()))?;

        self.history.push(Turn::user(message));
        self.history.push(Turn::assistant(answer.clone()));
        let dropped = self.history_policy.apply(&mut self.history);
        if dropped > 0 {
            debug!("Dropped {} old turns from history", dropped);
        }

        Ok(RagResponse {
            answer,
            sources: context_chunks,
            standalone_question: standalone,
        })
    }

    /// Clear conversation history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Ask the model to turn a follow-up into a standalone question.
    async fn condense(&self, message: &str) -> Result<String> {
        let history = self
            .history
            .iter()
            .filter_map(|turn| {
                let text = turn.text()?;
                match turn {
                    Turn::User { .. } => Some(format!("Human: {}", text)),
                    Turn::Assistant { .. } => Some(format!("Assistant: {}", text)),
                    _ => None,
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("history".to_string(), history);
        vars.insert("question".to_string(), message.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.rag.condense, &vars);

        let mut transcript = Transcript::new();
        transcript.push(Turn::user(prompt));
        let options = CompletionOptions::default().with_temperature(self.temperature);
        let reply = self.model.complete(&transcript, &options).await?;

        let question = reply.content_or_default().trim().to_string();
        if question.is_empty() {
            Ok(message.to_string())
        } else {
            debug!("Condensed question: {}", question);
            Ok(question)
        }
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer.
    pub sources: Vec<ContextChunk>,
    /// Rewritten question used for retrieval, when condensing ran.
    pub standalone_question: Option<String>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            output.push_str(&format_context_for_display(&self.sources));
        }

        output
    }
}
