//! Chat model abstraction.
//!
//! Flows talk to the model through [`ChatModel`] so the client handle is
//! passed in explicitly and tests can drive a loop with a scripted model.

mod openai;

pub use openai::OpenAIChatModel;

use crate::conversation::{ToolInvocation, Transcript, Turn};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A callable tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// Tools the model may call. Empty sends no tool list.
    pub tools: Vec<ToolSpec>,
    pub temperature: Option<f32>,
    /// Ask the provider for a JSON object reply.
    pub json_object: bool,
}

impl CompletionOptions {
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn json_object(mut self) -> Self {
        self.json_object = true;
        self
    }
}

/// The model's reply to one completion request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ModelReply {
    /// A plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply that requests tool calls.
    pub fn tool_calls(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Text content, empty when the model sent none.
    pub fn content_or_default(&self) -> String {
        self.content.clone().unwrap_or_default()
    }

    /// The reply as a transcript turn.
    pub fn to_turn(&self) -> Turn {
        Turn::Assistant {
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
        }
    }
}

/// Trait for chat completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the transcript and return the model's reply.
    async fn complete(&self, transcript: &Transcript, options: &CompletionOptions) -> Result<ModelReply>;

    /// Model identifier, for logs and banners.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted model for driving loops in tests.

    use super::*;
    use crate::error::ColloquyError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns queued replies in order and records every request.
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<std::result::Result<ModelReply, String>>>,
        requests: Mutex<Vec<(Transcript, CompletionOptions)>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<ModelReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(Ok).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Queue a transport failure.
        pub fn push_error(&self, message: &str) {
            self.replies.lock().unwrap().push_back(Err(message.to_string()));
        }

        pub fn push_reply(&self, reply: ModelReply) {
            self.replies.lock().unwrap().push_back(Ok(reply));
        }

        pub fn requests(&self) -> Vec<(Transcript, CompletionOptions)> {
            self.requests.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            transcript: &Transcript,
            options: &CompletionOptions,
        ) -> Result<ModelReply> {
            transcript.check_ready()?;
            self.requests
                .lock()
                .unwrap()
                .push((transcript.clone(), options.clone()));
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(message)) => Err(ColloquyError::OpenAI(message)),
                None => Err(ColloquyError::OpenAI("script exhausted".to_string())),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    /// Build a tool invocation.
    pub fn invocation(id: &str, name: &str, arguments: &str) -> ToolInvocation {
        ToolInvocation {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }
}
