//! Single-turn chat with at most one tool call.

use super::{run_invocation, ToolCallRecord, ToolObserver};
use crate::conversation::{ToolInvocation, Transcript, Turn};
use crate::error::Result;
use crate::llm::{ChatModel, CompletionOptions};
use crate::tools::{tool_specs, Tool, ToolExecutor};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Answer to one chat message.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    /// The tool call that was honored, if any.
    pub tool_call: Option<ToolCallRecord>,
}

/// Answers each message independently, letting the model call one tool.
pub struct ToolChat {
    model: Arc<dyn ChatModel>,
    tools: Arc<dyn ToolExecutor>,
    offered: Vec<Tool>,
    system_prompt: String,
    temperature: Option<f32>,
    observer: Option<ToolObserver>,
}

impl ToolChat {
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<dyn ToolExecutor>) -> Self {
        Self {
            model,
            tools,
            offered: Tool::CHAT.to_vec(),
            system_prompt: String::new(),
            temperature: None,
            observer: None,
        }
    }

    /// Prepend a system prompt. Empty means none.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_tools(mut self, tools: &[Tool]) -> Self {
        self.offered = tools.to_vec();
        self
    }

    pub fn with_observer(mut self, observer: ToolObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Answer one message. No history is carried between calls.
    #[instrument(skip(self), fields(message = %message))]
    pub async fn respond(&self, message: &str) -> Result<ChatReply> {
        let mut transcript = Transcript::with_system(&self.system_prompt);
        transcript.push(Turn::user(message));

        let options = CompletionOptions::default().with_temperature(self.temperature);
        let first = self
            .model
            .complete(&transcript, &options.clone().with_tools(tool_specs(&self.offered)))
            .await?;

        let Some(requested) = first.tool_calls.first() else {
            return Ok(ChatReply {
                content: first.content_or_default(),
                tool_call: None,
            });
        };

        if first.tool_calls.len() > 1 {
            debug!("Model requested {} tool calls; honoring the first", first.tool_calls.len());
        }

        let invocation = ToolInvocation {
            id: if requested.id.is_empty() {
                "call_0".to_string()
            } else {
                requested.id.clone()
            },
            name: requested.name.clone(),
            arguments: requested.arguments.clone(),
        };
        if let Some(observer) = &self.observer {
            observer(&invocation);
        }

        let record = run_invocation(self.tools.as_ref(), &invocation).await;

        transcript.push(Turn::tool_request(vec![invocation.clone()]));
        transcript.push(Turn::tool_result(&invocation.id, &record.result));

        let second = self.model.complete(&transcript, &options).await?;

        Ok(ChatReply {
            content: second.content_or_default(),
            tool_call: Some(record),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::llm::testing::{invocation, ScriptedModel};
    use crate::llm::ModelReply;
    use crate::tools::testing::FakeToolbox;
    use crate::tools::ToolCall;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_direct_answer_without_tools() {
        let model = Arc::new(ScriptedModel::new(vec![ModelReply::text("Hello there")]));
        let tools = Arc::new(FakeToolbox::default());
        let chat = ToolChat::new(model.clone(), tools.clone());

        let reply = chat.respond("hi").await.unwrap();
        assert_eq!(reply.content, "Hello there");
        assert!(reply.tool_call.is_none());
        assert_eq!(model.call_count(), 1);
        assert_eq!(model.requests()[0].1.tools.len(), 2);
    }

    #[tokio::test]
    async fn test_only_first_tool_call_is_honored() {
        let model = Arc::new(ScriptedModel::new(vec![
            ModelReply::tool_calls(vec![
                invocation("call_a", "fetch_news", r#"{"query":"rust"}"#),
                invocation("call_b", "search_web", r#"{"query":"tokio"}"#),
            ]),
            ModelReply::text("Here is the news."),
        ]));
        let tools = Arc::new(FakeToolbox::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_observer = seen.clone();
        let chat = ToolChat::new(model.clone(), tools.clone()).with_observer(Arc::new(move |call: &ToolInvocation| {
            seen_by_observer.lock().unwrap().push(call.name.clone());
        }));

        let reply = chat.respond("what's new in rust?").await.unwrap();
        assert_eq!(reply.content, "Here is the news.");
        assert_eq!(
            *tools.calls.lock().unwrap(),
            vec![ToolCall::FetchNews { query: "rust".to_string() }]
        );
        assert_eq!(*seen.lock().unwrap(), vec!["fetch_news".to_string()]);

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        let (second, options) = &requests[1];
        assert!(options.tools.is_empty());
        let roles: Vec<Role> = second.turns().iter().map(|t| t.role()).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
        match &second.turns()[1] {
            Turn::Assistant { tool_calls, .. } => {
                assert_eq!(tool_calls.len(), 1);
                assert_eq!(tool_calls[0].id, "call_a");
            }
            other => panic!("Expected assistant turn, got {:?}", other),
        }
        assert_eq!(
            second.turns()[2],
            Turn::tool_result("call_a", "fetch_news results for rust")
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_still_gets_an_answer() {
        let model = Arc::new(ScriptedModel::new(vec![
            ModelReply::tool_calls(vec![invocation("call_1", "get_weather", r#"{"query":"Oslo"}"#)]),
            ModelReply::text("I can't check the weather."),
        ]));
        let chat = ToolChat::new(model.clone(), Arc::new(FakeToolbox::default()));

        let reply = chat.respond("weather in Oslo?").await.unwrap();
        assert_eq!(reply.content, "I can't check the weather.");
        let record = reply.tool_call.unwrap();
        assert!(record.result.contains("Unknown tool: get_weather"));
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_turns_are_independent() {
        let model = Arc::new(ScriptedModel::new(vec![
            ModelReply::text("one"),
            ModelReply::text("two"),
        ]));
        let chat = ToolChat::new(model.clone(), Arc::new(FakeToolbox::default()));
        chat.respond("first").await.unwrap();
        chat.respond("second").await.unwrap();

        let requests = model.requests();
        assert_eq!(requests[1].0.turns(), &[Turn::user("second")]);
    }
}
