//! Chat completions over an OpenAI-compatible API.

use super::{ChatModel, CompletionOptions, ModelReply, ToolSpec};
use crate::config::Settings;
use crate::conversation::{ToolInvocation, Transcript, Turn};
use crate::error::{ColloquyError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject, ResponseFormat,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat model backed by an async-openai client.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    /// Wrap an existing client.
    pub fn new(client: async_openai::Client<async_openai::config::OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    /// Build a client from the `[llm]` settings for the given model.
    pub fn from_settings(settings: &Settings, model: &str) -> Result<Self> {
        let api_key = settings.llm_api_key()?;
        let client = create_client(
            &settings.llm.base_url,
            &api_key,
            Duration::from_secs(settings.llm.timeout_secs),
        )?;
        Ok(Self::new(client, model))
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, transcript, options), fields(model = %self.model, turns = transcript.len()))]
    async fn complete(&self, transcript: &Transcript, options: &CompletionOptions) -> Result<ModelReply> {
        transcript.check_ready()?;

        let messages = transcript
            .turns()
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if !options.tools.is_empty() {
            args.tools(options.tools.iter().map(to_tool).collect::<Vec<_>>());
        }
        if let Some(temperature) = options.temperature {
            args.temperature(temperature);
        }
        if options.json_object {
            args.response_format(ResponseFormat::JsonObject);
        }
        let request = args.build().map_err(|e| ColloquyError::OpenAI(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ColloquyError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ColloquyError::OpenAI("No response from model".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolInvocation {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect::<Vec<_>>();

        debug!("Model replied with {} tool call(s)", tool_calls.len());

        Ok(ModelReply {
            content: choice.message.content,
            tool_calls,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn to_request_message(turn: &Turn) -> Result<ChatCompletionRequestMessage> {
    let message = match turn {
        Turn::System { content } => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.as_str())
            .build()
            .map_err(|e| ColloquyError::OpenAI(e.to_string()))?
            .into(),
        Turn::User { content } => ChatCompletionRequestUserMessageArgs::default()
            .content(content.as_str())
            .build()
            .map_err(|e| ColloquyError::OpenAI(e.to_string()))?
            .into(),
        Turn::Assistant { content, tool_calls } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(content) = content {
                args.content(content.as_str());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(
                    tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            args.build()
                .map_err(|e| ColloquyError::OpenAI(e.to_string()))?
                .into()
        }
        Turn::Tool { call_id, content } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(call_id.as_str())
            .content(content.as_str())
            .build()
            .map_err(|e| ColloquyError::OpenAI(e.to_string()))?
            .into(),
    };
    Ok(message)
}

fn to_tool(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.parameters.clone()),
            strict: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_turns_convert() {
        let request = Turn::tool_request(vec![ToolInvocation {
            id: "call_123".to_string(),
            name: "search_web".to_string(),
            arguments: r#"{"query":"rust"}"#.to_string(),
        }]);
        let message = to_request_message(&request).unwrap();
        assert!(matches!(message, ChatCompletionRequestMessage::Assistant(_)));

        let result = to_request_message(&Turn::tool_result("call_123", "results")).unwrap();
        match result {
            ChatCompletionRequestMessage::Tool(tool) => assert_eq!(tool.tool_call_id, "call_123"),
            other => panic!("Expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_spec_converts() {
        let spec = ToolSpec {
            name: "wikipedia".to_string(),
            description: "Look things up".to_string(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let tool = to_tool(&spec);
        assert_eq!(tool.function.name, "wikipedia");
        assert_eq!(tool.function.description.as_deref(), Some("Look things up"));
    }

    #[tokio::test]
    async fn test_unready_transcript_fails_before_network() {
        let client = crate::openai::create_default_client("http://127.0.0.1:9", "test-key").unwrap();
        let model = OpenAIChatModel::new(client, "m");

        let mut transcript = Transcript::new();
        transcript.push(Turn::tool_request(vec![ToolInvocation {
            id: "x".to_string(),
            name: "search_web".to_string(),
            arguments: "{}".to_string(),
        }]));

        let err = model
            .complete(&transcript, &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ColloquyError::Transcript(_)));
    }
}
