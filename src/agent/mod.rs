//! Tool-calling flows.
//!
//! [`ToolChat`] answers one message with at most one tool call; [`Agent`]
//! loops over tool calls until the model produces a final answer.

mod runner;
mod tool_chat;

pub use runner::{Agent, AgentResponse};
pub use tool_chat::{ChatReply, ToolChat};

use crate::conversation::ToolInvocation;
use crate::tools::{parse_tool_call, ToolExecutor};
use std::sync::Arc;
use tracing::{info, warn};

/// Called with each tool invocation before it runs.
pub type ToolObserver = Arc<dyn Fn(&ToolInvocation) + Send + Sync>;

/// Record of a tool call made by the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool, or the error text.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// Parse and run one invocation. Failures become the result text so the
/// model can still respond.
pub(crate) async fn run_invocation(tools: &dyn ToolExecutor, invocation: &ToolInvocation) -> ToolCallRecord {
    info!("Calling tool: {} with args: {}", invocation.name, invocation.arguments);

    let outcome = match parse_tool_call(&invocation.name, &invocation.arguments) {
        Ok(call) => tools.execute(&call).await,
        Err(e) => Err(e),
    };
    let result = match outcome {
        Ok(output) => output,
        Err(e) => {
            warn!("Tool {} failed: {}", invocation.name, e);
            format!("Tool error: {}", e)
        }
    };

    ToolCallRecord {
        name: invocation.name.clone(),
        arguments: invocation.arguments.clone(),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::invocation;
    use crate::tools::testing::FakeToolbox;

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "search_web".to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "Found results".to_string(),
        };
        assert_eq!(format!("{}", record), r#"search_web({"query": "test"})"#);
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_result() {
        let tools = FakeToolbox::default();
        let record = run_invocation(&tools, &invocation("c1", "get_weather", r#"{"query":"Oslo"}"#)).await;
        assert_eq!(record.result, "Tool error: Unknown tool: get_weather");
        assert!(tools.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_tool_becomes_error_result() {
        let tools = FakeToolbox {
            fail: true,
            ..Default::default()
        };
        let record = run_invocation(&tools, &invocation("c1", "wikipedia", r#"{"query":"Oslo"}"#)).await;
        assert!(record.result.starts_with("Tool error: Tool failed: service unavailable"));
    }
}
