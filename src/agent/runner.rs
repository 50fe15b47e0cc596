//! Agent runner with tool calling loop.

use super::{run_invocation, ToolCallRecord, ToolObserver};
use crate::conversation::{Transcript, Turn};
use crate::error::{ColloquyError, Result};
use crate::llm::{ChatModel, CompletionOptions};
use crate::tools::{tool_specs, Tool, ToolExecutor};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Multi-step research agent.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: Arc<dyn ToolExecutor>,
    offered: Vec<Tool>,
    max_iterations: usize,
    system_prompt: String,
    temperature: Option<f32>,
    observer: Option<ToolObserver>,
}

impl Agent {
    /// Create an agent offering the research tools.
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<dyn ToolExecutor>, system_prompt: &str) -> Self {
        Self {
            model,
            tools,
            offered: Tool::RESEARCH.to_vec(),
            max_iterations: 15,
            system_prompt: system_prompt.to_string(),
            temperature: Some(0.0),
            observer: None,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_observer(mut self, observer: ToolObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run the agent on a task until it answers without calling a tool.
    #[instrument(skip(self), fields(task = %task))]
    pub async fn run(&self, task: &str) -> Result<AgentResponse> {
        let mut transcript = Transcript::with_system(&self.system_prompt);
        transcript.push(Turn::user(task));

        let options = CompletionOptions::default()
            .with_tools(tool_specs(&self.offered))
            .with_temperature(self.temperature);

        let mut tool_calls_made = Vec::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(ColloquyError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);
            let reply = self.model.complete(&transcript, &options).await?;

            if !reply.has_tool_calls() {
                return Ok(AgentResponse {
                    content: reply.content_or_default(),
                    tool_calls: tool_calls_made,
                    iterations,
                });
            }

            transcript.push(reply.to_turn());
            for invocation in &reply.tool_calls {
                if let Some(observer) = &self.observer {
                    observer(invocation);
                }
                let record = run_invocation(self.tools.as_ref(), invocation).await;
                transcript.push(Turn::tool_result(&invocation.id, &record.result));
                tool_calls_made.push(record);
            }
        }
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}
