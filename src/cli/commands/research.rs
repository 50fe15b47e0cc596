//! Research agent command.

use super::{load_prompts, require};
use crate::agent::Agent;
use crate::cli::preflight::Operation;
use crate::cli::{Line, Output, Repl};
use crate::config::Settings;
use crate::conversation::ToolInvocation;
use crate::llm::OpenAIChatModel;
use crate::tools::Toolbox;
use anyhow::Result;
use console::style;
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Run the research agent loop.
pub async fn run_research(model: Option<String>, settings: Settings) -> Result<()> {
    require(Operation::Research, &settings)?;

    let model_name = model.unwrap_or_else(|| settings.research.model.clone());
    let model = Arc::new(OpenAIChatModel::from_settings(&settings, &model_name)?);
    let tools = Arc::new(Toolbox::from_settings(&settings)?);
    let prompts = load_prompts(&settings)?;

    let agent = Agent::new(model, tools, &prompts.research.system)
        .with_max_iterations(settings.research.max_iterations)
        .with_temperature(settings.research.temperature)
        .with_observer(Arc::new(|call: &ToolInvocation| {
            println!(
                "{} `{}` with `{}`",
                style("Invoking:").dim(),
                call.name,
                call.arguments
            );
        }));

    Output::banner("--- Research Assistant Agent Initialized ---");

    let mut repl = Repl::stdin("You: ");
    research_loop(&mut repl, &agent).await
}

/// Run the agent once per line until the user exits.
pub async fn research_loop<R: BufRead, W: Write>(repl: &mut Repl<R, W>, agent: &Agent) -> Result<()> {
    loop {
        let task = match repl.read()? {
            Line::Exit => return Ok(()),
            Line::Clear => continue,
            Line::Message(task) => task,
        };

        match agent.run(&task).await {
            Ok(response) => {
                tracing::info!(
                    "Research finished in {} iteration(s) with {} tool call(s)",
                    response.iterations,
                    response.tool_calls.len()
                );
                repl.say(&format!("\nAgent Final Answer: {}\n", response.content))?;
            }
            Err(e) => {
                repl.say(&format!("\nAn error occurred during execution: {}", e))?;
                repl.say("Please try a different query or check your API keys.")?;
            }
        }
    }
}
