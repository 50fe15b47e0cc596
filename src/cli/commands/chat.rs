//! Interactive chat with web search and news tools.

use super::{load_prompts, require};
use crate::agent::ToolChat;
use crate::cli::preflight::Operation;
use crate::cli::{Line, Output, Repl};
use crate::config::Settings;
use crate::conversation::ToolInvocation;
use crate::llm::OpenAIChatModel;
use crate::tools::Toolbox;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, settings: Settings) -> Result<()> {
    require(Operation::Chat, &settings)?;

    let model_name = model.unwrap_or_else(|| settings.chat.model.clone());
    let model = Arc::new(OpenAIChatModel::from_settings(&settings, &model_name)?);
    let tools = Arc::new(Toolbox::from_settings(&settings)?);
    let prompts = load_prompts(&settings)?;

    if settings.news_api_key().is_err() {
        Output::warning(&format!(
            "{} is not set; fetch_news calls will fail.",
            settings.tools.news_api_key_env
        ));
    }

    let chat = ToolChat::new(model, tools)
        .with_system_prompt(&prompts.chat.system)
        .with_temperature(settings.chat.temperature)
        .with_observer(Arc::new(|call: &ToolInvocation| {
            println!("Model wants to call tool: {}", call.name);
            println!("Arguments: {}", call.arguments);
        }));

    Output::banner(&format!("--- Tool Chat Initialized ({}) ---", model_name));
    println!("Type 'exit' or 'quit' to close the program.");

    let mut repl = Repl::stdin("You: ");
    chat_loop(&mut repl, &chat).await
}

/// Answer each line independently until the user exits.
pub async fn chat_loop<R: BufRead, W: Write>(repl: &mut Repl<R, W>, chat: &ToolChat) -> Result<()> {
    loop {
        let message = match repl.read()? {
            Line::Exit => return Ok(()),
            Line::Clear => continue,
            Line::Message(message) => message,
        };

        match chat.respond(&message).await {
            Ok(reply) => repl.say(&format!("\nAgent: {}\n", reply.content))?,
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }
}
