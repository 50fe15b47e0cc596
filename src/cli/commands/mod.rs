//! CLI command implementations.

mod chat;
mod config;
mod docqa;
mod doctor;
mod ingest;
mod list;
mod research;
mod review;
mod search;

pub use chat::{chat_loop, run_chat};
pub use config::run_config;
pub use docqa::{docqa_loop, run_docqa};
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use list::run_list;
pub use research::{research_loop, run_research};
pub use review::{review_loop, run_review};
pub use search::run_search;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};

/// Run pre-flight checks, pointing at `doctor` on failure.
fn require(operation: Operation, settings: &Settings) -> crate::error::Result<()> {
    if let Err(e) = preflight::check(operation, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'colloquy doctor' for detailed diagnostics.");
        return Err(e);
    }
    Ok(())
}

/// Prompts with any custom directory and variables from settings applied.
fn load_prompts(settings: &Settings) -> crate::error::Result<Prompts> {
    Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )
}
