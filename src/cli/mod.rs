//! CLI module for Colloquy.

pub mod commands;
mod output;
pub mod preflight;
pub mod repl;

pub use output::{content_preview, Output};
pub use repl::{Line, Repl};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Colloquy - terminal chat loops over hosted language models
///
/// Tool-calling chat, a research agent, a resume reviewer and question
/// answering over PDF documents.
#[derive(Parser, Debug)]
#[command(name = "colloquy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with a model that can search the web and fetch news
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask a research agent that uses Wikipedia and web search
    Research {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Review resumes (.pdf, .txt, .md) and print a validated score
    Review {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask questions about a PDF document
    Docqa {
        /// PDF (or text) document to ingest and query
        pdf: PathBuf,

        /// Delete previously stored records for this document before ingesting
        #[arg(long)]
        replace: bool,

        /// Query what is already stored instead of ingesting again
        #[arg(long, conflicts_with = "replace")]
        skip_ingest: bool,

        /// Collection to store and search
        #[arg(long)]
        collection: Option<String>,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Chunk, embed and store a document without starting a chat
    Ingest {
        /// Document to ingest
        pdf: PathBuf,

        /// Delete previously stored records for this document first
        #[arg(long)]
        replace: bool,

        /// Collection to store into
        #[arg(long)]
        collection: Option<String>,
    },

    /// Search stored chunks by similarity
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (-1.0 to 1.0)
        #[arg(short, long, default_value = "0.0")]
        min_score: f32,

        /// Collection to search
        #[arg(long)]
        collection: Option<String>,
    },

    /// List collections and stored documents
    List,

    /// Check API keys and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
