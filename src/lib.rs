//! Colloquy - terminal chat loops over hosted language models
//!
//! A small set of command-line flows that wire OpenAI-compatible chat models to
//! a few tools and a local vector store.
//!
//! # Overview
//!
//! Colloquy allows you to:
//! - Chat with a model that can search the web and fetch news
//! - Run a research agent over Wikipedia and web search
//! - Review resumes with validated structured output
//! - Ask questions about a PDF with retrieval and conversation memory
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `document` - PDF and text loading
//! - `chunking` - Recursive character splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector storage and similarity search
//! - `ingest` - Load, split, embed and store pipeline
//! - `conversation` - Transcript and history types
//! - `llm` - Chat model abstraction
//! - `rag` - Retrieval-augmented question answering
//! - `tools` - Web search, news and Wikipedia tools
//! - `agent` - Tool-calling chat and research agent
//! - `review` - Structured resume review
//!
//! # Example
//!
//! ```rust,no_run
//! use colloquy::config::Settings;
//! use colloquy::ingest::Ingestor;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let ingestor = Ingestor::from_settings(&settings)?;
//!
//!     let report = ingestor.ingest(Path::new("report.pdf"), false).await?;
//!     println!("Stored {} chunks", report.records);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod document;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod review;
pub mod tools;
pub mod vector_store;

pub use error::{ColloquyError, Result};
