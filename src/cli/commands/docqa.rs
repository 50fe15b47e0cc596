//! Question answering over a PDF document.

use super::{load_prompts, require};
use crate::cli::preflight::Operation;
use crate::cli::{Line, Output, Repl};
use crate::config::Settings;
use crate::conversation::HistoryPolicy;
use crate::ingest::Ingestor;
use crate::llm::OpenAIChatModel;
use crate::rag::{ContextBuilder, RagEngine};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

/// Ingest the document, then answer questions about it.
pub async fn run_docqa(
    pdf: &Path,
    replace: bool,
    skip_ingest: bool,
    collection: Option<String>,
    model: Option<String>,
    settings: Settings,
) -> Result<()> {
    require(Operation::DocQa, &settings)?;

    if !pdf.exists() {
        Output::error(&format!(
            "Please create a file named '{}' or pass the path of an existing document.",
            pdf.display()
        ));
        return Err(anyhow::anyhow!("Document not found: {}", pdf.display()));
    }

    let mut ingestor = Ingestor::from_settings(&settings)?;
    if let Some(name) = &collection {
        ingestor = ingestor.with_collection(name);
    }

    if skip_ingest {
        let source = std::fs::canonicalize(pdf)?.display().to_string();
        if !ingestor.store().has_source(ingestor.collection(), &source).await? {
            Output::warning(&format!(
                "Nothing stored for {} in '{}'. Answers will have no document context.",
                source,
                ingestor.collection()
            ));
        }
    } else {
        Output::info(&format!("--- 1/3: Loading and Splitting {} ---", pdf.display()));
        let spinner = Output::spinner("Chunking and embedding...");
        let outcome = ingestor.ingest(pdf, replace).await;
        spinner.finish_and_clear();
        let report = outcome?;
        Output::info(&format!("Loaded and split into {} chunks.", report.chunks));

        Output::info("--- 2/3: Creating Vector Store (RAG Memory) ---");
        if report.duplicate {
            Output::warning("This document was already stored; its chunks were appended again. Use --replace to avoid duplicates.");
        }
        if report.replaced > 0 {
            Output::info(&format!("Replaced {} previous records.", report.replaced));
        }
        Output::success(&format!(
            "Stored {} records in '{}' at {}",
            report.records,
            ingestor.collection(),
            settings.sqlite_path().display()
        ));
        Output::info("--- 3/3: Building the question-answering chain ---");
    }

    let model_name = model.unwrap_or_else(|| settings.rag.model.clone());
    let model = Arc::new(OpenAIChatModel::from_settings(&settings, &model_name)?);
    let context = ContextBuilder::new(ingestor.store(), ingestor.embedder(), ingestor.collection())
        .with_max_chunks(settings.rag.top_k)
        .with_min_score(settings.rag.min_score);
    let mut engine = RagEngine::new(model, context)
        .with_prompts(load_prompts(&settings)?)
        .with_temperature(settings.rag.temperature)
        .with_condense_question(settings.rag.condense_question)
        .with_history_policy(HistoryPolicy::from_max_turns(settings.rag.max_history_turns));
    Output::success("RAG chain is ready to use!");

    Output::banner("\n--- PDF Summarizer Agent Initialized (Type 'exit' to quit, 'clear' to reset) ---");
    let mut repl = Repl::stdin("Ask about the PDF: ").with_clear();
    docqa_loop(&mut repl, &mut engine).await
}

/// Answer questions with retrieval and conversation memory until the user exits.
pub async fn docqa_loop<R: BufRead, W: Write>(repl: &mut Repl<R, W>, engine: &mut RagEngine) -> Result<()> {
    loop {
        let question = match repl.read()? {
            Line::Exit => return Ok(()),
            Line::Clear => {
                engine.clear_history();
                repl.say("Conversation history cleared.")?;
                continue;
            }
            Line::Message(question) => question,
        };

        let spinner = Output::spinner("Thinking...");
        let outcome = engine.chat(&question).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(response) => repl.say(&format!("\nAgent Answer: {}\n", response.format_for_display()))?,
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::RecursiveSplitter;
    use crate::document::{DocumentKind, LoadedDocument};
    use crate::embedding::HashingEmbedder;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::ModelReply;
    use crate::vector_store::MemoryVectorStore;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_answers_with_sources_and_clear_resets_history() {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(HashingEmbedder::default());
        let ingestor = Ingestor::new(
            RecursiveSplitter::new(200, 20).unwrap(),
            embedder.clone(),
            store.clone(),
            "docs",
        );
        let document = LoadedDocument::from_pages(
            "/docs/handbook.pdf",
            DocumentKind::Pdf,
            vec![
                "Vacation policy: employees get twenty five days of paid leave.".to_string(),
                "Expense policy: receipts are required for every purchase.".to_string(),
            ],
        );
        ingestor.ingest_document(&document, false).await.unwrap();

        let model = Arc::new(ScriptedModel::new(vec![ModelReply::text("Twenty five days.")]));
        let context = ContextBuilder::new(store, embedder, "docs").with_max_chunks(3);
        let mut engine = RagEngine::new(model.clone(), context).with_condense_question(false);
        let mut repl = Repl::new(
            Cursor::new(b"How many vacation days do I get?\nclear\nexit\n".to_vec()),
            Vec::new(),
            "Ask about the PDF: ",
        )
        .with_clear();

        docqa_loop(&mut repl, &mut engine).await.unwrap();

        let output = String::from_utf8(repl.into_output()).unwrap();
        assert!(output.contains("Agent Answer: Twenty five days."));
        assert!(output.contains("handbook.pdf p.1"));
        assert!(output.contains("Conversation history cleared."));
        assert!(engine.history().is_empty());
        assert_eq!(model.call_count(), 1);
    }
}
