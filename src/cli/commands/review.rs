//! Resume reviewer command.

use super::{load_prompts, require};
use crate::cli::preflight::Operation;
use crate::cli::{Line, Output, Repl};
use crate::config::Settings;
use crate::document::DocumentKind;
use crate::error::ColloquyError;
use crate::llm::OpenAIChatModel;
use crate::review::{self, Reviewer};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

const RULE: &str = "----------------------------";

/// Run the resume reviewer loop.
pub async fn run_review(model: Option<String>, settings: Settings) -> Result<()> {
    require(Operation::Review, &settings)?;

    let model_name = model.unwrap_or_else(|| settings.review.model.clone());
    let model = Arc::new(OpenAIChatModel::from_settings(&settings, &model_name)?);
    let reviewer = Reviewer::new(model, load_prompts(&settings)?, settings.review.temperature);

    Output::banner("--- HR Resume Reviewer Agent Initialized ---");
    println!("Enter the file path of the resume (e.g., resume.txt or resume.pdf).");
    println!("Type 'exit' or 'quit' to close the program.");

    let mut repl = Repl::stdin("\nFile Path: ");
    review_loop(&mut repl, &reviewer).await
}

/// Review one file per line until the user exits.
pub async fn review_loop<R: BufRead, W: Write>(repl: &mut Repl<R, W>, reviewer: &Reviewer) -> Result<()> {
    loop {
        let input = match repl.read()? {
            Line::Exit => return Ok(()),
            Line::Clear => continue,
            Line::Message(input) => input,
        };
        let path = Path::new(&input);

        let kind = match DocumentKind::from_path(path) {
            Ok(kind) => kind,
            Err(e) => {
                repl.say(&input_error_message(&input, &e))?;
                continue;
            }
        };
        if kind == DocumentKind::Pdf {
            repl.say(&format!("Loading and extracting text from PDF: {}", path.display()))?;
        }
        let text = match review::extract_text(path) {
            Ok(text) => text,
            Err(e) => {
                repl.say(&input_error_message(&input, &e))?;
                continue;
            }
        };

        repl.say(&format!(
            "Processing content (First 50 chars: {}...)",
            review::preview(&text, 50)
        ))?;

        let spinner = Output::spinner("Reviewing...");
        let outcome = reviewer.review(&text).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(review) => {
                repl.say("\n--- VALIDATED HR REVIEW ---")?;
                repl.say(RULE)?;
                repl.say(&review.format_report())?;
                repl.say(RULE)?;
            }
            Err(ColloquyError::Validation { message, raw }) => {
                repl.say("\n[ERROR] Model failed to generate perfect JSON.")?;
                repl.say(&format!("Details: {}", message))?;
                repl.say(&format!("\nRaw Content: \n{}", raw))?;
            }
            Err(e) => repl.say(&format!("\nAn unexpected API error occurred: {}", e))?,
        }
    }
}

fn input_error_message(input: &str, error: &ColloquyError) -> String {
    match error {
        ColloquyError::UnsupportedFile(_) => {
            "ERROR: Unsupported file type. Please provide a .pdf, .txt, or .md file.".to_string()
        }
        ColloquyError::FileNotFound(_) => format!(
            "ERROR: File not found at '{}'. Please check the path and try again.",
            input
        ),
        ColloquyError::EmptyDocument(_) => {
            "ERROR: The file is empty or no text could be extracted.".to_string()
        }
        other => format!("An error occurred while reading the file: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::ModelReply;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_review_report_and_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let resume = dir.path().join("resume.md");
        std::fs::write(&resume, "# Jane Doe\nSenior Rust engineer, Kubernetes, AWS.").unwrap();
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "\n").unwrap();
        let missing = dir.path().join("missing.txt");

        let model = Arc::new(ScriptedModel::new(vec![ModelReply::text(
            r#"{"overall_score": 8, "is_keyword_optimized": false, "summary_feedback": "Clear layout.", "top_recommendation": "Add metrics."}"#,
        )]));
        let reviewer = Reviewer::new(model.clone(), Prompts::default(), 0.2);
        let input = format!(
            "resume.docx\n{}\n{}\n{}\nquit\n",
            missing.display(),
            empty.display(),
            resume.display()
        );
        let mut repl = Repl::new(Cursor::new(input.into_bytes()), Vec::new(), "File Path: ");

        review_loop(&mut repl, &reviewer).await.unwrap();

        let output = String::from_utf8(repl.into_output()).unwrap();
        assert!(output.contains("ERROR: Unsupported file type."));
        assert!(output.contains(&format!("ERROR: File not found at '{}'", missing.display())));
        assert!(output.contains("ERROR: The file is empty or no text could be extracted."));
        assert!(output.contains("Processing content (First 50 chars: # Jane Doe Senior Rust engineer"));
        assert!(output.contains("--- VALIDATED HR REVIEW ---"));
        assert!(output.contains("Final Score: 8/10\nKeyword Optimized: No"));
        assert!(output.contains("Actionable Recommendation: Add metrics."));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_prints_details_and_raw_content() {
        let dir = tempfile::tempdir().unwrap();
        let resume = dir.path().join("resume.txt");
        std::fs::write(&resume, "John Smith, developer").unwrap();

        let raw = r#"{"overall_score": 11, "is_keyword_optimized": true, "summary_feedback": "x", "top_recommendation": "y"}"#;
        let model = Arc::new(ScriptedModel::new(vec![ModelReply::text(raw)]));
        let reviewer = Reviewer::new(model, Prompts::default(), 0.2);
        let input = format!("{}\nexit\n", resume.display());
        let mut repl = Repl::new(Cursor::new(input.into_bytes()), Vec::new(), "File Path: ");

        review_loop(&mut repl, &reviewer).await.unwrap();

        let output = String::from_utf8(repl.into_output()).unwrap();
        assert!(output.contains("[ERROR] Model failed to generate perfect JSON."));
        assert!(output.contains("Details: overall_score must be between 1 and 10, got 11"));
        assert!(output.contains(&format!("Raw Content: \n{}", raw)));
    }
}
