//! Resume review: one structured model call validated against a strict schema.

use crate::config::Prompts;
use crate::conversation::{Transcript, Turn};
use crate::document;
use crate::error::{ColloquyError, Result};
use crate::llm::{ChatModel, CompletionOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A validated resume review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewOutput {
    /// Score from 1 to 10, 10 being best.
    pub overall_score: u8,
    /// Whether the resume uses strong keywords for a modern tech job.
    pub is_keyword_optimized: bool,
    /// Short summary of strengths and weaknesses.
    pub summary_feedback: String,
    /// The single most important improvement.
    pub top_recommendation: String,
}

impl ReviewOutput {
    /// Extract the JSON object from a model reply and validate it.
    pub fn parse(raw: &str) -> Result<Self> {
        let json = extract_json(raw)?;
        let review: ReviewOutput = serde_json::from_str(json).map_err(|e| ColloquyError::Validation {
            message: e.to_string(),
            raw: raw.to_string(),
        })?;

        if !(1..=10).contains(&review.overall_score) {
            return Err(ColloquyError::Validation {
                message: format!("overall_score must be between 1 and 10, got {}", review.overall_score),
                raw: raw.to_string(),
            });
        }
        Ok(review)
    }

    /// Human-readable report.
    pub fn format_report(&self) -> String {
        format!(
            "Final Score: {}/10\nKeyword Optimized: {}\n\nFeedback Summary: {}\n\nActionable Recommendation: {}",
            self.overall_score,
            if self.is_keyword_optimized { "Yes" } else { "No" },
            self.summary_feedback,
            self.top_recommendation
        )
    }
}

/// Isolate the JSON object in a model reply.
///
/// Takes everything from the first `{` to the last `}`, which drops markdown
/// fences and any chatter around the object.
pub fn extract_json(raw: &str) -> Result<&str> {
    let text = raw.trim();
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(ColloquyError::Validation {
            message: "no JSON object found in model output".to_string(),
            raw: raw.to_string(),
        }),
    }
}

/// Read a resume as plain text. PDF pages are joined with blank lines.
pub fn extract_text(path: &Path) -> Result<String> {
    let document = document::load(path)?;
    if document.is_blank() {
        return Err(ColloquyError::EmptyDocument(path.display().to_string()));
    }
    Ok(document.full_text())
}

/// First `max_chars` characters on one line, for progress messages.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

/// Sends a resume to the model and validates the reply.
pub struct Reviewer {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    temperature: f32,
}

impl Reviewer {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Prompts, temperature: f32) -> Self {
        Self {
            model,
            prompts,
            temperature,
        }
    }

    /// Review resume text with a single JSON-mode call.
    #[instrument(skip(self, resume_text), fields(chars = resume_text.len()))]
    pub async fn review(&self, resume_text: &str) -> Result<ReviewOutput> {
        let mut vars = HashMap::new();
        vars.insert("resume".to_string(), resume_text.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.review.user, &vars);

        let mut transcript = Transcript::with_system(&self.prompts.review.system);
        transcript.push(Turn::user(prompt));

        let options = CompletionOptions::default()
            .with_temperature(Some(self.temperature))
            .json_object();
        let reply = self.model.complete(&transcript, &options).await?;

        let raw = reply.content_or_default();
        debug!("Review reply: {} chars", raw.len());
        ReviewOutput::parse(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::ModelReply;

    const VALID: &str = r#"{"overall_score": 7, "is_keyword_optimized": true, "summary_feedback": "Solid.", "top_recommendation": "Quantify impact."}"#;

    fn validation_raw(err: ColloquyError) -> String {
        match err {
            ColloquyError::Validation { raw, .. } => raw,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_plain_json() {
        let review = ReviewOutput::parse(VALID).unwrap();
        assert_eq!(review.overall_score, 7);
        assert!(review.is_keyword_optimized);
    }

    #[test]
    fn test_parse_fenced_json_with_chatter() {
        let raw = format!("Here is the review:\n```json\n{}\n```\nHope that helps!", VALID);
        assert_eq!(ReviewOutput::parse(&raw).unwrap().top_recommendation, "Quantify impact.");
    }

    #[test]
    fn test_missing_field_is_rejected_with_raw() {
        let raw = r#"{"is_keyword_optimized": true, "summary_feedback": "x", "top_recommendation": "y"}"#;
        let err = ReviewOutput::parse(raw).unwrap_err();
        assert!(err.to_string().contains("overall_score"));
        assert_eq!(validation_raw(err), raw);
    }

    #[test]
    fn test_out_of_range_scores_are_rejected() {
        for score in ["0", "11"] {
            let raw = VALID.replace("7", score);
            assert!(matches!(ReviewOutput::parse(&raw), Err(ColloquyError::Validation { .. })));
        }
    }

    #[test]
    fn test_wrong_types_and_extra_fields_are_rejected() {
        let string_bool = VALID.replace("true", "\"true\"");
        assert!(ReviewOutput::parse(&string_bool).is_err());

        let string_score = VALID.replace("7", "\"7\"");
        assert!(ReviewOutput::parse(&string_score).is_err());

        let extra = VALID.replace("}", r#", "confidence": 0.9}"#);
        assert!(ReviewOutput::parse(&extra).is_err());
    }

    #[test]
    fn test_no_braces() {
        let err = extract_json("I cannot review this.").unwrap_err();
        assert_eq!(validation_raw(err), "I cannot review this.");
    }

    #[test]
    fn test_report_format() {
        let report = ReviewOutput::parse(VALID).unwrap().format_report();
        assert!(report.starts_with("Final Score: 7/10\nKeyword Optimized: Yes\n"));
        assert!(report.ends_with("Actionable Recommendation: Quantify impact."));
    }

    #[test]
    fn test_extract_text_rejects_empty_and_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "   \n").unwrap();
        assert!(matches!(extract_text(&empty), Err(ColloquyError::EmptyDocument(_))));

        let docx = dir.path().join("resume.docx");
        std::fs::write(&docx, "x").unwrap();
        assert!(matches!(extract_text(&docx), Err(ColloquyError::UnsupportedFile(_))));
    }

    #[test]
    fn test_preview_flattens_newlines() {
        assert_eq!(preview("Jane\nDoe\nEngineer", 8), "Jane Doe");
    }

    #[tokio::test]
    async fn test_review_uses_json_mode() {
        let model = Arc::new(ScriptedModel::new(vec![ModelReply::text(VALID)]));
        let reviewer = Reviewer::new(model.clone(), Prompts::default(), 0.2);

        let review = reviewer.review("Jane Doe, Rust engineer").await.unwrap();
        assert_eq!(review.overall_score, 7);

        let (transcript, options) = &model.requests()[0];
        assert!(options.json_object);
        assert_eq!(options.temperature, Some(0.2));
        assert!(options.tools.is_empty());
        let user = transcript.turns()[1].text().unwrap();
        assert!(user.starts_with("Critique the following resume text."));
        assert!(user.ends_with("Jane Doe, Rust engineer"));
    }
}
