//! Prompt templates for Colloquy.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub chat: ChatPrompts,
    pub research: ResearchPrompts,
    pub rag: RagPrompts,
    pub review: ReviewPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the tool-search chatbot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ChatPrompts {
    /// Optional system prompt. Empty means none is sent.
    pub system: String,
}

/// Prompts for the research agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchPrompts {
    pub system: String,
}

impl Default for ResearchPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a research assistant. Answer the user's question as well as you can.

You have access to these tools:
- 'wikipedia': look up encyclopedic background on a person, place, event, or concept
- 'search_web': real-time or general web search; the input should be a concise query string

Work step by step. Think about what you need to know, call a tool, read the observation,
and repeat until you have enough to answer. Do not guess facts you could look up.
When you know the final answer, reply with it directly and without calling a tool."#
                .to_string(),
        }
    }
}

/// Prompts for retrieval-augmented document chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// System prompt. `{{context}}` receives the retrieved chunks.
    pub system: String,
    /// Rewrites a follow-up into a standalone question.
    /// `{{history}}` and `{{question}}` are filled in.
    pub condense: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"Use the following pieces of context to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

{{context}}"#
                .to_string(),

            condense: r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{{history}}
Follow Up Input: {{question}}
Standalone question:"#
                .to_string(),
        }
    }
}

/// Prompts for the resume reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPrompts {
    pub system: String,
    /// `{{resume}}` receives the extracted document text.
    pub user: String,
}

impl Default for ReviewPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a Senior HR Analyst specializing in modern tech and finance roles.
Your goal is to meticulously review the provided resume.
Your entire response MUST be a single, raw JSON object with exactly these fields:
- "overall_score": integer from 1 to 10 (10 being best) based on the resume's strength
- "is_keyword_optimized": true if the resume uses strong keywords relevant to a modern tech job, false otherwise
- "summary_feedback": a concise, professional summary (3-4 sentences) of the resume's main strengths and weaknesses
- "top_recommendation": the single most important, actionable recommendation to improve the resume
DO NOT include any conversation, greetings, extra text, or markdown code fences (```json) in the final output."#
                .to_string(),

            user: r#"Critique the following resume text. Focus on technical roles and modern resume standards:

{{resume}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                prompts.chat = toml::from_str(&std::fs::read_to_string(&chat_path)?)?;
            }

            let research_path = custom_path.join("research.toml");
            if research_path.exists() {
                prompts.research = toml::from_str(&std::fs::read_to_string(&research_path)?)?;
            }

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                prompts.rag = toml::from_str(&std::fs::read_to_string(&rag_path)?)?;
            }

            let review_path = custom_path.join("review.toml");
            if review_path.exists() {
                prompts.review = toml::from_str(&std::fs::read_to_string(&review_path)?)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in one pass over the template, so text
    /// inside a value is never expanded. Unknown placeholders are left as is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid placeholder pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.chat.system.is_empty());
        assert!(prompts.rag.system.contains("{{context}}"));
        assert!(prompts.review.user.contains("{{resume}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_values_are_not_expanded() {
        let template = "History:\n{{history}}\nFollow up: {{question}}";
        let mut vars = HashMap::new();
        vars.insert(
            "history".to_string(),
            "Human: what does {{question}} mean in {{context}}?".to_string(),
        );
        vars.insert("question".to_string(), "and {{history}}?".to_string());

        let expected = "History:\nHuman: what does {{question}} mean in {{context}}?\nFollow up: and {{history}}?";
        for _ in 0..10 {
            assert_eq!(Prompts::render(template, &vars), expected);
        }
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let vars = HashMap::from([("name".to_string(), "Ada".to_string())]);
        assert_eq!(
            Prompts::render("{{name}} {{missing}} {{ spaced }}", &vars),
            "Ada {{missing}} {{ spaced }}"
        );
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("role".to_string(), "analyst".to_string());
        prompts.variables.insert("tone".to_string(), "formal".to_string());

        let mut vars = HashMap::new();
        vars.insert("role".to_string(), "recruiter".to_string());

        let rendered = prompts.render_with_custom("{{role}} / {{tone}}", &vars);
        assert_eq!(rendered, "recruiter / formal");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("review.toml"),
            "system = \"Be brief.\"\nuser = \"{{resume}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.review.system, "Be brief.");
        assert!(prompts.rag.system.contains("{{context}}"));
    }
}
