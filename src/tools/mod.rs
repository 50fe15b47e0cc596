//! Tools the model can call: web search, news search and Wikipedia lookup.

mod news;
mod web_search;
mod wikipedia;

pub use news::{format_articles, NewsResponse};
pub use web_search::{format_hits, parse_results, SearchHit};
pub use wikipedia::format_summary;

use crate::config::{Settings, ToolSettings};
use crate::error::{ColloquyError, Result};
use crate::llm::ToolSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

/// Registered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    SearchWeb,
    FetchNews,
    Wikipedia,
}

impl Tool {
    /// Tools offered by the chat flow.
    pub const CHAT: [Tool; 2] = [Tool::SearchWeb, Tool::FetchNews];
    /// Tools offered to the research agent.
    pub const RESEARCH: [Tool; 2] = [Tool::Wikipedia, Tool::SearchWeb];

    /// Name the model uses to call the tool.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::SearchWeb => "search_web",
            Tool::FetchNews => "fetch_news",
            Tool::Wikipedia => "wikipedia",
        }
    }

    /// Look a tool up by name. Case-insensitive; `duckduckgo_search` is an alias.
    pub fn from_name(name: &str) -> Option<Tool> {
        match name.trim().to_lowercase().as_str() {
            "search_web" | "duckduckgo_search" => Some(Tool::SearchWeb),
            "fetch_news" => Some(Tool::FetchNews),
            "wikipedia" => Some(Tool::Wikipedia),
            _ => None,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Tool::SearchWeb => {
                "Searches the web for the given query using DuckDuckGo. Useful for questions \
                 requiring real-time or general web search."
            }
            Tool::FetchNews => {
                "Fetches the latest news articles for a given topic and returns their content."
            }
            Tool::Wikipedia => {
                "Looks up Wikipedia. Useful for general questions about people, places, \
                 companies, facts, historical events, or other subjects."
            }
        }
    }

    fn query_description(&self) -> &'static str {
        match self {
            Tool::SearchWeb => "The search query to use.",
            Tool::FetchNews => "The news topic to fetch articles for.",
            Tool::Wikipedia => "A concise search query.",
        }
    }

    /// Definition advertised to the model.
    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": self.query_description()
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Definitions for a set of tools.
pub fn tool_specs(tools: &[Tool]) -> Vec<ToolSpec> {
    tools.iter().map(Tool::spec).collect()
}

/// A parsed, typed tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    SearchWeb { query: String },
    FetchNews { query: String },
    Wikipedia { query: String },
}

impl ToolCall {
    pub fn tool(&self) -> Tool {
        match self {
            ToolCall::SearchWeb { .. } => Tool::SearchWeb,
            ToolCall::FetchNews { .. } => Tool::FetchNews,
            ToolCall::Wikipedia { .. } => Tool::Wikipedia,
        }
    }

    pub fn query(&self) -> &str {
        match self {
            ToolCall::SearchWeb { query }
            | ToolCall::FetchNews { query }
            | ToolCall::Wikipedia { query } => query,
        }
    }
}

#[derive(Deserialize)]
struct QueryArgs {
    query: String,
}

/// Parse a tool call as returned by the model.
///
/// An unregistered name is [`ColloquyError::UnknownTool`]; malformed
/// arguments are [`ColloquyError::Agent`].
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let tool = Tool::from_name(name).ok_or_else(|| ColloquyError::UnknownTool(name.to_string()))?;

    // Some models send a bare string instead of an arguments object.
    let query = match serde_json::from_str::<QueryArgs>(arguments) {
        Ok(args) => args.query,
        Err(e) => match serde_json::from_str::<String>(arguments) {
            Ok(query) => query,
            Err(_) => {
                return Err(ColloquyError::Agent(format!(
                    "Invalid arguments for {}: {}",
                    tool, e
                )))
            }
        },
    };

    if query.trim().is_empty() {
        return Err(ColloquyError::Agent(format!("Empty 'query' argument for {}", tool)));
    }

    Ok(match tool {
        Tool::SearchWeb => ToolCall::SearchWeb { query },
        Tool::FetchNews => ToolCall::FetchNews { query },
        Tool::Wikipedia => ToolCall::Wikipedia { query },
    })
}

/// Anything that can run a parsed tool call.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall) -> Result<String>;
}

/// Executes tool calls against the real services.
pub struct Toolbox {
    client: reqwest::Client,
    settings: ToolSettings,
    news_api_key: Option<String>,
}

impl Toolbox {
    pub fn new(settings: ToolSettings, news_api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ColloquyError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings,
            news_api_key,
        })
    }

    /// Build from settings. A missing news key only fails `fetch_news` calls.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.tools.clone(),
            settings.news_api_key().ok(),
            Duration::from_secs(settings.llm.timeout_secs),
        )
    }
}

#[async_trait]
impl ToolExecutor for Toolbox {
    #[instrument(skip(self), fields(tool = %call.tool()))]
    async fn execute(&self, call: &ToolCall) -> Result<String> {
        info!("Running {} for '{}'", call.tool(), call.query());
        match call {
            ToolCall::SearchWeb { query } => {
                web_search::search(&self.client, query, self.settings.search_results).await
            }
            ToolCall::FetchNews { query } => {
                let api_key = self.news_api_key.as_deref().ok_or_else(|| {
                    ColloquyError::ToolFailed(format!(
                        "{} is not set; fetch_news needs a NewsAPI key",
                        self.settings.news_api_key_env
                    ))
                })?;
                news::fetch(
                    &self.client,
                    api_key,
                    query,
                    self.settings.news_page_size,
                    self.settings.news_articles,
                )
                .await
            }
            ToolCall::Wikipedia { query } => {
                wikipedia::lookup(&self.client, query, self.settings.wikipedia_max_chars).await
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_tool() {
        let call = parse_tool_call("search_web", r#"{"query": "rust async"}"#).unwrap();
        assert_eq!(call, ToolCall::SearchWeb { query: "rust async".to_string() });
        assert_eq!(call.tool().name(), "search_web");
    }

    #[test]
    fn test_parse_alias_and_bare_string() {
        let call = parse_tool_call("DuckDuckGo_Search", r#""tokio runtime""#).unwrap();
        assert_eq!(call, ToolCall::SearchWeb { query: "tokio runtime".to_string() });
    }

    #[test]
    fn test_unknown_tool_is_explicit() {
        let err = parse_tool_call("get_weather", r#"{"query": "Oslo"}"#).unwrap_err();
        assert!(matches!(err, ColloquyError::UnknownTool(ref name) if name == "get_weather"));
    }

    #[test]
    fn test_malformed_arguments() {
        assert!(matches!(
            parse_tool_call("fetch_news", "{not json"),
            Err(ColloquyError::Agent(_))
        ));
        assert!(matches!(
            parse_tool_call("wikipedia", r#"{"query": "  "}"#),
            Err(ColloquyError::Agent(_))
        ));
    }

    #[test]
    fn test_specs_require_query() {
        let specs = tool_specs(&Tool::CHAT);
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "search_web");
        assert_eq!(specs[1].name, "fetch_news");
        assert_eq!(specs[1].parameters["required"][0], "query");
    }

    #[tokio::test]
    async fn test_missing_news_key_fails_the_call() {
        let toolbox = Toolbox::new(ToolSettings::default(), None, Duration::from_secs(5)).unwrap();
        let err = toolbox
            .execute(&ToolCall::FetchNews { query: "rust".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, ColloquyError::ToolFailed(_)));
    }
}
