//! Wikipedia lookup via the MediaWiki action API.

use crate::error::{ColloquyError, Result};
use serde::Deserialize;

const API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Reply when the search finds nothing.
pub const NO_RESULT: &str = "No good Wikipedia Search Result was found";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    query: Option<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    index: u32,
    #[serde(default)]
    extract: String,
}

pub(super) async fn lookup(client: &reqwest::Client, query: &str, max_chars: usize) -> Result<String> {
    let body = client
        .get(API_URL)
        .query(&[
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("generator", "search"),
            ("gsrsearch", query),
            ("gsrlimit", "1"),
            ("prop", "extracts"),
            ("exintro", "1"),
            ("explaintext", "1"),
            ("redirects", "1"),
        ])
        .send()
        .await?
        .error_for_status()
        .map_err(|e| ColloquyError::ToolFailed(format!("Wikipedia lookup failed: {}", e)))?
        .text()
        .await?;

    format_summary(&body, max_chars)
}

/// Format the top page of an API response as `Page: ...\nSummary: ...`,
/// truncated to `max_chars` characters.
pub fn format_summary(body: &str, max_chars: usize) -> Result<String> {
    let response: ApiResponse = serde_json::from_str(body)?;

    let page = response
        .query
        .and_then(|q| q.pages.into_iter().min_by_key(|p| p.index));

    Ok(match page {
        Some(page) => {
            let text = format!("Page: {}\nSummary: {}", page.title, page.extract.trim());
            text.chars().take(max_chars).collect()
        }
        None => NO_RESULT.to_string(),
    })
}
