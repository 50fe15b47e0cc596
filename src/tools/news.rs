//! NewsAPI article search.

use crate::error::{ColloquyError, Result};
use serde::Deserialize;
use tracing::debug;

const EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";

/// Response of `/v2/everything`.
#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    pub status: String,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Article {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

pub(super) async fn fetch(
    client: &reqwest::Client,
    api_key: &str,
    query: &str,
    page_size: usize,
    articles: usize,
) -> Result<String> {
    let page_size = page_size.to_string();
    let response = client
        .get(EVERYTHING_URL)
        .header("X-Api-Key", api_key)
        .query(&[
            ("q", query),
            ("language", "en"),
            ("sortBy", "relevancy"),
            ("pageSize", page_size.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    let body: NewsResponse = response.json().await?;
    if !status.is_success() || body.status != "ok" {
        return Err(ColloquyError::ToolFailed(format!(
            "NewsAPI request failed ({}): {}",
            status,
            body.message.unwrap_or_else(|| "no message".to_string())
        )));
    }

    debug!("NewsAPI returned {} articles", body.articles.len());
    Ok(format_articles(&body, articles))
}

/// Format the first `limit` articles as Title/Description/Content blocks.
pub fn format_articles(response: &NewsResponse, limit: usize) -> String {
    if response.articles.is_empty() {
        return "No news articles found.".to_string();
    }

    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "None".to_string());
    response
        .articles
        .iter()
        .take(limit)
        .map(|a| {
            format!(
                "Title: {}\nDescription: {}\nContent: {}\n\n",
                field(&a.title),
                field(&a.description),
                field(&a.content)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "status": "ok",
        "totalResults": 4,
        "articles": [
            {"source": {"id": null, "name": "A"}, "title": "Rust 2.0?", "description": "Rumours.", "content": "Body one"},
            {"source": {"id": null, "name": "B"}, "title": "Async traits land", "description": null, "content": "Body two"},
            {"source": {"id": null, "name": "C"}, "title": "Cargo news", "description": "Faster builds.", "content": "Body three"},
            {"source": {"id": null, "name": "D"}, "title": "Ignored", "description": "Fourth.", "content": "Body four"}
        ]
    }"#;

    #[test]
    fn test_first_three_articles_are_formatted() {
        let response: NewsResponse = serde_json::from_str(FIXTURE).unwrap();
        let text = format_articles(&response, 3);

        assert!(text.starts_with("Title: Rust 2.0?\nDescription: Rumours.\nContent: Body one\n\n"));
        assert!(text.contains("Title: Async traits land\nDescription: None\n"));
        assert!(text.contains("Cargo news"));
        assert!(!text.contains("Ignored"));
    }

    #[test]
    fn test_error_body_parses() {
        let response: NewsResponse = serde_json::from_str(
            r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#,
        )
        .unwrap();
        assert_eq!(response.status, "error");
        assert!(response.articles.is_empty());
        assert_eq!(format_articles(&response, 3), "No news articles found.");
    }
}
