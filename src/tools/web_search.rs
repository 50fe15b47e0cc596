//! DuckDuckGo web search over the HTML endpoint.

use crate::error::{ColloquyError, Result};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Search and format up to `max_results` hits.
pub(super) async fn search(client: &reqwest::Client, query: &str, max_results: usize) -> Result<String> {
    let html = client
        .get(SEARCH_URL)
        .query(&[("q", query)])
        .send()
        .await?
        .error_for_status()
        .map_err(|e| ColloquyError::ToolFailed(format!("DuckDuckGo search failed: {}", e)))?
        .text()
        .await?;

    let hits = parse_results(&html, max_results);
    debug!("DuckDuckGo returned {} results", hits.len());
    Ok(format_hits(&hits))
}

fn result_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)
            .expect("valid result link pattern")
    })
}

fn snippet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|td|div)>"#)
            .expect("valid snippet pattern")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"))
}

/// Extract results from a DuckDuckGo HTML page.
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let snippets: Vec<String> = snippet_re()
        .captures_iter(html)
        .map(|c| clean_text(&c[1]))
        .collect();

    result_link_re()
        .captures_iter(html)
        .enumerate()
        .map(|(i, c)| SearchHit {
            title: clean_text(&c[2]),
            link: resolve_link(&decode_entities(&c[1])),
            snippet: snippets.get(i).cloned().unwrap_or_default(),
        })
        .filter(|hit| !hit.title.is_empty())
        .take(max_results)
        .collect()
}

/// Format hits as numbered title / link / snippet blocks.
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {}\n   {}\n   {}", i + 1, hit.title, hit.link, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Unwrap DuckDuckGo's `/l/?uddg=` redirect links.
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    match url::Url::parse(&absolute) {
        Ok(parsed) => parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
            .unwrap_or(absolute),
        Err(_) => absolute,
    }
}

fn clean_text(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, "");
    decode_entities(stripped.trim())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
<div class="result results_links results_links_deep web-result ">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Ftokio.rs%2F&amp;rut=abc">Tokio - An asynchronous <b>Rust</b> runtime</a>
    </h2>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Ftokio.rs%2F">Tokio is an event-driven, non-blocking I/O platform for writing <b>asynchronous</b> applications.</a>
  </div>
</div>
<div class="result results_links results_links_deep web-result ">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="https://docs.rs/tokio">tokio - Rust &amp; docs</a>
    </h2>
    <a class="result__snippet" href="https://docs.rs/tokio">A runtime for writing reliable network applications.</a>
  </div>
</div>
"#;

    #[test]
    fn test_parse_results_fixture() {
        let hits = parse_results(FIXTURE, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Tokio - An asynchronous Rust runtime");
        assert_eq!(hits[0].link, "https://tokio.rs/");
        assert!(hits[0].snippet.starts_with("Tokio is an event-driven"));
        assert_eq!(hits[1].title, "tokio - Rust & docs");
        assert_eq!(hits[1].link, "https://docs.rs/tokio");
    }

    #[test]
    fn test_max_results_is_respected() {
        assert_eq!(parse_results(FIXTURE, 1).len(), 1);
    }

    #[test]
    fn test_format_hits() {
        let text = format_hits(&parse_results(FIXTURE, 5));
        assert!(text.starts_with("1. Tokio - An asynchronous Rust runtime\n   https://tokio.rs/\n"));
        assert!(text.contains("\n\n2. tokio - Rust & docs"));
        assert_eq!(format_hits(&[]), "No results found.");
    }
}
