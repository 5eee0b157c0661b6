//! General web search tool used by the resolver agent.
//!
//! Queries a DuckDuckGo-style HTML endpoint (no API key required) and returns
//! a numbered list of titles, URLs and snippets.

use super::tools::{Tool, ToolContext};
use crate::config::SearchSettings;
use crate::error::{BirdingError, Result};
use crate::llm::ToolDefinition;
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One parsed search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search backed by an HTML results page.
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(settings: &SearchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            max_results: settings.max_results,
        })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<String> {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("q", query)
            .finish();
        let url = format!("{}?{}", self.endpoint, encoded);

        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let results = parse_results(&html, limit)?;
        Ok(format_results(query, &results))
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "web_search".to_string(),
            description: "Search the web. Use this to find coordinates of places, capital cities, \
                and common or scientific names of bird species."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, arguments: Value, _ctx: &ToolContext) -> Result<String> {
        let query = arguments["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| BirdingError::InvalidInput("Missing 'query' argument".to_string()))?;
        let limit = arguments["limit"]
            .as_u64()
            .map(|l| (l as usize).min(self.max_results))
            .unwrap_or(self.max_results);

        info!("web search: '{}' limit={}", query, limit);
        self.search(query, limit).await
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| BirdingError::Agent(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Parse result entries out of a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let result_sel = selector(".result")?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;
    let url_sel = selector(".result__url")?;
    let whitespace = Regex::new(r"\s+").map_err(|e| BirdingError::Agent(e.to_string()))?;

    let text_of = |el: Option<scraper::ElementRef<'_>>| {
        el.map(|e| whitespace.replace_all(&e.text().collect::<String>(), " ").trim().to_string())
            .unwrap_or_default()
    };

    let mut results = Vec::new();
    for element in document.select(&result_sel) {
        if results.len() >= limit {
            break;
        }
        let title = text_of(element.select(&title_sel).next());
        if title.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title,
            url: text_of(element.select(&url_sel).next()),
            snippet: text_of(element.select(&snippet_sel).next()),
        });
    }

    Ok(results)
}

/// Render search results for the model.
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No search results found for '{}'.", query);
    }

    let formatted = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. **{}**\n   {}\n   {}", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("Search results for '{}':\n\n{}", query, formatted)
}
