//! Web search tool
//!
//! Research facts via the Tavily search API. The worker only sees the
//! formatted text, so any backend implementing [`SearchBackend`] can stand in.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::config::SearchConfig;
use crate::core::{ChartError, Result};

/// Tool name exposed to the research model
pub const SEARCH_TOOL: &str = "tavily_search";

/// Raw page content is long; cap what reaches the model per result
const RAW_CONTENT_LIMIT: usize = 2000;

/// Free-text query in, ranked textual results out
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a query and format the results as text
    async fn search(&self, query: &str) -> Result<String>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Tavily search client
pub struct TavilySearch {
    client: Client,
    config: SearchConfig,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
    include_images: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchHit>,
    #[serde(default)]
    images: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    raw_content: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

impl TavilySearch {
    /// Create a search client from configuration
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl SearchBackend for TavilySearch {
    async fn search(&self, query: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ChartError::search("TAVILY_API_KEY is not set"))?;

        let request = SearchRequest {
            api_key,
            query,
            max_results: self.config.max_results,
            search_depth: &self.config.search_depth,
            include_answer: self.config.include_answer,
            include_raw_content: self.config.include_raw_content,
            include_images: self.config.include_images,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChartError::search(format!(
                "Tavily API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ChartError::search(format!("Failed to parse search response: {}", e)))?;

        Ok(format_results(query, &parsed))
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

fn format_results(query: &str, response: &SearchResponse) -> String {
    if response.results.is_empty() && response.answer.is_none() {
        return format!("No results found for: {}", query);
    }

    let mut out = String::new();
    if let Some(ref answer) = response.answer {
        out.push_str(&format!("Answer: {}\n\n", answer));
    }

    for (i, hit) in response.results.iter().enumerate() {
        out.push_str(&format!("{}. **{}**\nURL: {}\n", i + 1, hit.title, hit.url));
        if let Some(score) = hit.score {
            out.push_str(&format!("Score: {:.2}\n", score));
        }
        out.push_str(&hit.content);
        out.push('\n');
        if let Some(ref raw) = hit.raw_content {
            let excerpt: String = raw.chars().take(RAW_CONTENT_LIMIT).collect();
            out.push_str(&format!("Page excerpt: {}\n", excerpt));
        }
        out.push('\n');
    }

    let image_urls: Vec<&str> = response
        .images
        .iter()
        .filter_map(|img| img.as_str().or_else(|| img.get("url").and_then(|u| u.as_str())))
        .collect();
    if !image_urls.is_empty() {
        out.push_str(&format!("Images: {}\n", image_urls.join(", ")));
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let config = SearchConfig::default();
        let request = SearchRequest {
            api_key: "tvly-test",
            query: "top edm songs",
            max_results: config.max_results,
            search_depth: &config.search_depth,
            include_answer: config.include_answer,
            include_raw_content: config.include_raw_content,
            include_images: config.include_images,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["max_results"], 5);
        assert_eq!(body["search_depth"], "advanced");
        assert_eq!(body["include_images"], true);
    }

    #[test]
    fn test_format_results() {
        let response: SearchResponse = serde_json::from_str(
            r#"{
                "answer": "Titanium has about 1.5B streams.",
                "results": [
                    {"title": "Most streamed EDM", "url": "https://example.com/a", "content": "Levels 380M", "score": 0.91}
                ],
                "images": ["https://example.com/img.png"]
            }"#,
        )
        .unwrap();
        let text = format_results("edm", &response);
        assert!(text.starts_with("Answer: Titanium"));
        assert!(text.contains("1. **Most streamed EDM**"));
        assert!(text.contains("Score: 0.91"));
        assert!(text.contains("Images: https://example.com/img.png"));
    }

    #[test]
    fn test_format_empty_results() {
        let response: SearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(format_results("nothing", &response), "No results found for: nothing");
    }

    #[tokio::test]
    async fn test_missing_key_is_search_error() {
        let mut config = SearchConfig::default();
        config.api_key = None;
        let search = TavilySearch::from_config(&config).unwrap();
        let err = search.search("anything").await.unwrap_err();
        assert!(matches!(err, ChartError::Search(_)));
    }
}
