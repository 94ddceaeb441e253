//! Web search used to gather raw material for research.
//!
//! The [`WebSearch`] trait is the seam the research clients depend on;
//! [`TavilyClient`] is the production implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Default timeout for HTTP requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("search provider returned {status}: {body}")]
    Provider { status: u16, body: String },
}

/// How thoroughly the provider should search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    Advanced,
}

impl SearchDepth {
    /// Parse a config value, defaulting to advanced
    pub fn from_config(value: &str) -> Self {
        match value {
            "basic" => Self::Basic,
            _ => Self::Advanced,
        }
    }
}

/// A single search request.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: usize,
    pub depth: SearchDepth,
    /// Ask the provider for its own short answer alongside the hits
    pub include_answer: bool,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            depth: SearchDepth::Advanced,
            include_answer: true,
        }
    }

    pub fn without_answer(mut self) -> Self {
        self.include_answer = false;
        self
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
}

/// Web search capability.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Provenance label for results produced by this provider
    fn name(&self) -> &str;

    /// Run a query; zero hits is a successful, empty result
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError>;
}

/// Join hits into the "title: content" corpus handed to the summarizer
pub fn corpus(hits: &[SearchHit], separator: &str) -> String {
    hits.iter()
        .map(|hit| format!("{}: {}", hit.title, hit.content))
        .collect::<Vec<_>>()
        .join(separator)
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: SearchDepth,
    include_answer: bool,
    include_images: bool,
    include_raw_content: bool,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Tavily search API client.
pub struct TavilyClient {
    http: Client,
    api_key: String,
    depth: SearchDepth,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, depth: SearchDepth) -> Result<Self, SearchError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            depth,
        })
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    fn name(&self) -> &str {
        "Tavily"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError> {
        // The configured depth caps what callers ask for
        let depth = match (self.depth, query.depth) {
            (SearchDepth::Basic, _) => SearchDepth::Basic,
            (_, requested) => requested,
        };

        let body = TavilyRequest {
            api_key: &self.api_key,
            query: &query.query,
            search_depth: depth,
            include_answer: query.include_answer,
            include_images: false,
            include_raw_content: false,
            max_results: query.max_results,
        };

        let response = self.http.post(TAVILY_ENDPOINT).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TavilyResponse = response.json().await?;
        debug!(query = %query.query, hits = parsed.results.len(), "search completed");
        Ok(parsed.results)
    }
}
