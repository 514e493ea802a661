use crate::adapters::{build_http_client, truncate_body};
use crate::config::{TavilyConfig, TAVILY_API_KEY_ENV};
use crate::domain::model::{GarmentKind, SearchHit};
use crate::domain::ports::GarmentSearch;
use crate::utils::error::{Result, StylistError};
use crate::utils::validation::require_api_key;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::Mutex;

const PROVIDER: &str = "Tavily";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: String,
    search_depth: &'a str,
    max_results: usize,
    include_images: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    images: Vec<ImageResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Tavily returns bare URLs, or objects when image descriptions are requested.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageResult {
    Url(String),
    Described { url: String },
}

impl ImageResult {
    fn into_url(self) -> String {
        match self {
            Self::Url(url) | Self::Described { url } => url,
        }
    }
}

/// Garment search backed by the Tavily web search API, with an in-memory
/// cache keyed by kind, keywords and result count.
pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
    search_depth: String,
    max_results: usize,
    include_images: bool,
    query_suffix: String,
    cache: Mutex<HashMap<String, Vec<SearchHit>>>,
}

impl TavilyClient {
    pub fn new(config: &TavilyConfig) -> Result<Self> {
        let api_key = require_api_key(TAVILY_API_KEY_ENV, &config.api_key)?.to_string();
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_depth: config.search_depth.clone(),
            max_results: config.max_results,
            include_images: config.include_images,
            query_suffix: config.query_suffix.clone(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        tracing::info!("Search cache cleared");
    }

    fn build_query(&self, keywords: &str) -> String {
        let keywords = keywords.trim();
        if self.query_suffix.is_empty() {
            keywords.to_string()
        } else {
            format!("{} {}", keywords, self.query_suffix)
        }
    }

    async fn request(&self, keywords: &str, num_results: usize) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            query: self.build_query(keywords),
            search_depth: &self.search_depth,
            max_results: num_results,
            include_images: self.include_images,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StylistError::provider(
                PROVIDER,
                format!("HTTP {}: {}", status, truncate_body(&body)),
            ));
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(hits_from_response(parsed))
    }
}

fn hits_from_response(response: SearchResponse) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = response
        .results
        .into_iter()
        .map(|result| SearchHit {
            price: extract_price(&result.content),
            title: result.title,
            url: result.url,
            snippet: result.content,
            image_url: None,
        })
        .collect();

    // Image results are not linked to pages; pair them up by position.
    for (i, image) in response.images.into_iter().enumerate() {
        let url = image.into_url();
        if let Some(hit) = hits.get_mut(i) {
            hit.image_url = Some(url);
        } else {
            hits.push(SearchHit {
                title: format!("Fashion Item {}", i + 1),
                image_url: Some(url),
                ..SearchHit::default()
            });
        }
    }

    hits
}

fn price_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\$\d+(?:\.\d{2})?",
            r"(?i)USD\s*\d+(?:\.\d{2})?",
            r"(?i)\d+(?:\.\d{2})?\s*(?:USD|dollars?)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid price pattern"))
        .collect()
    })
}

/// First price-looking fragment in a snippet, e.g. `$29.99` or `45 USD`.
pub fn extract_price(text: &str) -> Option<String> {
    price_patterns()
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().to_string())
}

#[async_trait]
impl GarmentSearch for TavilyClient {
    async fn search(&self, kind: GarmentKind, keywords: &str, num_results: usize) -> Vec<SearchHit> {
        // `max_results` caps whatever the caller asks for.
        let num_results = num_results.min(self.max_results);
        let cache_key = format!("{}:{}:{}", kind, keywords, num_results);
        if let Some(cached) = self.cache.lock().await.get(&cache_key) {
            tracing::info!("Returning cached results for: {}", keywords);
            return cached.clone();
        }

        match self.request(keywords, num_results).await {
            Ok(hits) => {
                tracing::info!("Found {} {} results for: {}", hits.len(), kind, keywords);
                self.cache.lock().await.insert(cache_key, hits.clone());
                hits
            }
            Err(e) => {
                tracing::error!("Error searching for garments: {}", e);
                Vec::new()
            }
        }
    }
}
