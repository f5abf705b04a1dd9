use crate::config::ScraperConfig;
use crate::core::{Document, Scraper};
use crate::utils::error::{RecipeError, Result};
use crate::utils::validation::required_string;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub const SPIDER_BASE_URL: &str = "https://api.spider.cloud";

/// Scraper backed by the Spider Cloud crawl API, returning markdown.
#[derive(Debug, Clone)]
pub struct SpiderScraper {
    api_key: String,
    base_url: String,
    params: HashMap<String, Value>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SpiderPage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    error: Option<String>,
}

impl SpiderScraper {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: SPIDER_BASE_URL.to_string(),
            params: HashMap::new(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        let api_key = required_string("scraper.api_key (SPIDER_API_KEY)", &config.api_key)?;
        let mut scraper = Self::new(api_key).with_params(config.params.clone());
        if let Some(base_url) = &config.base_url {
            scraper = scraper.with_base_url(base_url);
        }
        Ok(scraper)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_params(mut self, params: HashMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Request body: a single page, markdown output, user params on top.
    fn request_body(&self, url: &str) -> Value {
        let mut body = Map::new();
        body.insert("limit".to_string(), json!(1));
        body.insert("return_format".to_string(), json!("markdown"));
        for (key, value) in &self.params {
            body.insert(key.clone(), value.clone());
        }
        body.insert("url".to_string(), json!(url));
        Value::Object(body)
    }

    fn scrape_error(url: &str, message: String) -> RecipeError {
        RecipeError::ScrapeError {
            url: url.to_string(),
            message,
        }
    }
}

#[async_trait]
impl Scraper for SpiderScraper {
    async fn scrape(&self, url: &str) -> Result<Vec<Document>> {
        tracing::info!("Scraping {}", url);
        let endpoint = format!("{}/crawl", self.base_url);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(url))
            .send()
            .await
            .map_err(|e| Self::scrape_error(url, e.to_string()))?;

        let status = response.status();
        tracing::debug!("Spider response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| Self::scrape_error(url, e.to_string()))?;

        if !status.is_success() {
            return Err(Self::scrape_error(
                url,
                format!("scraper API returned {}: {}", status, body),
            ));
        }

        let pages: Vec<SpiderPage> = serde_json::from_str(&body)
            .map_err(|e| Self::scrape_error(url, format!("unexpected scraper response: {}", e)))?;

        let mut documents = Vec::with_capacity(pages.len());
        for page in pages {
            let content = page.content.unwrap_or_default();
            if content.trim().is_empty() {
                tracing::warn!(
                    "Skipping page {} without content (status {:?}, error {:?})",
                    page.url.as_deref().unwrap_or(url),
                    page.status,
                    page.error
                );
                continue;
            }

            let mut document =
                Document::new(content).with_metadata("original_url", json!(url));
            if let Some(page_url) = page.url {
                document = document.with_metadata("url", json!(page_url));
            }
            if let Some(page_status) = page.status {
                document = document.with_metadata("status", json!(page_status));
            }
            documents.push(document);
        }

        tracing::info!("Scraped {} documents from {}", documents.len(), url);
        Ok(documents)
    }
}
