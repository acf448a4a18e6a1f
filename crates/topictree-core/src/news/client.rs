//! NewsAPI client

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::NewsConfig;
use crate::error::{Error, Result};

use super::{NewsArticle, NewsSource};

/// Client for the NewsAPI `everything` endpoint
#[derive(Clone)]
pub struct NewsClient {
    http_client: HttpClient,
    config: NewsConfig,
    api_key: Option<String>,
}

impl std::fmt::Debug for NewsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsClient")
            .field("base_url", &self.config.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

/// Builder for a [`NewsClient`]
#[derive(Default)]
pub struct NewsClientBuilder {
    config: Option<NewsConfig>,
    api_key: Option<String>,
}

impl NewsClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: NewsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Blank keys are treated as missing
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn build(self) -> Result<NewsClient> {
        let config = self.config.unwrap_or_default();
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::NetworkError)?;

        Ok(NewsClient {
            http_client,
            api_key: self.api_key.filter(|key| !key.trim().is_empty()),
            config,
        })
    }
}

impl NewsClient {
    pub fn builder() -> NewsClientBuilder {
        NewsClientBuilder::new()
    }

    /// Client using the key from the environment, if any
    pub fn from_config(config: &NewsConfig) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        let mut builder = NewsClientBuilder::new().config(config.clone());
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        builder.build()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, api_key: &str, query: &str) -> Result<Vec<NewsArticle>> {
        let page_size = self.config.page_size.to_string();
        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&[
                ("q", query),
                ("apiKey", api_key),
                ("language", self.config.language.as_str()),
                ("sortBy", self.config.sort_by.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::FetchFailed(format!(
                "news API returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let payload: WireResponse = response
            .json()
            .await
            .map_err(|e| Error::ParseFailure(e.to_string()))?;

        Ok(payload
            .articles
            .into_iter()
            .filter_map(WireArticle::into_article)
            .collect())
    }
}

#[async_trait]
impl NewsSource for NewsClient {
    async fn recent(&self, query: &str) -> Vec<NewsArticle> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("No news API key found, skipping news fetch");
            return Vec::new();
        };

        match self.search(api_key, query).await {
            Ok(articles) => {
                debug!(query, count = articles.len(), "Fetched news");
                articles
            }
            Err(e) => {
                warn!(query, error = %e, "Error fetching news");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    articles: Vec<WireArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    source: WireSource,
}

#[derive(Debug, Default, Deserialize)]
struct WireSource {
    name: Option<String>,
}

impl WireArticle {
    /// Articles without a title, link or date are dropped
    fn into_article(self) -> Option<NewsArticle> {
        Some(NewsArticle {
            title: self.title?,
            description: self.description.filter(|d| !d.trim().is_empty()),
            url: self.url?,
            published_at: self.published_at?,
            source_name: self.source.name.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> NewsConfig {
        NewsConfig {
            base_url: base_url.to_string(),
            timeout_secs: 2,
            ..NewsConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_key_yields_empty() {
        let client = NewsClient::builder()
            .config(config("http://127.0.0.1:9/v2/everything"))
            .api_key("   ")
            .build()
            .unwrap();

        assert!(!client.has_api_key());
        assert!(client.recent("volcanoes").await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_empty() {
        let client = NewsClient::builder()
            .config(config("http://127.0.0.1:9/v2/everything"))
            .api_key("test-key")
            .build()
            .unwrap();

        assert!(client.has_api_key());
        assert!(client.recent("volcanoes").await.is_empty());
    }

    #[test]
    fn test_wire_format() {
        let body = r#"{
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": null, "name": "Science Daily"},
                    "author": "A. Writer",
                    "title": "New vent discovered",
                    "description": "Researchers found...",
                    "url": "https://example.com/vent",
                    "publishedAt": "2024-05-01T10:00:00Z"
                },
                {
                    "source": {"id": null, "name": "Removed"},
                    "title": "[Removed]",
                    "url": null,
                    "publishedAt": "2024-05-01T09:00:00Z"
                }
            ]
        }"#;

        let payload: WireResponse = serde_json::from_str(body).unwrap();
        let articles: Vec<NewsArticle> = payload
            .articles
            .into_iter()
            .filter_map(WireArticle::into_article)
            .collect();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "New vent discovered");
        assert_eq!(articles[0].source_name, "Science Daily");
        assert_eq!(
            articles[0].description.as_deref(),
            Some("Researchers found...")
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let client = NewsClient::builder().api_key("secret-123").build().unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-123"));
        assert!(debug.contains("has_api_key: true"));
    }
}
