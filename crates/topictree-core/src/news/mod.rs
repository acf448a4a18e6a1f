//! Supplementary news lookup
//!
//! News is best-effort: a [`NewsSource`] never fails. Missing credentials,
//! network errors and empty result sets all come back as an empty list.

mod client;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use client::{NewsClient, NewsClientBuilder};

/// Message shown when a lookup produced no articles
pub const NO_NEWS_MESSAGE: &str = "No recent news found for this topic.";

/// Recent article summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
}

/// Source of recent articles for a query
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Most recent articles first; empty on any failure
    async fn recent(&self, query: &str) -> Vec<NewsArticle>;
}

/// Source that never has news
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNews;

#[async_trait]
impl NewsSource for NoNews {
    async fn recent(&self, _query: &str) -> Vec<NewsArticle> {
        Vec::new()
    }
}
