//! Content-fetch collaborators
//!
//! The expansion controller only knows the [`ContentFetcher`] contract. Two
//! implementations ship with the crate:
//! - [`LlmContentFetcher`]: asks an OpenAI-compatible model for a
//!   hierarchical breakdown of the query, with bounded retries
//! - [`MockContentFetcher`]: canned offline results

mod llm;
mod mock;

use async_trait::async_trait;

use crate::error::Result;
use crate::tree::TopicNode;

pub use llm::{LlmContentFetcher, RetryPolicy, extract_json, search_prompt, summary_prompt};
pub use mock::MockContentFetcher;

/// Turns a text query into a subtree of results
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch a hierarchical result for `query`.
    ///
    /// Any failure (network, quota, malformed payload) is reported as an
    /// error; retry policy is the implementation's business.
    async fn fetch(&self, query: &str) -> Result<TopicNode>;
}

/// Produces the short prose answer shown next to a search result
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, query: &str) -> Result<String>;
}
