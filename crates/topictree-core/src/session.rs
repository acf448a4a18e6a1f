//! One search from the user's point of view: tree, recent news and a brief summary

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::expansion::{Activation, ExpansionController, SearchOutcome};
use crate::news::{NewsArticle, NewsSource, NoNews};
use crate::search::{ContentFetcher, Summarizer};
use crate::tree::NodeId;

/// Everything produced by a top-level search
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub news: Vec<NewsArticle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Outcome of a question asked about a node
#[derive(Debug, Clone, Serialize)]
pub struct AskReport {
    pub activation: Activation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Couples the expansion controller with the supplementary collaborators
pub struct SearchSession {
    controller: ExpansionController,
    news: Arc<dyn NewsSource>,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl SearchSession {
    pub fn new(fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            controller: ExpansionController::new(fetcher),
            news: Arc::new(NoNews),
            summarizer: None,
        }
    }

    pub fn with_news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.news = news;
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn controller(&self) -> &ExpansionController {
        &self.controller
    }

    /// Search for `query`; news and the summary are fetched once the tree is in.
    ///
    /// Only the tree search can fail. A superseded search skips the
    /// supplementary lookups.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchReport> {
        let outcome = self.controller.search(query).await?;
        if !outcome.is_applied() {
            return Ok(SearchReport {
                outcome,
                news: Vec::new(),
                summary: None,
            });
        }

        let query = query.trim();
        let (news, summary) = tokio::join!(self.news.recent(query), self.summarize(query));
        info!(articles = news.len(), has_summary = summary.is_some(), "Search complete");

        Ok(SearchReport {
            outcome,
            news,
            summary,
        })
    }

    /// Ask `question` about node `id`, summarizing the question alongside.
    ///
    /// Only the ask itself can fail; a missing summary leaves `summary` empty.
    #[instrument(skip(self))]
    pub async fn ask(&self, id: &NodeId, question: &str) -> Result<AskReport> {
        let question = question.trim();
        let (activation, summary) = tokio::join!(
            self.controller.ask(id, question),
            self.summarize(question)
        );
        let activation = activation?;
        info!(node = %id, has_summary = summary.is_some(), "Ask complete");

        Ok(AskReport {
            activation,
            summary,
        })
    }

    /// Recent news only
    pub async fn news(&self, query: &str) -> Vec<NewsArticle> {
        self.news.recent(query.trim()).await
    }

    async fn summarize(&self, query: &str) -> Option<String> {
        if query.is_empty() {
            return None;
        }
        let summarizer = self.summarizer.as_ref()?;
        match summarizer.summarize(query).await {
            Ok(summary) if !summary.trim().is_empty() => Some(summary),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Could not produce a summary");
                None
            }
        }
    }
}
