//! Offline content fetcher with canned results

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};
use crate::tree::{Category, TopicNode};

use super::{ContentFetcher, Summarizer};

type Section = (&'static str, &'static str, &'static [&'static str]);

const PROFILE: &[Section] = &[
    (
        "Personal Information",
        "personal",
        &[
            "Age: 38 years (as of 2023)",
            "Birthplace: Chicago, Illinois",
            "Current Location: San Francisco Bay Area",
        ],
    ),
    (
        "Education",
        "education",
        &["Degree: Dropped out", "Institution: Stanford University"],
    ),
    (
        "Career",
        "career",
        &[
            "Current Position: CEO of OpenAI",
            "Previous Role: President of Y Combinator",
            "Co-founder of Loopt",
        ],
    ),
    (
        "Achievements",
        "achievements",
        &["Forbes 30 Under 30", "Time 100 Next 2019"],
    ),
    (
        "Contributions",
        "contributions",
        &[
            "Field: Artificial Intelligence",
            "Major Impact: Advancing AI research and development",
        ],
    ),
];

const OVERVIEW: &[Section] = &[
    (
        "Definition",
        "information",
        &["Basic concept", "Historical context"],
    ),
    ("Types", "classification", &["Type 1", "Type 2", "Type 3"]),
    (
        "Applications",
        "usage",
        &["In science", "In technology", "In everyday life"],
    ),
    (
        "Recent developments",
        "news",
        &["Latest research", "Future prospects"],
    ),
];

/// Deterministic fetcher for offline use and tests.
///
/// "who is <name>" queries get a biography-shaped tree, everything else a
/// generic overview. Leaves are left unexpanded so they can be explored
/// further.
#[derive(Debug, Clone, Default)]
pub struct MockContentFetcher {
    latency: Option<Duration>,
}

impl MockContentFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer, to make loading states observable
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Canned result for `query`
    pub fn results_for(query: &str) -> TopicNode {
        let query = query.trim();
        let lowered = query.to_lowercase();

        match lowered.strip_prefix("who is ") {
            Some(_) => {
                let name = if lowered == "who is sam altman" {
                    "Sam Altman"
                } else {
                    query["who is ".len()..].trim()
                };
                build(name, Category::Other("person".to_string()), PROFILE)
            }
            None => build(query, Category::Main, OVERVIEW),
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn build(name: &str, category: Category, sections: &[Section]) -> TopicNode {
    let children = sections
        .iter()
        .enumerate()
        .map(|(i, (title, tag, leaves))| {
            let section_id = format!("1.{}", i + 1);
            let leaves = leaves
                .iter()
                .enumerate()
                .map(|(j, leaf)| {
                    let Ok(category) = tag.parse::<Category>();
                    TopicNode::leaf(format!("{}.{}", section_id, j + 1), *leaf, category)
                })
                .collect();
            let Ok(category) = tag.parse::<Category>();
            TopicNode::branch(section_id, *title, category, leaves)
        })
        .collect();

    TopicNode::branch("1", name, category, children)
}

#[async_trait]
impl ContentFetcher for MockContentFetcher {
    async fn fetch(&self, query: &str) -> Result<TopicNode> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".to_string()));
        }
        self.simulate_latency().await;
        debug!(query, "Serving canned search result");
        Ok(Self::results_for(query))
    }
}

#[async_trait]
impl Summarizer for MockContentFetcher {
    async fn summarize(&self, query: &str) -> Result<String> {
        self.simulate_latency().await;
        Ok(format!(
            "\"{}\" is shown as an offline sample tree. Configure an LLM API key for real answers.",
            query.trim()
        ))
    }
}
