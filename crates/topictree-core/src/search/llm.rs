//! LLM-backed content fetcher

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::llm::{LlmClient, Message};
use crate::tree::TopicNode;

use super::{ContentFetcher, Summarizer};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides search results in a hierarchical format.";

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one; never less than 1
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// the attempts are used up
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(what, attempt, "Sending request");

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => {
                    error!(what, attempt, error = %e, "Request failed, not retrying");
                    return Err(e);
                }
                Err(e) if attempt < max_attempts => {
                    // honour the server's requested wait when it is longer
                    let wait = match &e {
                        Error::RateLimited(secs) => self.delay.max(Duration::from_secs(*secs)),
                        _ => self.delay,
                    };
                    warn!(
                        what,
                        attempt,
                        retry_in_ms = wait.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    error!(what, attempts = attempt, error = %e, "Request failed after retries");
                    return Err(e);
                }
            }
        }
    }
}

/// Content fetcher that asks a chat model for a hierarchical breakdown
#[derive(Debug, Clone)]
pub struct LlmContentFetcher {
    client: LlmClient,
    retry: RetryPolicy,
}

impl LlmContentFetcher {
    pub fn new(client: LlmClient) -> Self {
        let retry = RetryPolicy::from_config(client.config());
        Self { client, retry }
    }

    /// Build the client from configuration and the environment-provided key
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .map_err(|e| Error::ConfigError(e.to_string()))?
            .ok_or_else(|| {
                Error::ConfigError(
                    "No LLM API key found. Set TOPICTREE_API_KEY or OPENAI_API_KEY.".to_string(),
                )
            })?;

        Ok(Self::new(LlmClient::new(config.clone(), api_key)?))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn fetch_once(&self, query: &str) -> Result<TopicNode> {
        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(search_prompt(query))];
        let response = self.client.complete(messages).await?;
        debug!(chars = response.content.len(), "Received search result payload");
        parse_topic(&response.content)
    }

    async fn summarize_once(&self, query: &str) -> Result<String> {
        let messages = vec![Message::user(summary_prompt(query))];
        let response = self.client.complete(messages).await?;
        Ok(response.content.trim().to_string())
    }
}

#[async_trait]
impl ContentFetcher for LlmContentFetcher {
    async fn fetch(&self, query: &str) -> Result<TopicNode> {
        self.retry
            .run("search results", || self.fetch_once(query))
            .await
    }
}

#[async_trait]
impl Summarizer for LlmContentFetcher {
    async fn summarize(&self, query: &str) -> Result<String> {
        self.retry
            .run("concise answer", || self.summarize_once(query))
            .await
    }
}

/// Prompt asking for a hierarchical JSON breakdown of `query`
pub fn search_prompt(query: &str) -> String {
    format!(
        r#"Generate a hierarchical search result for: "{query}". Provide the result in JSON format with the following structure:
{{
  "id": "1",
  "name": "{query}",
  "category": "main",
  "children": [
    {{
      "id": "1.1",
      "name": "Subtopic 1",
      "category": "category1",
      "children": [
        {{ "id": "1.1.1", "name": "Sub-subtopic 1", "category": "category1" }}
      ]
    }}
  ]
}}
Use appropriate categories like 'technology', 'science', 'history', etc. Limit to 3 levels of depth and 5 children per node. Ensure that the content is informative and relevant to the query. Reply with the JSON only."#
    )
}

/// Prompt asking for a short prose answer to `query`
pub fn summary_prompt(query: &str) -> String {
    format!("Provide a concise answer (2-3 sentences) to the following query: \"{query}\"")
}

/// Locate the JSON object inside a model reply, tolerating code fences and
/// surrounding prose
pub fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start < end).then(|| &content[start..=end])
}

fn parse_topic(content: &str) -> Result<TopicNode> {
    let json = extract_json(content)
        .ok_or_else(|| Error::ParseFailure("response contains no JSON object".to_string()))?;

    let node: TopicNode =
        serde_json::from_str(json).map_err(|e| Error::ParseFailure(e.to_string()))?;

    if node.name.trim().is_empty() {
        return Err(Error::ParseFailure("root node has no name".to_string()));
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_extract_json_strips_fences() {
        let reply = "```json\n{\"id\": \"1\", \"name\": \"X\"}\n```";
        assert_eq!(extract_json(reply), Some("{\"id\": \"1\", \"name\": \"X\"}"));
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_parse_topic() {
        let reply = r#"Here you go:
{"id": "1", "name": "Volcanoes", "category": "science", "children": [
  {"id": "1.1", "name": "Types", "category": "science"}
]}"#;
        let node = parse_topic(reply).unwrap();
        assert_eq!(node.name, "Volcanoes");
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn test_parse_topic_failures() {
        assert!(matches!(parse_topic("sorry"), Err(Error::ParseFailure(_))));
        assert!(matches!(
            parse_topic(r#"{"id": "1"}"#),
            Err(Error::ParseFailure(_))
        ));
        assert!(matches!(
            parse_topic(r#"{"id": "1", "name": "  "}"#),
            Err(Error::ParseFailure(_))
        ));
    }

    #[test]
    fn test_prompts_mention_query() {
        let prompt = search_prompt("quantum computing");
        assert!(prompt.contains("\"quantum computing\""));
        assert!(prompt.contains("3 levels of depth"));
        assert!(summary_prompt("tides").contains("tides"));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = LlmConfig {
            max_attempts: 0,
            retry_delay_ms: 250,
            ..LlmConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_retry_stops_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        };
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::FetchFailed("down".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_quota_errors() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        };
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::QuotaExceeded)
            })
            .await;

        assert!(matches!(result, Err(Error::QuotaExceeded)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        };
        let calls = AtomicU32::new(0);

        let result = policy
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(Error::ParseFailure("truncated".to_string()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_wait_is_honoured() {
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(10),
        };
        let start = tokio::time::Instant::now();

        let result: Result<()> = policy
            .run("test", || async { Err(Error::RateLimited(5)) })
            .await;

        assert!(matches!(result, Err(Error::RateLimited(5))));
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_fetch_failure() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            max_attempts: 2,
            retry_delay_ms: 1,
            ..LlmConfig::default()
        };
        let fetcher = LlmContentFetcher::new(LlmClient::new(config, "test-key").unwrap());

        let err = fetcher.fetch("anything").await.unwrap_err();
        assert!(err.is_fetch_failure());
    }

    #[test]
    fn test_from_config_requires_key_or_env() {
        let config = LlmConfig {
            api_key: Some("stored".to_string()),
            ..LlmConfig::default()
        };
        assert!(matches!(
            LlmContentFetcher::from_config(&config),
            Err(Error::ConfigError(_))
        ));
    }
}
