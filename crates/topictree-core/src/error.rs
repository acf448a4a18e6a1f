//! Error types for Topictree

use thiserror::Error;

/// Result type alias using Topictree's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Topictree error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Tree errors (E001-E099)
    #[error("Node '{0}' not found in the current tree.")]
    NodeNotFound(String),

    #[error("Node id '{0}' is already used elsewhere in the tree.")]
    DuplicateNodeId(String),

    // Fetch errors (E100-E199)
    #[error("Network error: {0}. Check your internet connection.")]
    NetworkError(#[from] reqwest::Error),

    #[error("LLM API error: {0}. Check your API key with `topictree config get llm.api_key`.")]
    LLMError(String),

    #[error("Rate limited. Waiting {0} seconds before retry.")]
    RateLimited(u64),

    #[error("API quota exceeded. Check the billing settings of your LLM provider.")]
    QuotaExceeded,

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    // Payload errors (E200-E299)
    #[error("Could not parse search results: {0}")]
    ParseFailure(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound(_) => "E001",
            Self::DuplicateNodeId(_) => "E002",
            Self::NetworkError(_) => "E100",
            Self::LLMError(_) => "E101",
            Self::RateLimited(_) => "E102",
            Self::QuotaExceeded => "E103",
            Self::FetchFailed(_) => "E104",
            Self::ParseFailure(_) => "E200",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NetworkError(_) => Some("Check internet connection".to_string()),
            Self::LLMError(_) => Some("topictree config get llm.api_key".to_string()),
            Self::QuotaExceeded => Some("Top up the LLM account or switch llm.base_url".to_string()),
            Self::RateLimited(_) | Self::FetchFailed(_) | Self::ParseFailure(_) => {
                Some("Activate the node again to retry".to_string())
            }
            Self::ConfigError(_) => Some("topictree config list".to_string()),
            _ => None,
        }
    }

    /// Whether this error belongs to the fetch-failure family
    /// (network, API, rate limit or quota problems of a remote call).
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_)
                | Self::LLMError(_)
                | Self::RateLimited(_)
                | Self::QuotaExceeded
                | Self::FetchFailed(_)
        )
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Quota exhaustion and authentication failures never recover by
    /// retrying; everything else on the fetch path might.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::QuotaExceeded => false,
            Self::LLMError(msg) => !msg.starts_with("Unauthorized"),
            Self::NetworkError(_) | Self::RateLimited(_) | Self::FetchFailed(_) => true,
            Self::ParseFailure(_) => true,
            _ => false,
        }
    }
}
