//! Topictree Core Library
//!
//! Interactive topic trees grown on demand from a content source:
//! - Tree model (arena-backed, explicit Unexpanded / Expanded / Collapsed states)
//! - Expansion controller (lazy per-node fetches, coalescing, stale-result guards, back navigation)
//! - Deterministic horizontal and radial layouts
//! - Content fetchers (OpenAI-compatible LLM, offline mock)
//! - Best-effort news lookup (NewsAPI)
//! - Text and SVG renderers

pub mod config;
pub mod error;
pub mod expansion;
pub mod layout;
pub mod llm;
pub mod news;
pub mod search;
pub mod session;
pub mod tree;
pub mod visualization;


pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::expansion::{Activation, ExpansionController, SearchOutcome};
    pub use crate::layout::{Layout, LayoutMode, LayoutParams, Viewport};
    pub use crate::news::{NewsArticle, NewsClient, NewsSource, NoNews};
    pub use crate::search::{ContentFetcher, LlmContentFetcher, MockContentFetcher, Summarizer};
    pub use crate::session::{AskReport, SearchReport, SearchSession};
    pub use crate::tree::{NodeId, StateKind, TopicNode, TreeSnapshot};
}
