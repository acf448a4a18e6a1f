//! Node identifiers, categories and the fetched payload shape

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a node, unique within one tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of the root of every top-level search
    pub fn root() -> Self {
        Self("1".to_string())
    }

    /// Identifier of the `n`th (1-based) child of this node
    pub fn child(&self, n: usize) -> Self {
        Self(format!("{}.{}", self.0, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Category tag of a node; only used for styling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Main,
    Science,
    History,
    Technology,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Main => "main",
            Self::Science => "science",
            Self::History => "history",
            Self::Technology => "technology",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Ok(match tag.as_str() {
            "" | "main" => Self::Main,
            "science" => Self::Science,
            "history" => Self::History,
            "technology" => Self::Technology,
            _ => Self::Other(tag),
        })
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(category) = raw.parse::<Category>();
        Ok(category)
    }
}

/// A node as produced by a content fetch.
///
/// `children: None` means the node has not been expanded yet; an empty
/// vector means it was expanded and turned out to have no children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicNode {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TopicNode>>,
}

impl TopicNode {
    /// Create a not-yet-expanded node
    pub fn leaf(id: impl Into<String>, name: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            children: None,
        }
    }

    /// Create a node with the given children
    pub fn branch(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        children: Vec<TopicNode>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            children: Some(children),
        }
    }

    /// Children, or an empty slice when not expanded
    pub fn children(&self) -> &[TopicNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Number of nodes in this subtree, including itself
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(|c| c.count()).sum::<usize>()
    }

    /// Rewrite identifiers hierarchically below `id` (`id`, `id.1`, `id.1.1`, ...)
    pub fn reidentify(mut self, id: &NodeId) -> Self {
        self.id = id.to_string();
        if let Some(children) = self.children.take() {
            self.children = Some(
                children
                    .into_iter()
                    .enumerate()
                    .map(|(i, child)| child.reidentify(&id.child(i + 1)))
                    .collect(),
            );
        }
        self
    }
}

/// LLMs sometimes emit numeric ids; accept strings, numbers or nothing
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}
