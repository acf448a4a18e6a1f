//! User-interaction state machine over the tree model
//!
//! Per node: `Unexpanded -> Expanded <-> Collapsed`. Only the first
//! transition fetches content; a failed fetch leaves the node Unexpanded.

mod controller;
mod tracker;

use serde::Serialize;

use crate::tree::{Generation, NodeId};

pub use controller::ExpansionController;

/// Result of a top-level search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// A new tree was installed
    Applied { generation: Generation, root: NodeId },
    /// A later search was issued before this one settled; its result was dropped
    Superseded,
}

impl SearchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of activating (clicking) a node or asking a question about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Activation {
    /// Fetched children were attached
    Expanded { children: Vec<NodeId> },
    /// Visible children were hidden
    Collapsed,
    /// Cached children were shown again
    Reexpanded,
    /// A fetch for this node is already in flight
    Pending,
    /// The fetch settled after the tree moved on; nothing was applied
    Stale,
    /// Nothing to toggle
    Unchanged,
}

impl Activation {
    /// Whether the tree changed
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Expanded { .. } | Self::Collapsed | Self::Reexpanded
        )
    }
}
