//! Immutable, owned views of a tree model

use serde::Serialize;

use super::model::{Generation, StateKind};
use super::node::{Category, NodeId};

/// A visible node and its visible descendants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub name: String,
    pub category: Category,
    pub state: StateKind,
    /// Number of cached children hidden by a collapse
    #[serde(skip_serializing_if = "is_zero")]
    pub hidden_children: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl SnapshotNode {
    pub fn has_visible_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of visible nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(|c| c.count()).sum::<usize>()
    }

    /// Longest visible path below this node (a lone node has height 0)
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn find(&self, id: &NodeId) -> Option<&SnapshotNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Pre-order walk over visible nodes
    pub fn walk(&self) -> Vec<&SnapshotNode> {
        let mut out = Vec::with_capacity(self.count());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

/// Snapshot of a tree generation, rooted at the anchor it was read from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSnapshot {
    pub generation: Generation,
    pub root: SnapshotNode,
}

impl TreeSnapshot {
    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    pub fn height(&self) -> usize {
        self.root.height()
    }

    pub fn find(&self, id: &NodeId) -> Option<&SnapshotNode> {
        self.root.find(id)
    }

    /// Visible identifiers in pre-order
    pub fn ids(&self) -> Vec<NodeId> {
        self.root.walk().into_iter().map(|n| n.id.clone()).collect()
    }
}
