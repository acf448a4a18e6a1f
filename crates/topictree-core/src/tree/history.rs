//! Back-navigation history over expansion events

use super::node::NodeId;

/// Ordered list of previously focused nodes.
///
/// Append-only apart from [`NavigationHistory::back`], which pops one entry
/// but never the last remaining one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationHistory {
    entries: Vec<NodeId>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History seeded with the root of a fresh tree
    pub fn starting_at(root: NodeId) -> Self {
        Self {
            entries: vec![root],
        }
    }

    /// Record an expansion event; every event is a step, repeats included
    pub fn push(&mut self, id: NodeId) {
        self.entries.push(id);
    }

    /// Step back once and return the new current entry.
    ///
    /// With one entry or none there is nowhere to go and `None` is returned.
    pub fn back(&mut self) -> Option<&NodeId> {
        if self.entries.len() <= 1 {
            return None;
        }
        self.entries.pop();
        self.entries.last()
    }

    pub fn current(&self) -> Option<&NodeId> {
        self.entries.last()
    }

    pub fn can_go_back(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    /// Drop entries that no longer refer to a live node
    pub fn retain(&mut self, mut keep: impl FnMut(&NodeId) -> bool) {
        self.entries.retain(|id| keep(id));
    }
}
