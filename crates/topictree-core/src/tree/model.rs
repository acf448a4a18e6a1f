//! Arena-backed tree model with explicit per-node expansion state

use std::collections::{HashMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{Error, Result};

use super::node::{Category, NodeId, TopicNode};
use super::snapshot::{SnapshotNode, TreeSnapshot};

/// Identity of one top-level tree; bumped whenever a new search replaces the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Identity of one node instance within a model.
///
/// A [`NodeId`] is handed out again when a subtree is replaced; a key is not,
/// so it tells an old node apart from its successor under the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(Index);

/// Expansion state of a node, owning its child references
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeState {
    /// Children never fetched
    Unexpanded,
    /// Children fetched and visible
    Expanded(Vec<Index>),
    /// Children fetched, hidden, kept for instant re-expansion
    Collapsed(Vec<Index>),
}

impl NodeState {
    fn children(&self) -> &[Index] {
        match self {
            Self::Unexpanded => &[],
            Self::Expanded(children) | Self::Collapsed(children) => children,
        }
    }

    fn into_children(self) -> Vec<Index> {
        match self {
            Self::Unexpanded => Vec::new(),
            Self::Expanded(children) | Self::Collapsed(children) => children,
        }
    }

    pub fn kind(&self) -> StateKind {
        match self {
            Self::Unexpanded => StateKind::Unexpanded,
            Self::Expanded(_) => StateKind::Expanded,
            Self::Collapsed(_) => StateKind::Collapsed,
        }
    }
}

/// Expansion state of a node without its child references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Unexpanded,
    Expanded,
    Collapsed,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unexpanded => write!(f, "unexpanded"),
            Self::Expanded => write!(f, "expanded"),
            Self::Collapsed => write!(f, "collapsed"),
        }
    }
}

#[derive(Debug)]
struct Slot {
    id: NodeId,
    name: String,
    category: Category,
    parent: Option<Index>,
    state: NodeState,
}

/// The hierarchical result of one search session.
///
/// Nodes live in a generational arena and are addressed from the outside by
/// [`NodeId`] only. Every structural edit goes through this type so that id
/// uniqueness and acyclicity are checked in one place.
#[derive(Debug)]
pub struct TreeModel {
    arena: Arena<Slot>,
    index: HashMap<NodeId, Index>,
    root: Index,
    generation: Generation,
}

impl TreeModel {
    /// Build a model from a fetched root, keeping any pre-populated children
    #[instrument(level = "debug", skip(node), fields(root = %node.name))]
    pub fn create_root(node: TopicNode, generation: Generation) -> Result<Self> {
        let mut seen = HashSet::new();
        check_unique(&node, &mut seen)?;

        let mut arena = Arena::with_capacity(seen.len());
        let mut index = HashMap::with_capacity(seen.len());
        let root = insert_subtree(&mut arena, &mut index, node, None);

        debug!(nodes = index.len(), %generation, "Created tree model");

        Ok(Self {
            arena,
            index,
            root,
            generation,
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn root_id(&self) -> &NodeId {
        &self.slot(self.root).id
    }

    /// Number of nodes, including collapsed (hidden) ones
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Instance key of the node currently holding `id`
    pub fn key(&self, id: &NodeId) -> Result<NodeKey> {
        self.index_of(id).map(NodeKey)
    }

    pub fn state(&self, id: &NodeId) -> Result<StateKind> {
        Ok(self.lookup(id)?.state.kind())
    }

    pub fn name(&self, id: &NodeId) -> Result<&str> {
        Ok(&self.lookup(id)?.name)
    }

    pub fn category(&self, id: &NodeId) -> Result<&Category> {
        Ok(&self.lookup(id)?.category)
    }

    /// Identifiers of the node's children, visible or cached
    pub fn child_ids(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        let slot = self.lookup(id)?;
        Ok(slot
            .state
            .children()
            .iter()
            .filter_map(|&idx| self.arena.get(idx).map(|c| c.id.clone()))
            .collect())
    }

    /// Distance from the root (root = 0)
    pub fn depth(&self, id: &NodeId) -> Result<usize> {
        let mut depth = 0;
        let mut current = self.lookup(id)?.parent;
        while let Some(idx) = current {
            depth += 1;
            current = self.arena.get(idx).and_then(|slot| slot.parent);
        }
        Ok(depth)
    }

    /// Whether `id` lies strictly below `ancestor`
    pub fn is_descendant(&self, id: &NodeId, ancestor: &NodeId) -> bool {
        let (Ok(target), Ok(slot)) = (self.index_of(ancestor), self.lookup(id)) else {
            return false;
        };
        let mut current = slot.parent;
        while let Some(idx) = current {
            if idx == target {
                return true;
            }
            current = self.arena.get(idx).and_then(|slot| slot.parent);
        }
        false
    }

    /// Replace the children of `id` and mark it expanded.
    ///
    /// Previously attached children (visible or cached) are dropped first,
    /// so their identifiers may be reused by the new subtree. An identifier
    /// already used anywhere else in the tree is rejected and the model is
    /// left untouched.
    #[instrument(level = "debug", skip(self, children), fields(count = children.len()))]
    pub fn attach_children(&mut self, id: &NodeId, children: Vec<TopicNode>) -> Result<()> {
        let idx = self.index_of(id)?;

        let mut replaced = HashSet::new();
        for &child in self.slot(idx).state.children() {
            self.collect_subtree_ids(child, &mut replaced);
        }

        let mut seen = HashSet::new();
        for child in &children {
            check_unique(child, &mut seen)?;
        }
        if let Some(clash) = seen
            .iter()
            .find(|candidate| self.index.contains_key(**candidate) && !replaced.contains(*candidate))
        {
            return Err(Error::DuplicateNodeId(clash.to_string()));
        }

        let old = match self.arena.get_mut(idx) {
            Some(slot) => std::mem::replace(&mut slot.state, NodeState::Unexpanded),
            None => return Err(Error::NodeNotFound(id.to_string())),
        };
        for child in old.into_children() {
            self.remove_subtree(child);
        }

        let new_children: Vec<Index> = children
            .into_iter()
            .map(|child| insert_subtree(&mut self.arena, &mut self.index, child, Some(idx)))
            .collect();

        debug!(node = %id, children = new_children.len(), "Attached children");

        if let Some(slot) = self.arena.get_mut(idx) {
            slot.state = NodeState::Expanded(new_children);
        }
        Ok(())
    }

    /// Hide the children of an expanded node; returns whether anything changed
    pub fn collapse(&mut self, id: &NodeId) -> Result<bool> {
        let idx = self.index_of(id)?;
        let Some(slot) = self.arena.get_mut(idx) else {
            return Err(Error::NodeNotFound(id.to_string()));
        };

        let (next, changed) = match std::mem::replace(&mut slot.state, NodeState::Unexpanded) {
            NodeState::Expanded(children) if !children.is_empty() => {
                (NodeState::Collapsed(children), true)
            }
            other => (other, false),
        };
        slot.state = next;
        Ok(changed)
    }

    /// Reveal the cached children of a collapsed node; returns whether anything changed
    pub fn expand(&mut self, id: &NodeId) -> Result<bool> {
        let idx = self.index_of(id)?;
        let Some(slot) = self.arena.get_mut(idx) else {
            return Err(Error::NodeNotFound(id.to_string()));
        };

        let (next, changed) = match std::mem::replace(&mut slot.state, NodeState::Unexpanded) {
            NodeState::Collapsed(children) if !children.is_empty() => {
                (NodeState::Expanded(children), true)
            }
            other => (other, false),
        };
        slot.state = next;
        Ok(changed)
    }

    /// Owned snapshot of the visible structure from the root
    pub fn read(&self) -> TreeSnapshot {
        TreeSnapshot {
            generation: self.generation,
            root: self.snapshot_node(self.root),
        }
    }

    /// Owned snapshot of the visible structure below `id`
    pub fn read_from(&self, id: &NodeId) -> Result<TreeSnapshot> {
        let idx = self.index_of(id)?;
        Ok(TreeSnapshot {
            generation: self.generation,
            root: self.snapshot_node(idx),
        })
    }

    fn snapshot_node(&self, idx: Index) -> SnapshotNode {
        let slot = self.slot(idx);
        let (children, hidden_children) = match &slot.state {
            NodeState::Unexpanded => (Vec::new(), 0),
            NodeState::Expanded(children) => (
                children
                    .iter()
                    .filter(|&&c| self.arena.contains(c))
                    .map(|&c| self.snapshot_node(c))
                    .collect(),
                0,
            ),
            NodeState::Collapsed(children) => (Vec::new(), children.len()),
        };

        SnapshotNode {
            id: slot.id.clone(),
            name: slot.name.clone(),
            category: slot.category.clone(),
            state: slot.state.kind(),
            hidden_children,
            children,
        }
    }

    fn collect_subtree_ids<'a>(&'a self, idx: Index, out: &mut HashSet<&'a str>) {
        if let Some(slot) = self.arena.get(idx) {
            out.insert(slot.id.as_str());
            for &child in slot.state.children() {
                self.collect_subtree_ids(child, out);
            }
        }
    }

    fn remove_subtree(&mut self, idx: Index) {
        if let Some(slot) = self.arena.remove(idx) {
            self.index.remove(&slot.id);
            for child in slot.state.into_children() {
                self.remove_subtree(child);
            }
        }
    }

    fn index_of(&self, id: &NodeId) -> Result<Index> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))
    }

    fn lookup(&self, id: &NodeId) -> Result<&Slot> {
        let idx = self.index_of(id)?;
        self.arena
            .get(idx)
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))
    }

    /// Slot for an index known to be live (root or a child reference)
    fn slot(&self, idx: Index) -> &Slot {
        &self.arena[idx]
    }
}

fn check_unique<'a>(node: &'a TopicNode, seen: &mut HashSet<&'a str>) -> Result<()> {
    if node.id.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "node '{}' has an empty identifier",
            node.name
        )));
    }
    if !seen.insert(node.id.as_str()) {
        return Err(Error::DuplicateNodeId(node.id.clone()));
    }
    for child in node.children() {
        check_unique(child, seen)?;
    }
    Ok(())
}

fn insert_subtree(
    arena: &mut Arena<Slot>,
    index: &mut HashMap<NodeId, Index>,
    node: TopicNode,
    parent: Option<Index>,
) -> Index {
    let TopicNode {
        id,
        name,
        category,
        children,
    } = node;
    let id = NodeId::from(id);

    let idx = arena.insert(Slot {
        id: id.clone(),
        name,
        category,
        parent,
        state: NodeState::Unexpanded,
    });
    index.insert(id, idx);

    if let Some(children) = children {
        let child_indices = children
            .into_iter()
            .map(|child| insert_subtree(arena, index, child, Some(idx)))
            .collect();
        if let Some(slot) = arena.get_mut(idx) {
            slot.state = NodeState::Expanded(child_indices);
        }
    }

    idx
}
