//! Bookkeeping for outstanding fetches

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::tree::{Generation, NodeKey};

/// A node instance in a given tree; keys alone repeat across models
type PendingNode = (Generation, NodeKey);

#[derive(Debug, Default)]
struct State {
    /// Nodes with an activation fetch in flight
    nodes: HashSet<PendingNode>,
    /// Fetches of any kind in flight
    outstanding: usize,
}

/// Tracks in-flight fetches.
///
/// Entries are released by dropping the returned [`FetchGuard`], so a
/// cancelled operation never leaves a node marked as loading.
#[derive(Debug, Default)]
pub(crate) struct FetchTracker {
    state: Mutex<State>,
}

impl FetchTracker {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a fetch not tied to a node (search, ask)
    pub fn begin(&self) -> FetchGuard<'_> {
        self.state().outstanding += 1;
        FetchGuard {
            tracker: self,
            node: None,
        }
    }

    /// Register an activation fetch, or `None` if one is already running
    pub fn begin_node(&self, generation: Generation, key: NodeKey) -> Option<FetchGuard<'_>> {
        let pending = (generation, key);
        let mut state = self.state();
        if !state.nodes.insert(pending) {
            return None;
        }
        state.outstanding += 1;
        Some(FetchGuard {
            tracker: self,
            node: Some(pending),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.state().outstanding > 0
    }

    pub fn is_pending(&self, generation: Generation, key: NodeKey) -> bool {
        self.state().nodes.contains(&(generation, key))
    }
}

pub(crate) struct FetchGuard<'a> {
    tracker: &'a FetchTracker,
    node: Option<PendingNode>,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.tracker.state();
        state.outstanding = state.outstanding.saturating_sub(1);
        if let Some(pending) = self.node.take() {
            state.nodes.remove(&pending);
        }
    }
}
