//! Hierarchical topic tree
//!
//! - `TopicNode`: the payload shape produced by a content fetch
//! - `TreeModel`: arena-backed tree with `Unexpanded | Expanded | Collapsed` nodes
//! - `TreeSnapshot`: owned, immutable view handed to layout and rendering
//! - `NavigationHistory`: one-step back navigation over expansion events

mod history;
mod model;
mod node;
mod snapshot;

pub use history::NavigationHistory;
pub use model::{Generation, NodeKey, StateKind, TreeModel};
pub use node::{Category, NodeId, TopicNode};
pub use snapshot::{SnapshotNode, TreeSnapshot};
