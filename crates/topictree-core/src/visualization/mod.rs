//! Renderers for tree snapshots and layouts
//!
//! - [`HierarchyTree`]: indented text for terminals, from a `TreeSnapshot`
//! - [`SvgRenderer`]: standalone SVG, from a computed `Layout`

mod svg;
mod text;

pub use svg::{SvgOptions, SvgRenderer, escape};
pub use text::{HierarchyTree, NodeStyle, RenderOptions, StateIcon};
