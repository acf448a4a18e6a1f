//! Deterministic tree layout
//!
//! [`compute`] is a pure function of a [`TreeSnapshot`], a [`Viewport`] and
//! [`LayoutParams`]. Both modes share one breadth placement:
//! - leaves are placed left to right in pre-order
//! - consecutive leaves are one unit apart when they share a parent, two otherwise
//! - every parent sits midway between its first and last child
//!
//! The modes differ only in how (depth, breadth) is projected onto the canvas.

mod horizontal;
mod radial;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::tree::{Category, NodeId, SnapshotNode, StateKind, TreeSnapshot};

/// Presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Layered, root on the left
    #[default]
    Horizontal,
    /// Root in the centre, depth as radius
    Radial,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Radial => "radial",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "horizontal" | "tree" => Ok(Self::Horizontal),
            "radial" => Ok(Self::Radial),
            other => Err(Error::InvalidInput(format!(
                "Unknown layout mode '{}'. Use 'horizontal' or 'radial'",
                other
            ))),
        }
    }
}

/// Canvas size in user units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if usable(self.width) && usable(self.height) {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "viewport must have positive finite dimensions, got {}x{}",
                self.width, self.height
            )))
        }
    }
}

/// Spacing knobs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Distance between adjacent siblings in the horizontal layout
    pub node_spacing: f64,
    pub margin_x: f64,
    pub margin_y: f64,
    /// Gap between the outermost ring and the viewport edge
    pub radial_padding: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            node_spacing: 60.0,
            margin_x: 120.0,
            margin_y: 40.0,
            radial_padding: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Where a node's label goes relative to its marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: NodeId,
    pub name: String,
    pub category: Category,
    pub state: StateKind,
    pub hidden_children: usize,
    /// Depth below the anchor of the snapshot
    pub depth: usize,
    pub has_visible_children: bool,
    pub position: Point,
    pub label_side: LabelSide,
    /// Angle in radians, clockwise from twelve o'clock (radial mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}

/// Parent-child link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub from: Point,
    pub to: Point,
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Positioned nodes (pre-order) and edges for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub mode: LayoutMode,
    pub viewport: Viewport,
    /// Viewport grown to cover every node plus margins
    pub frame: Rect,
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Edge>,
}

impl Layout {
    pub fn node(&self, id: &NodeId) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

/// Lay out `snapshot` for `viewport`
#[instrument(level = "debug", skip(snapshot, params), fields(nodes = snapshot.node_count()))]
pub fn compute(
    snapshot: &TreeSnapshot,
    mode: LayoutMode,
    viewport: Viewport,
    params: &LayoutParams,
) -> Result<Layout> {
    viewport.validate()?;

    let placed = match mode {
        LayoutMode::Horizontal => place(&snapshot.root, horizontal::separation),
        LayoutMode::Radial => place(&snapshot.root, radial::separation),
    };
    let height = snapshot.height();

    let projected = match mode {
        LayoutMode::Horizontal => horizontal::project(&placed, height, viewport, params),
        LayoutMode::Radial => radial::project(&placed, height, viewport, params),
    };

    let nodes: Vec<PositionedNode> = placed
        .iter()
        .zip(projected)
        .map(|(p, projection)| PositionedNode {
            id: p.node.id.clone(),
            name: p.node.name.clone(),
            category: p.node.category.clone(),
            state: p.node.state,
            hidden_children: p.node.hidden_children,
            depth: p.depth,
            has_visible_children: p.node.has_visible_children(),
            position: projection.position,
            label_side: projection.label_side,
            angle: projection.angle,
        })
        .collect();

    let edges = placed
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let parent = p.parent?;
            Some(Edge {
                source: nodes[parent].id.clone(),
                target: nodes[i].id.clone(),
                from: nodes[parent].position,
                to: nodes[i].position,
            })
        })
        .collect();

    let frame = frame(&nodes, viewport, params);

    Ok(Layout {
        mode,
        viewport,
        frame,
        nodes,
        edges,
    })
}

/// Node with its abstract coordinates
#[derive(Debug)]
pub(crate) struct Placed<'a> {
    pub node: &'a SnapshotNode,
    /// Index of the parent in the placement list
    pub parent: Option<usize>,
    pub depth: usize,
    pub breadth: f64,
}

/// Canvas coordinates chosen by a projection
pub(crate) struct Projection {
    pub position: Point,
    pub label_side: LabelSide,
    pub angle: Option<f64>,
}

struct Placer<'a, F> {
    out: Vec<Placed<'a>>,
    /// Parent, depth and breadth of the previously placed leaf
    last_leaf: Option<(Option<usize>, usize, f64)>,
    separation: F,
}

impl<'a, F: Fn(bool, usize) -> f64> Placer<'a, F> {
    fn visit(&mut self, node: &'a SnapshotNode, parent: Option<usize>, depth: usize) -> f64 {
        let index = self.out.len();
        self.out.push(Placed {
            node,
            parent,
            depth,
            breadth: 0.0,
        });

        let breadth = if node.children.is_empty() {
            let breadth = match self.last_leaf {
                None => 0.0,
                Some((prev_parent, prev_depth, prev_breadth)) => {
                    prev_breadth + (self.separation)(prev_parent == parent, prev_depth)
                }
            };
            self.last_leaf = Some((parent, depth, breadth));
            breadth
        } else {
            let mut first = None;
            let mut last = 0.0;
            for child in &node.children {
                let b = self.visit(child, Some(index), depth + 1);
                first.get_or_insert(b);
                last = b;
            }
            (first.unwrap_or(last) + last) / 2.0
        };

        self.out[index].breadth = breadth;
        breadth
    }
}

/// Pre-order placement. `separation(same_parent, depth)` is the gap between
/// two consecutive leaves, `depth` being that of the left one.
pub(crate) fn place(root: &SnapshotNode, separation: impl Fn(bool, usize) -> f64) -> Vec<Placed<'_>> {
    let mut placer = Placer {
        out: Vec::with_capacity(root.count()),
        last_leaf: None,
        separation,
    };
    placer.visit(root, None, 0);
    placer.out
}

fn frame(nodes: &[PositionedNode], viewport: Viewport, params: &LayoutParams) -> Rect {
    let (mut min_x, mut min_y) = (0.0_f64, 0.0_f64);
    let (mut max_x, mut max_y) = (viewport.width, viewport.height);

    for node in nodes {
        min_x = min_x.min(node.position.x - params.margin_x);
        max_x = max_x.max(node.position.x + params.margin_x);
        min_y = min_y.min(node.position.y - params.margin_y);
        max_y = max_y.max(node.position.y + params.margin_y);
    }

    Rect {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}
