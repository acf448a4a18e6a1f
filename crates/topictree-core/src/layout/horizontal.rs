//! Layered left-to-right projection

use super::{LabelSide, LayoutParams, Placed, Point, Projection, Viewport};

pub(crate) fn separation(same_parent: bool, _depth: usize) -> f64 {
    if same_parent { 1.0 } else { 2.0 }
}

/// Depth runs along x, breadth along y; the root sits on the vertical centre
pub(crate) fn project(
    placed: &[Placed<'_>],
    tree_height: usize,
    viewport: Viewport,
    params: &LayoutParams,
) -> Vec<Projection> {
    let usable_width = (viewport.width - 2.0 * params.margin_x).max(0.0);
    let depth_step = usable_width / tree_height.max(1) as f64;
    let root_breadth = placed.first().map_or(0.0, |p| p.breadth);
    let centre = viewport.height / 2.0;

    placed
        .iter()
        .map(|p| Projection {
            position: Point {
                x: params.margin_x + p.depth as f64 * depth_step,
                y: centre + (p.breadth - root_breadth) * params.node_spacing,
            },
            label_side: if p.node.has_visible_children() {
                LabelSide::Left
            } else {
                LabelSide::Right
            },
            angle: None,
        })
        .collect()
}
