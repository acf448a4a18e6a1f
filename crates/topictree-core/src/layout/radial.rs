//! Radial projection: breadth becomes angle, depth becomes radius

use std::f64::consts::{PI, TAU};

use super::{LabelSide, LayoutParams, Placed, Point, Projection, Viewport};

/// Outer rings have more room per unit of angle, so separation shrinks with depth
pub(crate) fn separation(same_parent: bool, depth: usize) -> f64 {
    let base = if same_parent { 1.0 } else { 2.0 };
    base / depth.max(1) as f64
}

pub(crate) fn project(
    placed: &[Placed<'_>],
    tree_height: usize,
    viewport: Viewport,
    params: &LayoutParams,
) -> Vec<Projection> {
    let Some((left, right)) = extremes(placed) else {
        return Vec::new();
    };

    // Pad both ends by half a separation so the first and last leaves do not
    // meet at twelve o'clock.
    let pad = if left == right {
        1.0
    } else {
        let (l, r) = (&placed[left], &placed[right]);
        separation(l.parent == r.parent, l.depth) / 2.0
    };
    let shift = pad - placed[left].breadth;
    let angle_scale = TAU / (placed[right].breadth + pad + shift);

    let radius = (viewport.width.min(viewport.height) / 2.0 - params.radial_padding).max(0.0);
    let ring = radius / tree_height.max(1) as f64;
    let (cx, cy) = (viewport.width / 2.0, viewport.height / 2.0);

    placed
        .iter()
        .map(|p| {
            let angle = (p.breadth + shift) * angle_scale;
            let r = p.depth as f64 * ring;
            let leaf = !p.node.has_visible_children();
            Projection {
                position: Point {
                    x: cx + r * angle.sin(),
                    y: cy - r * angle.cos(),
                },
                label_side: if (angle < PI) == leaf {
                    LabelSide::Right
                } else {
                    LabelSide::Left
                },
                angle: Some(angle),
            }
        })
        .collect()
}

/// Indices of the first minimum and first maximum breadth
fn extremes(placed: &[Placed<'_>]) -> Option<(usize, usize)> {
    let first = placed.first()?;
    let (mut left, mut right) = (0, 0);
    let (mut min, mut max) = (first.breadth, first.breadth);

    for (i, p) in placed.iter().enumerate().skip(1) {
        if p.breadth < min {
            min = p.breadth;
            left = i;
        }
        if p.breadth > max {
            max = p.breadth;
            right = i;
        }
    }
    Some((left, right))
}
