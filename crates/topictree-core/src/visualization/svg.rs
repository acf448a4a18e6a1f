//! SVG rendering of computed layouts

use std::fmt::Write as _;

use crate::layout::{Edge, LabelSide, Layout, LayoutMode, PositionedNode};

const LINK_COLOR: &str = "#555";
const BRANCH_COLOR: &str = "#4299E1";
const LEAF_COLOR: &str = "#48BB78";
const NODE_STROKE: &str = "#2D3748";
const LABEL_COLOR: &str = "#E2E8F0";
const LABEL_HALO: &str = "#1A202C";
const ASK_COLOR: &str = "#4FD1C5";

/// Options for SVG output
#[derive(Debug, Clone)]
pub struct SvgOptions {
    /// Fill for a full-size background rectangle; `None` leaves it transparent
    pub background: Option<String>,
    /// Add an "Ask" affordance under every label
    pub show_ask: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            background: Some(LABEL_HALO.to_string()),
            show_ask: true,
        }
    }
}

/// Draws a [`Layout`] as a standalone SVG document.
///
/// Every node group carries `data-id`, and every ask affordance
/// `data-ask`, so a host can map clicks back to node ids.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    options: SvgOptions,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SvgOptions) -> Self {
        Self { options }
    }

    pub fn render(&self, layout: &Layout) -> String {
        let frame = layout.frame;
        let mut out = String::new();

        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}" font-family="Arial, sans-serif">"#,
            num(frame.width),
            num(frame.height),
            num(frame.x),
            num(frame.y),
            num(frame.width),
            num(frame.height)
        );

        if let Some(background) = &self.options.background {
            let _ = writeln!(
                out,
                r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                num(frame.x),
                num(frame.y),
                num(frame.width),
                num(frame.height),
                escape(background)
            );
        }

        let (link_width, link_opacity) = match layout.mode {
            LayoutMode::Horizontal => (3, "0.6"),
            LayoutMode::Radial => (1, "0.4"),
        };
        let _ = writeln!(
            out,
            r#"  <g class="links" fill="none" stroke="{}" stroke-opacity="{}" stroke-width="{}">"#,
            LINK_COLOR, link_opacity, link_width
        );
        for edge in &layout.edges {
            let _ = writeln!(out, r#"    <path d="{}"/>"#, link_path(layout.mode, edge));
        }
        out.push_str("  </g>\n");

        out.push_str("  <g class=\"nodes\">\n");
        for node in &layout.nodes {
            self.render_node(&mut out, layout.mode, node);
        }
        out.push_str("  </g>\n</svg>\n");
        out
    }

    fn render_node(&self, out: &mut String, mode: LayoutMode, node: &PositionedNode) {
        let (radius, label_offset, font_size, ask_size) = match mode {
            LayoutMode::Horizontal => (10, 15, 18, 16),
            LayoutMode::Radial => (4, 6, 12, 10),
        };
        let fill = match mode {
            LayoutMode::Horizontal if node.has_visible_children => BRANCH_COLOR,
            LayoutMode::Radial if node.depth == 0 => BRANCH_COLOR,
            _ => LEAF_COLOR,
        };
        let (x, anchor) = match node.label_side {
            LabelSide::Left => (-label_offset, "end"),
            LabelSide::Right => (label_offset, "start"),
        };
        let id = escape(node.id.as_str());

        let _ = writeln!(
            out,
            r#"    <g class="node node--{}" data-id="{}" transform="translate({},{})">"#,
            node.state,
            id,
            num(node.position.x),
            num(node.position.y)
        );
        let _ = writeln!(
            out,
            r#"      <circle r="{}" fill="{}" stroke="{}" stroke-width="3"/>"#,
            radius, fill, NODE_STROKE
        );
        let _ = writeln!(
            out,
            r#"      <text dy="0.31em" x="{}" text-anchor="{}" font-size="{}" font-weight="bold" fill="{}" stroke="{}" stroke-width="3" paint-order="stroke">{}</text>"#,
            x,
            anchor,
            font_size,
            LABEL_COLOR,
            LABEL_HALO,
            escape(&node.name)
        );
        if self.options.show_ask {
            let _ = writeln!(
                out,
                r#"      <text class="ask" data-ask="{}" dy="1.51em" x="{}" text-anchor="{}" font-size="{}" font-weight="bold" fill="{}" cursor="pointer">Ask</text>"#,
                id, x, anchor, ask_size, ASK_COLOR
            );
        }
        out.push_str("    </g>\n");
    }
}

fn link_path(mode: LayoutMode, edge: &Edge) -> String {
    let (from, to) = (edge.from, edge.to);
    match mode {
        // horizontal links bend halfway along the depth axis
        LayoutMode::Horizontal => {
            let mid = (from.x + to.x) / 2.0;
            format!(
                "M{},{}C{},{} {},{} {},{}",
                num(from.x),
                num(from.y),
                num(mid),
                num(from.y),
                num(mid),
                num(to.y),
                num(to.x),
                num(to.y)
            )
        }
        LayoutMode::Radial => format!(
            "M{},{}L{},{}",
            num(from.x),
            num(from.y),
            num(to.x),
            num(to.y)
        ),
    }
}

/// Coordinates with at most two decimals and no trailing zeros
fn num(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Escape text for use in XML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutParams, Viewport, compute};
    use crate::tree::{Category, Generation, NodeId, SnapshotNode, StateKind, TreeSnapshot};

    fn snap(id: &str, name: &str, children: Vec<SnapshotNode>) -> SnapshotNode {
        SnapshotNode {
            id: NodeId::new(id),
            name: name.to_string(),
            category: Category::Main,
            state: if children.is_empty() {
                StateKind::Unexpanded
            } else {
                StateKind::Expanded
            },
            hidden_children: 0,
            children,
        }
    }

    fn layout(mode: LayoutMode) -> Layout {
        let tree = TreeSnapshot {
            generation: Generation(1),
            root: snap(
                "1",
                "Salt & <Pepper>",
                vec![snap("1.1", "Uses", vec![]), snap("1.2", "History", vec![])],
            ),
        };
        compute(&tree, mode, Viewport::new(800.0, 600.0), &LayoutParams::default()).unwrap()
    }

    #[test]
    fn test_num() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(1.23456), "1.23");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(100.0), "100");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b>&"c"'"#), "a&lt;b&gt;&amp;&quot;c&quot;&apos;");
    }

    #[test]
    fn test_horizontal_document() {
        let svg = SvgRenderer::new().render(&layout(LayoutMode::Horizontal));

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert_eq!(svg.matches("<path").count(), 2);
        assert_eq!(svg.matches(">Ask</text>").count(), 3);
        assert!(svg.contains("Salt &amp; &lt;Pepper&gt;"));
        assert!(svg.contains(r#"data-id="1.2""#));
        // root has visible children, leaves do not
        assert_eq!(svg.matches(BRANCH_COLOR).count(), 1);
        assert_eq!(svg.matches(LEAF_COLOR).count(), 2);
        let paths: Vec<&str> = svg.lines().filter(|l| l.contains("<path")).collect();
        assert!(paths.iter().all(|p| p.contains('C')));
    }

    #[test]
    fn test_radial_document_without_extras() {
        let renderer = SvgRenderer::with_options(SvgOptions {
            background: None,
            show_ask: false,
        });
        let svg = renderer.render(&layout(LayoutMode::Radial));

        assert!(!svg.contains("<rect"));
        assert!(!svg.contains("Ask"));
        assert_eq!(svg.matches(r#"<circle r="4""#).count(), 3);
        let paths: Vec<&str> = svg.lines().filter(|l| l.contains("<path")).collect();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.contains('L') && !p.contains('C')));
    }
}
