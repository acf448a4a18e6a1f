//! Plain-text rendering of tree snapshots for terminals

use std::fmt;

use crate::tree::{Category, SnapshotNode, StateKind, TreeSnapshot};

/// Style configuration for tree rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStyle {
    /// ASCII characters only (works everywhere)
    Ascii,
    /// Unicode box-drawing characters
    #[default]
    Unicode,
}

/// Markers for node expansion states
#[derive(Debug, Clone, Copy)]
pub struct StateIcon;

impl StateIcon {
    pub fn for_state(state: StateKind, style: NodeStyle) -> &'static str {
        match style {
            NodeStyle::Ascii => match state {
                StateKind::Unexpanded => "[ ]",
                StateKind::Expanded => "[-]",
                StateKind::Collapsed => "[+]",
            },
            NodeStyle::Unicode => match state {
                StateKind::Unexpanded => "○",
                StateKind::Expanded => "▼",
                StateKind::Collapsed => "▶",
            },
        }
    }
}

/// Options for rendering the tree
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub style: NodeStyle,
    /// Show node ids, which the explore commands take as arguments
    pub show_ids: bool,
    pub show_state: bool,
    /// Show non-default categories
    pub show_categories: bool,
    /// Deepest level to render, relative to the snapshot root
    pub max_depth: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            style: NodeStyle::Unicode,
            show_ids: true,
            show_state: true,
            show_categories: false,
            max_depth: None,
        }
    }
}

impl RenderOptions {
    /// Create ASCII-only options for basic terminals
    pub fn ascii() -> Self {
        Self {
            style: NodeStyle::Ascii,
            ..Default::default()
        }
    }

    /// Names only
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_state: false,
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_categories(mut self, show: bool) -> Self {
        self.show_categories = show;
        self
    }
}

/// Renders a [`TreeSnapshot`] as indented text
#[derive(Debug, Clone)]
pub struct HierarchyTree<'a> {
    snapshot: &'a TreeSnapshot,
    options: RenderOptions,
}

impl<'a> HierarchyTree<'a> {
    pub fn new(snapshot: &'a TreeSnapshot) -> Self {
        Self {
            snapshot,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(snapshot: &'a TreeSnapshot, options: RenderOptions) -> Self {
        Self { snapshot, options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(&self) -> String {
        let mut output = String::new();
        self.render_node(&self.snapshot.root, &mut output, "", true, 0);
        output
    }

    /// Render to a vector of lines
    pub fn render_lines(&self) -> Vec<String> {
        self.render().lines().map(|s| s.to_string()).collect()
    }

    pub fn render_with_summary(&self) -> String {
        let mut output = self.render_header();
        output.push('\n');
        self.render_node(&self.snapshot.root, &mut output, "", true, 0);
        output
    }

    fn render_header(&self) -> String {
        let nodes = self.snapshot.root.walk();
        let count = |kind: StateKind| nodes.iter().filter(|n| n.state == kind).count();

        format!(
            "{} ({} shown, {} expanded, {} collapsed, {} unexplored)",
            self.snapshot.root.name,
            nodes.len(),
            count(StateKind::Expanded),
            count(StateKind::Collapsed),
            count(StateKind::Unexpanded)
        )
    }

    fn render_node(
        &self,
        node: &SnapshotNode,
        output: &mut String,
        prefix: &str,
        is_last: bool,
        depth: usize,
    ) {
        let (branch, vertical) = match (self.options.style, is_last) {
            (NodeStyle::Ascii, true) => ("`-- ", "    "),
            (NodeStyle::Ascii, false) => ("+-- ", "|   "),
            (NodeStyle::Unicode, true) => ("└── ", "    "),
            (NodeStyle::Unicode, false) => ("├── ", "│   "),
        };

        let mut line = String::new();
        if depth > 0 {
            line.push_str(prefix);
            line.push_str(branch);
        }

        if self.options.show_state {
            line.push_str(StateIcon::for_state(node.state, self.options.style));
            line.push(' ');
        }

        line.push_str(&node.name);

        if self.options.show_ids {
            line.push_str(&format!(" [{}]", node.id));
        }
        if self.options.show_categories && node.category != Category::Main {
            line.push_str(&format!(" ({})", node.category));
        }
        if node.hidden_children > 0 {
            line.push_str(&format!(" +{} hidden", node.hidden_children));
        }

        let truncated = self.options.max_depth.is_some_and(|max| depth >= max);
        if truncated && node.has_visible_children() {
            line.push_str(" ...");
        }

        output.push_str(&line);
        output.push('\n');

        if truncated {
            return;
        }

        let child_count = node.children.len();
        let new_prefix = if depth > 0 {
            format!("{}{}", prefix, vertical)
        } else {
            String::new()
        };
        for (i, child) in node.children.iter().enumerate() {
            self.render_node(child, output, &new_prefix, i + 1 == child_count, depth + 1);
        }
    }
}

impl fmt::Display for HierarchyTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
