//! Terminal output shared by the one-shot commands and the REPL

use std::path::Path;

use topictree_core::expansion::Activation;
use topictree_core::layout::Layout;
use topictree_core::news::{NO_NEWS_MESSAGE, NewsArticle};
use topictree_core::tree::{NodeId, TreeSnapshot};
use topictree_core::visualization::{HierarchyTree, RenderOptions, SvgRenderer};

pub fn print_tree(snapshot: &TreeSnapshot) {
    let tree = HierarchyTree::with_options(snapshot, RenderOptions::default().with_categories(true));
    print!("{}", tree.render_with_summary());
}

pub fn print_news(articles: &[NewsArticle]) {
    println!("Recent News");
    if articles.is_empty() {
        println!("  {}", NO_NEWS_MESSAGE);
        return;
    }
    for article in articles {
        println!(
            "  - {} ({}, {})",
            article.title,
            article.source_name,
            article.published_at.format("%Y-%m-%d")
        );
        if let Some(description) = &article.description {
            println!("    {}", description);
        }
        println!("    {}", article.url);
    }
}

pub fn print_summary(summary: Option<&str>) {
    println!("Brief Summary");
    match summary {
        Some(text) => println!("  {}", text),
        None => println!("  (no summary available)"),
    }
}

pub fn describe_activation(id: &NodeId, activation: &Activation) -> String {
    match activation {
        Activation::Expanded { children } => {
            format!("Expanded {} with {} new topics", id, children.len())
        }
        Activation::Collapsed => format!("Collapsed {}", id),
        Activation::Reexpanded => format!("Expanded {}", id),
        Activation::Pending => format!("{} is still loading", id),
        Activation::Stale => format!("Result for {} arrived after the tree changed; discarded", id),
        Activation::Unchanged => format!("{} has nothing to expand", id),
    }
}

/// Render `layout` as SVG and write it to `path`
pub fn write_svg(layout: &Layout, path: &Path) -> anyhow::Result<()> {
    let svg = SvgRenderer::new().render(layout);
    std::fs::write(path, svg)?;
    Ok(())
}
