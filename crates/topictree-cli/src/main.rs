//! Topictree CLI - explore topics as lazily expanded trees

mod output;
mod repl;


use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use topictree_core::config::Config;
use topictree_core::expansion::SearchOutcome;
use topictree_core::layout::{LayoutMode, Viewport};
use topictree_core::news::{NewsClient, NewsSource};
use topictree_core::search::{LlmContentFetcher, MockContentFetcher};
use topictree_core::session::SearchSession;
use tracing::{debug, info};

use crate::repl::Repl;

#[derive(Parser)]
#[command(name = "topictree")]
#[command(author, version, about = "Explore topics as lazily expanded trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Debug, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a topic and print its tree, recent news and a brief summary
    Search {
        /// What to search for
        query: String,
        /// Use canned offline results instead of the LLM backend
        #[arg(long)]
        mock: bool,
        /// Layout for SVG output (horizontal or radial)
        #[arg(short, long)]
        layout: Option<LayoutMode>,
        /// Write the laid-out tree as SVG
        #[arg(long)]
        svg: Option<PathBuf>,
        /// Skip the news lookup
        #[arg(long)]
        no_news: bool,
        /// Viewport width for SVG output
        #[arg(long)]
        width: Option<f64>,
        /// Viewport height for SVG output
        #[arg(long)]
        height: Option<f64>,
    },

    /// Explore interactively
    Explore {
        /// Initial search
        query: Option<String>,
        /// Use canned offline results instead of the LLM backend
        #[arg(long)]
        mock: bool,
        /// Initial layout for SVG output (horizontal or radial)
        #[arg(short, long)]
        layout: Option<LayoutMode>,
    },

    /// Look up recent news for a topic
    News {
        /// What to look up
        query: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., llm.model)
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// List all config values
    List,
    /// Reset to defaults
    Reset,
    /// Show the config file location
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("topictree=info".parse()?),
        )
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded environment file");
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search {
            query,
            mock,
            layout,
            svg,
            no_news,
            width,
            height,
        } => {
            let options = SearchOptions {
                mock,
                layout,
                svg,
                no_news,
                width,
                height,
            };
            cmd_search(&query, options, cli.format, cli.quiet).await
        }

        Commands::Explore {
            query,
            mock,
            layout,
        } => cmd_explore(query, mock, layout).await,

        Commands::News { query } => cmd_news(&query, cli.format, cli.quiet).await,

        Commands::Config { action } => cmd_config(action, cli.quiet),
    };

    if let Err(e) = &result {
        if let Some(hint) = e
            .downcast_ref::<topictree_core::Error>()
            .and_then(|core| core.suggestion())
        {
            eprintln!("Hint: {}", hint);
        }
    }
    result
}

struct SearchOptions {
    mock: bool,
    layout: Option<LayoutMode>,
    svg: Option<PathBuf>,
    no_news: bool,
    width: Option<f64>,
    height: Option<f64>,
}

/// Build a search session from configuration, or an offline one with `mock`
fn build_session(config: &Config, mock: bool, with_news: bool) -> anyhow::Result<SearchSession> {
    if mock {
        info!("Using offline sample results");
        let fetcher = Arc::new(MockContentFetcher::new());
        return Ok(SearchSession::new(fetcher.clone()).with_summarizer(fetcher));
    }

    let fetcher = Arc::new(LlmContentFetcher::from_config(&config.llm)?);
    let mut session = SearchSession::new(fetcher.clone()).with_summarizer(fetcher);
    if with_news {
        session = session.with_news(news_source(config)?);
    }
    Ok(session)
}

fn news_source(config: &Config) -> anyhow::Result<Arc<dyn NewsSource>> {
    Ok(Arc::new(NewsClient::from_config(&config.news)?))
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load()?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn cmd_search(
    query: &str,
    options: SearchOptions,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let session = build_session(&config, options.mock, !options.no_news)?;

    let report = session.search(query).await?;
    if let SearchOutcome::Superseded = report.outcome {
        bail!("Search for \"{}\" was superseded", query.trim());
    }

    let controller = session.controller();
    let snapshot = controller
        .view()
        .await
        .context("Search finished without a tree")?;

    if let Some(path) = &options.svg {
        let mode = options.layout.unwrap_or(config.layout.mode);
        let viewport = Viewport::new(
            options.width.unwrap_or(config.layout.width),
            options.height.unwrap_or(config.layout.height),
        );
        let layout = controller
            .layout(mode, viewport, &config.layout.params())
            .await?
            .context("Search finished without a tree")?;
        output::write_svg(&layout, path)
            .with_context(|| format!("Could not write {}", path.display()))?;
        if !quiet && format == OutputFormat::Text {
            eprintln!("Wrote {} layout to {}", mode, path.display());
        }
    }

    match format {
        OutputFormat::Json => {
            let value = json!({
                "outcome": report.outcome,
                "tree": snapshot,
                "news": report.news,
                "summary": report.summary,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            output::print_tree(&snapshot);
            if quiet {
                return Ok(());
            }
            if !options.no_news {
                println!();
                output::print_news(&report.news);
            }
            println!();
            output::print_summary(report.summary.as_deref());
        }
    }
    Ok(())
}

async fn cmd_explore(
    query: Option<String>,
    mock: bool,
    layout: Option<LayoutMode>,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let session = build_session(&config, mock, true)?;
    let mode = layout.unwrap_or(config.layout.mode);

    Repl::new(session, mode, config.layout.viewport(), config.layout.params())
        .run(query)
        .await
}

async fn cmd_news(query: &str, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let query = query.trim();
    if query.is_empty() {
        bail!("News query must not be empty");
    }

    let config = load_config()?;
    let articles = news_source(&config)?.recent(query).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&articles)?),
        OutputFormat::Text if quiet => {
            for article in &articles {
                println!("{}", article.url);
            }
        }
        OutputFormat::Text => output::print_news(&articles),
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
