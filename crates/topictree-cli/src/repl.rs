//! Interactive explore loop

use std::path::PathBuf;

use anyhow::{anyhow, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use topictree_core::expansion::SearchOutcome;
use topictree_core::layout::{LayoutMode, LayoutParams, Viewport};
use topictree_core::session::SearchSession;
use topictree_core::tree::NodeId;

use crate::output;

const PROMPT: &str = "topictree> ";

const HELP: &str = "\
Commands:
  search <query>        Start a new tree for <query>
  open <id>             Expand, collapse or re-expand a node
  ask <id> <question>   Replace a node's children with the answer to <question>
  back                  Return to the previous expansion point
  show                  Print the current view
  tree                  Print the whole tree
  layout <mode>         Switch layout (horizontal or radial)
  svg <path>            Write the current view as SVG
  news <query>          Look up recent news
  help                  Show this help
  quit                  Leave";

/// A parsed REPL line
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Empty,
    Search(String),
    Open(NodeId),
    Ask(NodeId, String),
    Back,
    Show,
    Tree,
    Layout(LayoutMode),
    Svg(PathBuf),
    News(String),
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> anyhow::Result<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "search" | "s" => ReplCommand::Search(required(rest, "search <query>")?.to_string()),
        "open" | "o" | "expand" => ReplCommand::Open(NodeId::new(required(rest, "open <id>")?)),
        "ask" | "a" => {
            let usage = "ask <id> <question>";
            let (id, question) = required(rest, usage)?
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("Usage: {}", usage))?;
            ReplCommand::Ask(NodeId::new(id), required(question.trim(), usage)?.to_string())
        }
        "back" | "b" => ReplCommand::Back,
        "show" | "view" => ReplCommand::Show,
        "tree" => ReplCommand::Tree,
        "layout" => ReplCommand::Layout(required(rest, "layout <horizontal|radial>")?.parse()?),
        "svg" => ReplCommand::Svg(PathBuf::from(required(rest, "svg <path>")?)),
        "news" => ReplCommand::News(required(rest, "news <query>")?.to_string()),
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => bail!("Unknown command: {}. Type `help` for a list of commands.", other),
    };
    Ok(command)
}

fn required<'a>(arg: &'a str, usage: &str) -> anyhow::Result<&'a str> {
    if arg.is_empty() {
        bail!("Usage: {}", usage);
    }
    Ok(arg)
}

/// REPL state: the search session plus display settings
pub struct Repl {
    session: SearchSession,
    mode: LayoutMode,
    viewport: Viewport,
    params: LayoutParams,
}

impl Repl {
    pub fn new(
        session: SearchSession,
        mode: LayoutMode,
        viewport: Viewport,
        params: LayoutParams,
    ) -> Self {
        Self {
            session,
            mode,
            viewport,
            params,
        }
    }

    pub async fn run(mut self, initial: Option<String>) -> anyhow::Result<()> {
        let mut editor = DefaultEditor::new()?;

        println!("Type `help` for commands, `quit` to leave.");
        if let Some(query) = initial {
            self.report(ReplCommand::Search(query)).await;
        }

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    match parse_command(&line) {
                        Ok(ReplCommand::Quit) => break,
                        Ok(command) => self.report(command).await,
                        Err(e) => eprintln!("{}", e),
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn report(&mut self, command: ReplCommand) {
        if let Err(e) = self.execute(command).await {
            eprintln!("Error: {}", e);
        }
    }

    async fn execute(&mut self, command: ReplCommand) -> anyhow::Result<()> {
        let controller = self.session.controller();
        match command {
            ReplCommand::Empty | ReplCommand::Quit => {}
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Search(query) => {
                let report = self.session.search(&query).await?;
                if let SearchOutcome::Superseded = report.outcome {
                    println!("Search for \"{}\" was superseded", query);
                    return Ok(());
                }
                self.show().await?;
                println!();
                output::print_news(&report.news);
                println!();
                output::print_summary(report.summary.as_deref());
            }
            ReplCommand::Open(id) => {
                let activation = controller.activate(&id).await?;
                println!("{}", output::describe_activation(&id, &activation));
                if activation.is_mutation() {
                    self.show().await?;
                }
            }
            ReplCommand::Ask(id, question) => {
                let report = self.session.ask(&id, &question).await?;
                println!("{}", output::describe_activation(&id, &report.activation));
                if report.activation.is_mutation() {
                    self.show().await?;
                }
                println!();
                output::print_summary(report.summary.as_deref());
            }
            ReplCommand::Back => match controller.back().await {
                Some(anchor) => {
                    println!("Back to {}", anchor);
                    self.show().await?;
                }
                None => println!("Already at the first expansion point"),
            },
            ReplCommand::Show => self.show().await?,
            ReplCommand::Tree => {
                let snapshot = controller.tree().await.ok_or_else(no_search)?;
                output::print_tree(&snapshot);
            }
            ReplCommand::Layout(mode) => {
                self.mode = mode;
                println!("Layout set to {}", mode);
            }
            ReplCommand::Svg(path) => {
                let layout = controller
                    .layout(self.mode, self.viewport, &self.params)
                    .await?
                    .ok_or_else(no_search)?;
                output::write_svg(&layout, &path)?;
                println!("Wrote {} layout to {}", self.mode, path.display());
            }
            ReplCommand::News(query) => {
                let articles = self.session.news(&query).await;
                output::print_news(&articles);
            }
        }
        Ok(())
    }

    async fn show(&self) -> anyhow::Result<()> {
        let snapshot = self
            .session
            .controller()
            .view()
            .await
            .ok_or_else(no_search)?;
        output::print_tree(&snapshot);
        Ok(())
    }
}

fn no_search() -> anyhow::Error {
    anyhow!("No tree yet. Start with `search <query>`.")
}
