use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use clap::Args;
use time::format_description::well_known::Rfc3339;

use super::Commands;
use crate::app::{ActionDispatcher, App, Command, CommandOutcome};
use crate::config::AppConfig;
use crate::list::{DeleteOutcome, ShoppingList, SubmitOutcome};
use crate::storage::KeyValueStore;

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Item text; multiple words are joined with spaces
    #[arg(required = true)]
    pub text: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only show items containing this text (case-insensitive)
    #[arg(long, short)]
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    /// Exact item text (whitespace trimmed)
    pub text: String,
}

pub fn execute<S: KeyValueStore>(
    command: Commands,
    config: &AppConfig,
    mut list: ShoppingList<S>,
) -> Result<()> {
    let output = match command {
        Commands::Tui => return run_tui(config, list),
        Commands::Add(args) => add_item(&mut list, &args)?,
        Commands::List(args) => list_items(&mut list, &args)?,
        Commands::Remove(args) => remove_item(&mut list, &args)?,
        Commands::Clear => clear_items(&mut list)?,
        Commands::Export => export_items(&list)?,
    };
    print!("{output}");
    Ok(())
}

pub fn run_tui<S: KeyValueStore>(config: &AppConfig, list: ShoppingList<S>) -> Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        bail!("the interactive list needs a terminal; try `shoplist list`");
    }
    let mut app = App::new(config, list);
    app.run()
}

fn add_item<S: KeyValueStore>(list: &mut ShoppingList<S>, args: &AddArgs) -> Result<String> {
    let raw = args.text.join(" ");
    let outcome = ActionDispatcher::new(list).dispatch(Command::Submit(Some(raw)))?;
    match outcome {
        CommandOutcome::Submitted(SubmitOutcome::Added { text, duplicate }) => {
            let mut out = format!("Added '{text}'");
            if duplicate {
                out.push_str(" (already on the list)");
            }
            out.push('\n');
            Ok(out)
        }
        CommandOutcome::Submitted(SubmitOutcome::Rejected) => bail!("item text cannot be empty"),
        other => bail!("unexpected outcome {other:?}"),
    }
}

fn list_items<S: KeyValueStore>(list: &mut ShoppingList<S>, args: &ListArgs) -> Result<String> {
    if list.is_empty() {
        return Ok("Your list is empty.\n".to_string());
    }
    if let Some(query) = &args.filter {
        ActionDispatcher::new(list).dispatch(Command::FilterChanged(query.clone()))?;
    }
    let visible = list.visible_indices();
    if visible.is_empty() {
        return Ok(format!("No items match '{}'.\n", list.filter().as_str()));
    }

    let mut out = String::new();
    for (position, idx) in visible.iter().enumerate() {
        let _ = writeln!(&mut out, "{:>3}. {}", position + 1, list.entries()[*idx].text());
    }
    let repo = list.repository();
    if let Some(saved) = repo
        .store()
        .entry_updated_at(repo.key())
        .context("reading list timestamp")?
    {
        if let Ok(stamp) = saved.format(&Rfc3339) {
            let _ = writeln!(&mut out, "(saved {stamp})");
        }
    }
    Ok(out)
}

fn remove_item<S: KeyValueStore>(list: &mut ShoppingList<S>, args: &RemoveArgs) -> Result<String> {
    let text = args.text.trim();
    match ActionDispatcher::new(list).remove_text(text)? {
        Some(DeleteOutcome::Removed { text }) => Ok(format!("Removed '{text}'\n")),
        _ => bail!("'{text}' is not on the list"),
    }
}

fn clear_items<S: KeyValueStore>(list: &mut ShoppingList<S>) -> Result<String> {
    let count = list.len();
    ActionDispatcher::new(list).dispatch(Command::ClearAll)?;
    Ok(format!("Cleared {count} item(s)\n"))
}

fn export_items<S: KeyValueStore>(list: &ShoppingList<S>) -> Result<String> {
    let raw = list
        .repository()
        .raw()
        .context("reading stored list")?
        .unwrap_or_else(|| "[]".to_string());
    Ok(format!("{raw}\n"))
}
