use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::list::ShoppingList;
use crate::storage::{self, ItemRepository, KeyValueStore, MemoryStore};

pub mod commands;

use self::commands::{AddArgs, ListArgs, RemoveArgs};

#[derive(Parser, Debug)]
#[command(
    name = "shoplist",
    version,
    about = "Keyboard-first terminal shopping list"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over SHOPLIST_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over SHOPLIST_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Keep the list in memory for this run only
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Add an item to the list
    Add(AddArgs),
    /// Print the list, optionally filtered
    List(ListArgs),
    /// Remove the first item with the given text
    Remove(RemoveArgs),
    /// Remove every item
    Clear,
    /// Print the stored list exactly as persisted
    Export,
}

enum LogTarget {
    Stderr,
    File(PathBuf),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let command = cli.command.unwrap_or(Commands::Tui);
    // the TUI owns the terminal, so its logs go to a file
    let log_target = match command {
        Commands::Tui => LogTarget::File(paths.log_file()),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, log_target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;

    if cli.ephemeral {
        tracing::info!("running with an in-memory list");
        let list = open_list(MemoryStore::default(), &config)?;
        commands::execute(command, &config, list)
    } else {
        let storage = storage::init(&config.storage)?;
        tracing::info!(path = %storage.database_path().display(), "using list store");
        let list = open_list(storage, &config)?;
        commands::execute(command, &config, list)
    }
}

fn open_list<S: KeyValueStore>(store: S, config: &AppConfig) -> Result<ShoppingList<S>> {
    let repo = ItemRepository::new(store, config.storage.entry_key.clone());
    ShoppingList::bootstrap(repo, config.list.clone()).context("loading stored list")
}

fn init_tracing(level: &str, target: LogTarget) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| -> Result<()> {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = fmt()
            .with_env_filter(env_filter)
            .with_timer(UtcTime::rfc_3339());
        match target {
            LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
            LogTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                builder.with_ansi(false).with_writer(Mutex::new(file)).init();
            }
        }
        Ok(())
    })
    .map(|_| ())
}
