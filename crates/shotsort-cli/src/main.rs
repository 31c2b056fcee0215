//! shotsort CLI: sort screenshots into dated, per-month folders
//!
//! Commands: watch (default), sweep, status, completions

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use serde::Serialize;
use tracing::Level;

use shotsort_core::{Config, CounterStore, Organizer};
use shotsort_watch::ScreenshotWatcher;

#[derive(Parser)]
#[command(name = "shotsort")]
#[command(version)]
#[command(about = "Sort screenshots into dated, per-month folders")]
struct Cli {
    /// Directory to sort (default: <Pictures>/Screenshots)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log skipped files as well as moves
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sort existing screenshots, then watch for new ones until Ctrl-C
    Watch,
    /// Sort existing screenshots once and exit
    Sweep,
    /// Show per-day counters
    Status,
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Serialize)]
struct StatusReport {
    root: PathBuf,
    counter_file: PathBuf,
    counters: BTreeMap<String, u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "shotsort", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Status) => status(&resolve_config(&cli)?),
        Some(Commands::Sweep) => sweep(existing_root(resolve_config(&cli)?)?),
        Some(Commands::Watch) | None => watch(existing_root(resolve_config(&cli)?)?).await,
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(root) = &cli.root {
        config.root.clone_from(root);
    }
    Ok(config)
}

/// Canonicalize the root so it compares equal to watcher event paths.
fn existing_root(mut config: Config) -> anyhow::Result<Config> {
    config.root = config
        .root
        .canonicalize()
        .with_context(|| format!("screenshot folder {} not found", config.root.display()))?;
    Ok(config)
}

fn status(config: &Config) -> anyhow::Result<()> {
    let store = CounterStore::load(&config.counter_path())?;
    let report = StatusReport {
        root: config.root.clone(),
        counter_file: store.path().to_path_buf(),
        counters: store.iter().map(|(d, n)| (d.to_string(), n)).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn sweep(config: Config) -> anyhow::Result<()> {
    let mut organizer = Organizer::open(config)?;
    let report = organizer.sweep()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn watch(config: Config) -> anyhow::Result<()> {
    let mut organizer = Organizer::open(config)?;
    let root = organizer.config().root.clone();

    println!("Sorting existing screenshots in {}...", root.display());
    let report = organizer.sweep()?;
    println!(
        "Existing screenshots sorted ({} moved, {} skipped).",
        report.moved.len(),
        report.skipped
    );

    let watcher = ScreenshotWatcher::start(&root, &organizer.config().extension)?;
    println!("Watching {} for new screenshots (Ctrl-C to stop)...", root.display());

    let stop = Arc::new(AtomicBool::new(false));
    let mut task = tokio::task::spawn_blocking({
        let stop = Arc::clone(&stop);
        move || shotsort_watch::pump(&watcher, &mut organizer, &stop)
    });

    let moved = tokio::select! {
        result = &mut task => result??,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            stop.store(true, Ordering::Relaxed);
            task.await??
        }
    };

    println!("Stopped watching {} ({moved} moved).", root.display());
    Ok(())
}
