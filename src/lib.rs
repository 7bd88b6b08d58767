pub mod config;
pub mod dates;
pub mod keywords;
pub mod models;
pub mod scraping;
pub mod store;
pub mod sync;
mod utils;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{AppConfig, RunOptions, StoreBackend};
use models::Event;
use scraping::base::{HttpFetcher, PageFetcher};
use scraping::curtin_html::CurtinEvents;
use scraping::EventSource;
use store::{NotionStore, RecordStore, SqliteStore};
use sync::SyncEngine;

#[derive(Debug, Parser)]
#[command(name = "free-food-sync")]
#[command(about = "Find campus events offering free food and sync them into Notion")]
struct Cli {
    /// Scrape and print matching events without touching any store.
    #[arg(long)]
    dry_run: bool,

    /// Sync into a local SQLite file instead of Notion.
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    local_db: Option<Option<PathBuf>>,

    /// Do not archive past events before adding new ones.
    #[arg(long)]
    skip_sweep: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            local_db: self.local_db.clone(),
            skip_sweep: self.skip_sweep,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub archived: usize,
    pub scraped: usize,
    pub added: usize,
    pub skipped: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done! {} free food event(s) found: {} added, {} already present, {} past event(s) archived.",
            self.scraped, self.added, self.skipped, self.archived
        )
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(&cli.options()) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("run failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// One complete run: sweep, scrape, create.
pub fn execute(options: &RunOptions) -> Result<RunSummary> {
    let config = config::load_app_config(options).context("configuration")?;

    match &config.backend {
        StoreBackend::DryRun => dry_run(&config),
        StoreBackend::Notion(settings) => {
            let store = NotionStore::new(settings.clone()).context("notion client")?;
            sync_with(store, &listing_fetcher(&config)?, &config)
        }
        StoreBackend::Sqlite(path) => {
            let store = match path {
                Some(path) => SqliteStore::open(path),
                None => SqliteStore::open_default(),
            }
            .context("opening local store")?;
            sync_with(store, &listing_fetcher(&config)?, &config)
        }
    }
}

fn listing_fetcher(config: &AppConfig) -> Result<HttpFetcher> {
    HttpFetcher::new(&config.user_agent, config.timeout, config.verify_tls)
}

fn scrape<F: PageFetcher>(fetcher: &F, config: &AppConfig) -> Result<Vec<Event>> {
    let source = CurtinEvents::new(config.origin.as_str());
    tracing::info!("Scraping events from {}...", source.origin());
    scraping::harvest(&source, fetcher, &config.classifier, config.max_pages)
}

fn dry_run(config: &AppConfig) -> Result<RunSummary> {
    let events = scrape(&listing_fetcher(config)?, config)?;
    for event in &events {
        let date = dates::normalize_date(&event.raw_date).unwrap_or_else(|| "no date".to_string());
        println!("{} [{}] {} <{}>", event.title, date, event.location, event.url);
    }
    Ok(RunSummary {
        scraped: events.len(),
        ..RunSummary::default()
    })
}

/// Sweep first, then scrape and create. The order matters: a record that
/// has just passed is archived before a same-titled event is checked.
fn sync_with<S: RecordStore, F: PageFetcher>(
    store: S,
    fetcher: &F,
    config: &AppConfig,
) -> Result<RunSummary> {
    let mut engine = SyncEngine::new(
        store,
        sync::today_in(config.timezone),
        config.timezone,
    );

    let archived = if config.skip_sweep {
        0
    } else {
        tracing::info!("Checking for past events to remove...");
        engine.sweep_past().context("archiving past events")?
    };

    let events = scrape(fetcher, config)?;
    if events.is_empty() {
        tracing::info!("No free food events found.");
    } else {
        tracing::info!(
            "Found {} event(s) with free food. Adding to the store...",
            events.len()
        );
    }

    let created = engine
        .create_missing(&events)
        .context("adding new events")?;

    Ok(RunSummary {
        archived,
        scraped: events.len(),
        added: created.added,
        skipped: created.skipped,
    })
}
