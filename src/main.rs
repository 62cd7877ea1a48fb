mod config;
mod models;
mod notifier;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;
use crate::notifier::sink_from_config;
use crate::pipeline::Watcher;
use crate::scraper::CatalogScraper;
use crate::storage::SeenLinks;

#[derive(Parser)]
#[command(name = "course-watcher", about = "Free course finder and notifier", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Check now, then every schedule interval until Ctrl-C (default)
    Run,

    /// Run a single check-and-notify cycle
    Once,

    /// Scrape and print listings as JSON; sends nothing, records nothing
    Scrape {
        /// Catalog URLs to scrape instead of the configured targets
        urls: Vec<String>,
    },

    /// Show how many links have already been announced
    Seen,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "course_watcher=info,warn",
        1 => "course_watcher=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let watcher = build_watcher(&config)?;
            watcher.run_forever(config.schedule.interval()).await?;
        }

        Command::Once => {
            let stats = build_watcher(&config)?.check_and_notify().await;
            info!("Done: {}", stats);
        }

        Command::Scrape { urls } => {
            let _t = utils::Timer::start("Scrape");
            let targets = if urls.is_empty() { config.scraper.targets.clone() } else { urls };
            let listings = CatalogScraper::new(&config.scraper)?.scrape_all(&targets).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&listings).context("Failed to serialise listings")?
            );
        }

        Command::Seen => {
            let store = SeenLinks::open(&config.storage.seen_path);
            if store.is_empty() {
                println!("No links recorded yet in {:?}", config.storage.seen_path);
            } else {
                println!("{} links recorded in {:?}", store.len(), config.storage.seen_path);
            }
        }
    }

    Ok(())
}

fn build_watcher(config: &AppConfig) -> Result<Watcher> {
    let scraper = CatalogScraper::new(&config.scraper)?;
    let watcher = Watcher::new(
        scraper,
        SeenLinks::open(&config.storage.seen_path),
        sink_from_config(&config.telegram)?,
        config.scraper.targets.clone(),
    );
    info!("{} links already announced", watcher.seen().len());
    Ok(watcher)
}
