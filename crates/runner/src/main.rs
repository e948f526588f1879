//! Dinex terminal
//!
//! Usage:
//!   cargo run -p dinex-runner -- --config market.json --data store.json
//!
//! Without `--data` the market lives in memory and is gone on exit.

use anyhow::{Context, Result};
use clap::Parser;
use dinex_clock::SystemClock;
use dinex_exchange::{InMemoryRepository, JsonFileRepository, MarketConfig, MatchingEngine};
use dinex_ports::MarketRepository;
use dinex_runner::{Outcome, Session};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Meal share exchange for a closed group of friends")]
struct Args {
    /// Market configuration file (JSON); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON store that keeps the market between runs
    #[arg(short, long)]
    data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MarketConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MarketConfig::default(),
    };

    let repository: Arc<dyn MarketRepository> = match &args.data {
        Some(path) => {
            info!("Using store {}", path.display());
            Arc::new(
                JsonFileRepository::open(path)
                    .await
                    .with_context(|| format!("opening store {}", path.display()))?,
            )
        }
        None => Arc::new(InMemoryRepository::new()),
    };

    let engine = MatchingEngine::bootstrap(config, repository, Arc::new(SystemClock::new()))
        .await
        .context("starting the market")?;
    let mut session = Session::new(Arc::new(engine));

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout.write_all(b"Welcome to the meal exchange. Type 'help' for commands.\n").await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match session.handle_line(&line).await? {
            Outcome::Print(text) if text.is_empty() => {}
            Outcome::Print(text) => {
                stdout.write_all(text.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Outcome::Quit => break,
        }
    }

    info!("Session closed");
    Ok(())
}
