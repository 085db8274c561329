use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use playlist_proto::config::Config;
use playlist_proto::feed::Snapshot;
use playlist_proto::pipeline::{self, RunOutcome};
use tracing::info;

/// Render the now-playing and latest-songs HTML fragments from the
/// automation system's XML export.
#[derive(Parser, Debug)]
#[command(name = "now-playing", version)]
struct Args {
    /// Directory holding the feed, templates, state files and outputs.
    /// Overrides `paths.work_dir` from the config.
    #[arg(short = 'C', long)]
    work_dir: Option<PathBuf>,

    /// Config file to use instead of ~/.config/playlist/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_path = playlist_proto::platform::log_path();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    // Allow RUST_LOG override.
    let log_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,playlist_proto=debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("now-playing log: {}", log_path.display());

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load()?,
    };
    if let Some(dir) = args.work_dir {
        config.paths.work_dir = dir;
    }
    info!("Working directory: {:?}", config.paths.work_dir);

    match run_once(&config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Run failed: {:#}", e);
            Err(e)
        }
    }
}

async fn run_once(config: &Config) -> anyhow::Result<()> {
    // One clock reading for the whole run.
    let now = chrono::Local::now();
    let snapshot = Snapshot::capture(&config.paths.feed_path(), &config.format.current_time, now)
        .await
        .context("reading now-playing feed")?;

    match pipeline::run(config, &snapshot, now).await? {
        RunOutcome::Unchanged => {
            info!("Done: {} - {} (unchanged)", snapshot.artist, snapshot.title)
        }
        RunOutcome::Changed { plays } => {
            info!("Done: {} - {} ({} plays logged)", snapshot.artist, snapshot.title, plays)
        }
    }
    Ok(())
}
