//! songset command-line driver.

mod args;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use songset_dataset::{
    catalog_stats, download_catalog, fetch_playlists, link_catalog, prune_catalog, YtDlpDownloader,
};
use songset_media::{trim_file, trim_tree, TrimJobConfig};
use songset_sources::{SpotifyClient, YoutubeClient};

use crate::args::{clip_window, link_config, Cli, Command, TrimArgs};

fn init_tracing() -> Result<()> {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("songset=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let csv = cli.csv.as_path();

    match cli.command {
        Command::Fetch { playlists } => {
            let client = SpotifyClient::from_env().context("Failed to create Spotify client")?;
            let summary = fetch_playlists(&client, &playlists, csv).await?;
            info!(
                fetched = summary.playlists_fetched,
                failed = summary.playlists_failed,
                tracks = summary.tracks_fetched,
                added = summary.tracks_added,
                "Fetch complete"
            );
        }
        Command::Link {
            recheck_limit,
            min_views,
            delay_ms,
        } => {
            let client = YoutubeClient::from_env().context("Failed to create YouTube client")?;
            let config = link_config(recheck_limit, min_views, delay_ms);
            link_catalog(&client, csv, &config)
                .await
                .with_context(|| format!("Link step failed for {}", csv.display()))?;
        }
        Command::Prune {
            clips_dir,
            min_views,
        } => {
            prune_catalog(csv, &clips_dir, min_views)
                .with_context(|| format!("Prune step failed for {}", csv.display()))?;
        }
        Command::Download {
            clips_dir,
            start,
            end,
        } => {
            let window = clip_window(start, end)?;
            download_catalog(&YtDlpDownloader, csv, &clips_dir, window)
                .await
                .with_context(|| format!("Download step failed for {}", csv.display()))?;
        }
        Command::Trim(args) => run_trim(&args).await?,
        Command::Stats { bottom } => {
            let stats = catalog_stats(csv, bottom)
                .with_context(|| format!("Failed to read {}", csv.display()))?;
            print!("{}", stats);
        }
    }

    Ok(())
}

async fn run_trim(args: &TrimArgs) -> Result<()> {
    let config = args.job_config().context("Invalid trim settings")?;

    if let Some(file) = &args.file {
        trim_one(file, &config).await
    } else if let Some(root) = &args.root {
        let summary = trim_tree(root, &config).await?;
        info!(
            total = summary.total(),
            trimmed = summary.trimmed,
            unchanged = summary.unchanged,
            placeholders = summary.placeholders,
            deleted = summary.deleted,
            skipped = summary.skipped,
            failed = summary.failures.len(),
            "Trim complete"
        );
        for (path, reason) in &summary.failures {
            warn!(path = %path.display(), "{}", reason);
        }
        Ok(())
    } else {
        anyhow::bail!("either --file or --root is required")
    }
}

async fn trim_one(file: &Path, config: &TrimJobConfig) -> Result<()> {
    let report = trim_file(file, config)
        .await
        .with_context(|| format!("Failed to trim {}", file.display()))?;
    if let Some(output) = &report.output {
        info!(output = %output.display(), "Wrote {}", report.outcome);
    }
    Ok(())
}
