//! # tiktok_scrape
//!
//! Collects video metadata from a TikTok account page with a headless
//! Chromium and exports it as CSV.
//!
//! ## Features
//!
//! - Scrolls the account grid and collects up to N video URLs
//! - Resolves lazy-loaded thumbnails (srcset scoring, placeholder rejection)
//! - Visits each video for like/comment counts and the quoted caption
//! - Writes `URL,Thumbnail,Views,Likes,Comments,Description` rows to CSV
//! - Optional interactive form, table preview, and CSV copy
//!
//! ## Usage
//!
//! ```sh
//! tiktok_scrape -u https://www.tiktok.com/@hugodecrypte -n 20
//! tiktok_scrape --interactive
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: load the account page, scroll, read tiles
//! 2. **Details**: visit each video page for counts and caption
//! 3. **Output**: write the CSV, print a preview, optionally save a copy

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cli;
mod config;
mod extract;
mod form;
mod models;
mod outputs;
mod retry;
mod scrapers;
mod utils;

use browser::chrome::ChromeSession;
use cli::Cli;
use config::{ScrapeConfig, load_config};
use form::{FormInput, Prompter};
use outputs::{csv, preview};
use utils::ensure_writable_dir;

fn progress_bar() -> Result<ProgressBar, Box<dyn Error>> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} videos {msg}")?
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(250));
    Ok(pb)
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("tiktok_scrape starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => load_config(path).await?,
        None => ScrapeConfig::default(),
    };
    if args.headed {
        config.headless = false;
    }

    // ---- Form ----
    let mut prompter = args.interactive.then(Prompter::stdio);
    let defaults = FormInput {
        url: args.url.clone(),
        count: args.count,
    };
    let input = match prompter.as_mut() {
        Some(prompter) => match prompter.scrape_form(defaults).await? {
            Some(input) => input,
            None => {
                info!("Scrape cancelled at the prompt");
                return Ok(());
            }
        },
        None => defaults,
    };
    info!(url = %input.url, count = input.count, "Scrape requested");

    // Early check: output directory must be writable before the slow part.
    let output_path = Path::new(&args.output);
    if let Some(dir) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Scrape ----
    let session = ChromeSession::launch(&config).await?;
    let progress = progress_bar()?;
    let records = scrapers::tiktok::scrape_account(
        session,
        &input.url,
        input.count as usize,
        &config,
        &progress,
    )
    .await;
    progress.finish_and_clear();
    let records = records?;

    // ---- Output ----
    let bytes = csv::write_records(output_path, &records).await?;
    info!(path = %output_path.display(), rows = records.len(), "CSV saved");

    let table = preview::render_table(&records, args.preview_rows);
    match prompter.as_mut() {
        Some(prompter) => {
            prompter.show(&table).await?;
            prompter
                .show(&format!("CSV saved to: {}", output_path.display()))
                .await?;
            if let Some(target) = prompter.download_target().await? {
                save_copy(Path::new(&target), &bytes).await;
            }
        }
        None => {
            println!("{table}");
            println!("CSV saved to: {}", output_path.display());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        videos = records.len(),
        "Execution complete"
    );

    Ok(())
}

/// Write the export bytes to a second, user-chosen path.
#[instrument(level = "info", skip(bytes), fields(path = %target.display()))]
async fn save_copy(target: &Path, bytes: &[u8]) {
    match csv::write_bytes(target, bytes).await {
        Ok(()) => info!("Saved CSV copy"),
        Err(e) => error!(error = %e, "Failed to save CSV copy"),
    }
}
