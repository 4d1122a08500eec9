//! Command-line interface definitions for tiktok_scrape.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The account URL can also come from the environment.

use clap::Parser;

/// Smallest accepted video count.
pub const MIN_COUNT: u32 = 1;
/// Largest accepted video count.
pub const MAX_COUNT: u32 = 200;

/// Default account scraped when no URL is given.
pub const DEFAULT_ACCOUNT_URL: &str = "https://www.tiktok.com/@hugodecrypte";

/// Command-line arguments for tiktok_scrape.
///
/// # Examples
///
/// ```sh
/// # Scrape the default account's 50 latest videos
/// tiktok_scrape
///
/// # Pick the account and count, write elsewhere
/// tiktok_scrape -u https://www.tiktok.com/@someone -n 20 -o ./someone.csv
///
/// # Fill in the values from a prompt
/// tiktok_scrape --interactive
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// TikTok account page URL
    #[arg(short, long, env = "TIKTOK_ACCOUNT_URL", default_value = DEFAULT_ACCOUNT_URL)]
    pub url: String,

    /// Number of videos to scrape (1-200)
    #[arg(short = 'n', long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(MIN_COUNT as i64..=MAX_COUNT as i64))]
    pub count: u32,

    /// CSV file to write
    #[arg(short, long, default_value = crate::outputs::csv::DEFAULT_OUTPUT_PATH)]
    pub output: String,

    /// Optional path to a YAML scrape configuration
    #[arg(short, long)]
    pub config: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Prompt for the URL and count, then offer to save a copy of the CSV
    #[arg(short, long)]
    pub interactive: bool,

    /// Number of rows shown in the terminal preview
    #[arg(long, default_value_t = 10)]
    pub preview_rows: usize,
}

/// Parse and range-check a video count typed by the user.
pub fn parse_count(raw: &str) -> Result<u32, String> {
    let count: u32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", raw.trim()))?;
    if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
        return Err(format!(
            "{count} is out of range ({MIN_COUNT}-{MAX_COUNT})"
        ));
    }
    Ok(count)
}
