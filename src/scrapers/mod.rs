//! Site scrapers.
//!
//! Each scraper follows the same two-phase pattern:
//!
//! 1. **Indexing**: discover item URLs (plus whatever the listing page shows eagerly)
//! 2. **Details**: visit each item and fill in the remaining fields
//!
//! Scrapers are written against the [`crate::browser`] traits, so they run
//! unchanged on the Chromium backend and on the in-memory test backend.
//!
//! # Supported Sites
//!
//! | Site | Module | Entry point |
//! |------|--------|-------------|
//! | TikTok account pages | [`tiktok`] | [`tiktok::scrape_account`] |

pub mod tiktok;
