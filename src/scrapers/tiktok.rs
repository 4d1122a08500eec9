//! TikTok account scraper.
//!
//! Two phases over one browser tab:
//!
//! 1. **Indexing** ([`index_videos`]): load the account grid, dismiss the
//!    consent dialog, scroll until enough tiles exist, then read each tile's
//!    URL, thumbnail and view count.
//! 2. **Details** ([`fetch_details`]): visit every video page and read the
//!    like/comment counts and the caption.
//!
//! Indexing failures abort the scrape. Detail failures only leave the affected
//! record at its defaults.

use crate::browser::{Element, Page, Session};
use crate::config::{ScrapeConfig, TextSource};
use crate::extract::{ThumbnailPolicy, extract_quoted, resolve_thumbnail};
use crate::models::{DEFAULT_COUNT, VideoRecord};
use crate::utils::{collapse_whitespace, truncate_for_log};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::error::Error;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Scrape up to `max_videos` videos from an account page.
///
/// The session is closed on every exit path, including errors.
///
/// # Errors
///
/// Returns an error if the account page cannot be loaded or shows no video
/// links within the configured timeout.
#[instrument(level = "info", skip(session, config, progress))]
pub async fn scrape_account<S: Session>(
    session: S,
    account_url: &str,
    max_videos: usize,
    config: &ScrapeConfig,
    progress: &ProgressBar,
) -> Result<Vec<VideoRecord>, Box<dyn Error>> {
    let t0 = Instant::now();
    let result = collect(session.page(), account_url, max_videos, config, progress).await;
    session.close().await;

    match &result {
        Ok(records) => info!(
            count = records.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Scrape finished"
        ),
        Err(e) => warn!(error = %e, "Scrape aborted"),
    }
    result
}

async fn collect<P: Page>(
    page: &P,
    account_url: &str,
    max_videos: usize,
    config: &ScrapeConfig,
    progress: &ProgressBar,
) -> Result<Vec<VideoRecord>, Box<dyn Error>> {
    let mut records = index_videos(page, account_url, max_videos, config, progress).await?;
    fetch_details(page, &mut records, config, progress).await;
    Ok(records)
}

async fn settle(ms: u64) {
    if ms > 0 {
        sleep(Duration::from_millis(ms)).await;
    }
}

/// Phase 1: collect tile-level data from the account grid.
///
/// `progress` counts tiles here; [`fetch_details`] resets it for the video pages.
#[instrument(level = "info", skip(page, config, progress))]
pub async fn index_videos<P: Page>(
    page: &P,
    account_url: &str,
    max_videos: usize,
    config: &ScrapeConfig,
    progress: &ProgressBar,
) -> Result<Vec<VideoRecord>, Box<dyn Error>> {
    let base = Url::parse(account_url)?;
    let selectors = &config.selectors;

    progress.set_message("loading account page");
    page.goto(account_url).await?;
    let link_selector = selectors.video_link.as_str();
    let ready = config
        .timeouts
        .page_ready()
        .poll(move |_| async move {
            match page.find_all(link_selector).await {
                Ok(links) if !links.is_empty() => Some(()),
                _ => None,
            }
        })
        .await;
    if ready.is_none() {
        return Err(format!(
            "no video links on {account_url} after {}s",
            config.timeouts.page_ready_secs
        )
        .into());
    }
    settle(config.settle.after_account_load_ms).await;

    dismiss_consent(page, config).await;
    progress.set_message("scrolling feed");
    scroll_feed(page, config.scroll.passes_for(max_videos), config.settle.after_scroll_ms).await;

    let tiles = page.find_all(&selectors.video_link).await?;
    progress.suspend(|| info!(tiles = tiles.len(), max_videos, "Video tiles on page"));
    progress.set_position(0);
    progress.set_length(tiles.len().min(max_videos) as u64);
    progress.set_message("indexing tiles");

    let thumb_policy = ThumbnailPolicy {
        settle: Duration::from_millis(config.settle.after_scroll_into_view_ms),
        poll: config.lazy_load.clone(),
    };
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for tile in &tiles {
        if records.len() >= max_videos {
            break;
        }
        let href = match tile.attribute("href").await {
            Ok(Some(href)) if !href.trim().is_empty() => href,
            Ok(_) => {
                debug!("Tile without href; skipping");
                continue;
            }
            Err(e) => {
                progress.suspend(|| warn!(error = %e, "Collect base error; skipping tile"));
                continue;
            }
        };
        let url = match base.join(href.trim()) {
            Ok(url) => url.to_string(),
            Err(e) => {
                progress.suspend(|| warn!(%href, error = %e, "Unresolvable video href; skipping tile"));
                continue;
            }
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let mut record = VideoRecord::new(url);
        record.thumbnail = resolve_thumbnail(tile, &thumb_policy).await;
        record.views = tile_views(tile, &selectors.views).await;
        debug!(url = %record.url, thumbnail = %record.thumbnail, views = %record.views, "Indexed video");
        records.push(record);
        progress.inc(1);
    }

    progress.suspend(|| info!(count = records.len(), "Indexed video URLs"));
    Ok(records)
}

/// Click through the cookie/consent banner if one is showing.
async fn dismiss_consent<P: Page>(page: &P, config: &ScrapeConfig) {
    match page
        .click_button_containing(&config.selectors.consent_labels)
        .await
    {
        Ok(true) => {
            info!("Dismissed consent dialog");
            settle(config.settle.after_consent_ms).await;
        }
        Ok(false) => debug!("No consent dialog"),
        Err(e) => debug!(error = %e, "Consent dismissal failed; continuing"),
    }
}

/// Scroll to the bottom up to `passes` times, stopping once the page stops growing.
async fn scroll_feed<P: Page>(page: &P, passes: usize, settle_ms: u64) {
    let mut last_height = match page.scroll_height().await {
        Ok(h) => h,
        Err(e) => {
            warn!(error = %e, "Could not read page height; skipping scroll");
            return;
        }
    };
    for pass in 1..=passes {
        if let Err(e) = page.scroll_to_bottom().await {
            warn!(pass, error = %e, "Scroll failed");
            break;
        }
        settle(settle_ms).await;
        let height = match page.scroll_height().await {
            Ok(h) => h,
            Err(e) => {
                warn!(pass, error = %e, "Could not read page height");
                break;
            }
        };
        debug!(pass, height, "Scrolled feed");
        if height == last_height {
            break;
        }
        last_height = height;
    }
}

/// View count shown on a tile, falling back to its `aria-label`.
async fn tile_views<E: Element>(tile: &E, selector: &str) -> String {
    if let Ok(found) = tile.find_all(selector).await {
        if let Some(el) = found.first() {
            if let Ok(text) = el.text().await {
                return text.trim().to_string();
            }
        }
    }
    match tile.attribute("aria-label").await {
        Ok(Some(label)) => label.trim().to_string(),
        _ => String::new(),
    }
}

/// Phase 2: visit each video page and fill likes, comments and description.
///
/// Records whose page fails to load keep their defaults.
#[instrument(level = "info", skip_all, fields(count = records.len()))]
pub async fn fetch_details<P: Page>(
    page: &P,
    records: &mut [VideoRecord],
    config: &ScrapeConfig,
    progress: &ProgressBar,
) {
    progress.set_position(0);
    progress.set_length(records.len() as u64);
    let ready_selectors = config.selectors.detail_ready();
    let mut failed = 0usize;

    for record in records.iter_mut() {
        progress.set_message(truncate_for_log(&record.url, 60));
        if let Err(e) = fetch_detail(page, record, config, &ready_selectors).await {
            failed += 1;
            progress.suspend(|| {
                warn!(url = %record.url, error = %e, "Error visiting video; keeping defaults")
            });
        }
        progress.inc(1);
    }

    progress.suspend(|| info!(total = records.len(), failed, "Fetched video details"));
}

#[instrument(level = "debug", skip_all, fields(url = %record.url))]
async fn fetch_detail<P: Page>(
    page: &P,
    record: &mut VideoRecord,
    config: &ScrapeConfig,
    ready_selectors: &[String],
) -> Result<(), Box<dyn Error>> {
    page.goto(&record.url).await?;

    let ready = config
        .timeouts
        .detail_ready()
        .poll(move |_| async move {
            for selector in ready_selectors {
                if let Ok(Some(_)) = page.find_first(selector).await {
                    return Some(());
                }
            }
            None
        })
        .await;
    if ready.is_none() {
        debug!("No detail selector appeared; extracting anyway");
    }
    settle(config.settle.after_detail_load_ms).await;

    let selectors = &config.selectors;
    record.likes = first_text_or_default(page, &selectors.likes, DEFAULT_COUNT).await;
    record.comments = first_text_or_default(page, &selectors.comments, DEFAULT_COUNT).await;
    let raw = first_source_text(page, &selectors.description).await;
    record.description = extract_quoted(&raw);

    debug!(
        url = %record.url,
        likes = %record.likes,
        comments = %record.comments,
        description = %truncate_for_log(&record.description, 60),
        "OK"
    );
    Ok(())
}

/// Whitespace-collapsed text of the first selector with non-empty text.
async fn first_text_or_default<P: Page>(page: &P, selectors: &[String], default: &str) -> String {
    for selector in selectors {
        let Ok(Some(el)) = page.find_first(selector).await else {
            continue;
        };
        if let Ok(text) = el.text().await {
            let text = collapse_whitespace(&text);
            if !text.is_empty() {
                return text;
            }
        }
    }
    default.to_string()
}

/// First non-empty value among `sources`, or an empty string.
async fn first_source_text<P: Page>(page: &P, sources: &[TextSource]) -> String {
    for source in sources {
        let Ok(Some(el)) = page.find_first(&source.selector).await else {
            continue;
        };
        let value = match &source.attribute {
            Some(name) => el.attribute(name).await.ok().flatten().unwrap_or_default(),
            None => el.text().await.unwrap_or_default(),
        };
        let value = value.trim();
        if !value.is_empty() {
            return value.to_string();
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::snapshot::SnapshotSite;
    use crate::config::{ScrapeConfig, SettleDelays, Timeouts};

    const ACCOUNT: &str = "https://www.tiktok.com/@hugodecrypte";
    const STUB: &str = "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

    fn test_config() -> ScrapeConfig {
        let mut config = ScrapeConfig::default();
        config.settle = SettleDelays::none();
        config.timeouts = Timeouts {
            page_ready_secs: 0,
            detail_ready_secs: 0,
            probe_interval_ms: 0,
        };
        config.lazy_load.delay_ms = 0;
        config
    }

    fn tile(id: u32) -> String {
        format!(
            r#"<div class="item" data-thumbnail="https://cdn/{id}-parent.jpeg">
                <a href="/@hugodecrypte/video/{id}" aria-label="Vidéo {id}">
                    <picture><img src="{STUB}" data-src="https://cdn/{id}.jpeg"></picture>
                    <strong data-e2e="video-views">{id}K</strong>
                </a>
            </div>"#
        )
    }

    fn account_page(ids: &[u32]) -> String {
        let tiles: String = ids.iter().map(|id| tile(*id)).collect();
        format!(
            r#"<html><body>
                <div id="consent"><button>Autoriser tous les cookies</button></div>
                <div class="grid">{tiles}</div>
            </body></html>"#
        )
    }

    fn video_url(id: u32) -> String {
        format!("{ACCOUNT}/video/{id}")
    }

    fn video_page(likes: &str, comments: &str, desc: &str) -> String {
        format!(
            r#"<html><head><meta name="description" content="meta fallback"></head><body>
                <strong data-e2e="browse-like-count">{likes}</strong>
                <strong data-e2e="browse-comment-count">{comments}</strong>
                <div data-e2e="browse-video-desc">{desc}</div>
            </body></html>"#
        )
    }

    async fn run(site: SnapshotSite, max: usize) -> Result<Vec<VideoRecord>, Box<dyn Error>> {
        scrape_account(site.session(), ACCOUNT, max, &test_config(), &ProgressBar::hidden()).await
    }

    #[tokio::test]
    async fn test_end_to_end_records() {
        let site = SnapshotSite::new()
            .page(ACCOUNT, &account_page(&[1, 2]))
            .page(&video_url(1), &video_page(" 12.3K ", "456", "Brief : « La réforme en 1 minute » #news"))
            .page(
                &video_url(2),
                r#"<html><head><meta name="description" content="Vidéo TikTok : &quot;Sans quotes&quot;"></head><body></body></html>"#,
            );

        let records = run(site, 10).await.unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.url, video_url(1));
        assert_eq!(first.thumbnail, "https://cdn/1.jpeg");
        assert_eq!(first.views, "1K");
        assert_eq!(first.likes, "12.3K");
        assert_eq!(first.comments, "456");
        assert_eq!(first.description, "La réforme en 1 minute");

        let second = &records[1];
        assert_eq!(second.likes, "0");
        assert_eq!(second.comments, "0");
        assert_eq!(second.description, "Sans quotes");
    }

    #[tokio::test]
    async fn test_cap_limits_records() {
        let ids: Vec<u32> = (1..=12).collect();
        let mut site = SnapshotSite::new().page(ACCOUNT, &account_page(&ids));
        for id in &ids {
            site = site.page(&video_url(*id), &video_page("1", "2", "x"));
        }
        let records = run(site, 5).await.unwrap();
        assert_eq!(records.len(), 5);
        let urls: Vec<_> = records.iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls, (1..=5).map(video_url).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_duplicate_hrefs_collapse() {
        let site = SnapshotSite::new().page(ACCOUNT, &account_page(&[7, 7, 8]));
        let records = run(site, 10).await.unwrap();
        let urls: Vec<_> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec![video_url(7), video_url(8)]);
    }

    #[tokio::test]
    async fn test_failed_video_page_keeps_defaults() {
        // No page registered for video 3: navigation fails, scrape continues.
        let site = SnapshotSite::new()
            .page(ACCOUNT, &account_page(&[3, 4]))
            .page(&video_url(4), &video_page("9", "8", "« ok »"));
        let records = run(site, 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].likes, "0");
        assert_eq!(records[0].comments, "0");
        assert_eq!(records[0].description, "");
        assert_eq!(records[0].thumbnail, "https://cdn/3.jpeg");
        assert_eq!(records[1].likes, "9");
        assert_eq!(records[1].description, "ok");
    }

    #[tokio::test]
    async fn test_missing_links_is_an_error_and_closes_session() {
        let site = SnapshotSite::new().page(ACCOUNT, "<html><body><p>private account</p></body></html>");
        let session = site.session();
        let closed = session.closed_flag();
        let result = scrape_account(session, ACCOUNT, 5, &test_config(), &ProgressBar::hidden()).await;
        assert!(result.is_err());
        assert!(closed.get());
    }

    #[tokio::test]
    async fn test_session_closed_after_success() {
        let site = SnapshotSite::new().page(ACCOUNT, &account_page(&[1]));
        let session = site.session();
        let closed = session.closed_flag();
        scrape_account(session, ACCOUNT, 5, &test_config(), &ProgressBar::hidden())
            .await
            .unwrap();
        assert!(closed.get());
    }

    #[tokio::test]
    async fn test_consent_dismissed_and_pages_visited_in_order() {
        let site = SnapshotSite::new()
            .page(ACCOUNT, &account_page(&[1, 2]))
            .page(&video_url(1), &video_page("1", "1", "a"))
            .page(&video_url(2), &video_page("2", "2", "b"));
        let session = site.session();
        let config = test_config();
        let progress = ProgressBar::hidden();
        let records = index_videos(session.page(), ACCOUNT, 10, &config, &progress)
            .await
            .unwrap();
        assert!(session.page().consent_clicked());
        assert_eq!(progress.length(), Some(2));
        assert_eq!(progress.position(), 2);

        let mut records = records;
        fetch_details(session.page(), &mut records, &config, &progress).await;
        assert_eq!(progress.position(), 2);
        assert_eq!(
            session.page().visits(),
            vec![ACCOUNT.to_string(), video_url(1), video_url(2)]
        );
    }

    #[tokio::test]
    async fn test_views_fall_back_to_aria_label() {
        let html = r#"<html><body>
            <a href="/@x/video/9" aria-label=" 3.4M views "><img src="https://cdn/9.jpeg"></a>
        </body></html>"#;
        let site = SnapshotSite::new().page(ACCOUNT, html);
        let records = run(site, 1).await.unwrap();
        assert_eq!(records[0].views, "3.4M views");
        assert_eq!(records[0].url, "https://www.tiktok.com/@x/video/9");
    }

    #[tokio::test]
    async fn test_meta_description_used_when_no_caption_element() {
        let site = SnapshotSite::new()
            .page(ACCOUNT, &account_page(&[5]))
            .page(
                &video_url(5),
                r#"<html><head><meta name="description" content="  plain meta text "></head><body>
                    <strong class="like-count">77</strong>
                </body></html>"#,
            );
        let records = run(site, 1).await.unwrap();
        assert_eq!(records[0].likes, "77");
        assert_eq!(records[0].description, "plain meta text");
    }
}
