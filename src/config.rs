//! Scrape configuration loaded from an optional YAML file.
//!
//! Every field has a default, so a config file only needs to name the values
//! it overrides:
//!
//! ```yaml
//! headless: false
//! timeouts:
//!   page_ready_secs: 20
//! selectors:
//!   likes:
//!     - 'strong[data-e2e="like-count"]'
//! ```

use crate::retry::Backoff;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

/// Desktop Chrome user agent sent by the headless browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Top-level scrape configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub user_agent: String,
    pub headless: bool,
    pub timeouts: Timeouts,
    pub settle: SettleDelays,
    pub scroll: ScrollPolicy,
    pub lazy_load: PollPolicy,
    pub selectors: Selectors,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headless: true,
            timeouts: Timeouts::default(),
            settle: SettleDelays::default(),
            scroll: ScrollPolicy::default(),
            lazy_load: PollPolicy::default(),
            selectors: Selectors::default(),
        }
    }
}

/// Bounded waits for page content.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Timeouts {
    /// How long to wait for the first video link on the account page.
    pub page_ready_secs: u64,
    /// How long to wait for any detail selector on a video page.
    pub detail_ready_secs: u64,
    /// Interval between selector probes during those waits.
    pub probe_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_ready_secs: 12,
            detail_ready_secs: 12,
            probe_interval_ms: 500,
        }
    }
}

impl Timeouts {
    pub fn page_ready(&self) -> Backoff {
        Backoff::within(
            Duration::from_secs(self.page_ready_secs),
            Duration::from_millis(self.probe_interval_ms),
        )
    }

    pub fn detail_ready(&self) -> Backoff {
        Backoff::within(
            Duration::from_secs(self.detail_ready_secs),
            Duration::from_millis(self.probe_interval_ms),
        )
    }
}

/// Fixed sleeps that let client-side rendering catch up.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SettleDelays {
    pub after_account_load_ms: u64,
    pub after_consent_ms: u64,
    pub after_scroll_ms: u64,
    pub after_detail_load_ms: u64,
    pub after_scroll_into_view_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_account_load_ms: 2000,
            after_consent_ms: 1000,
            after_scroll_ms: 2000,
            after_detail_load_ms: 1200,
            after_scroll_into_view_ms: 350,
        }
    }
}

impl SettleDelays {
    /// Zero every delay. Used by tests driving the in-memory backend.
    pub fn none() -> Self {
        Self {
            after_account_load_ms: 0,
            after_consent_ms: 0,
            after_scroll_ms: 0,
            after_detail_load_ms: 0,
            after_scroll_into_view_ms: 0,
        }
    }
}

/// How many times the account page is scrolled to load more videos.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollPolicy {
    pub min_passes: usize,
    /// Roughly how many videos one scroll reveals.
    pub videos_per_pass: usize,
    pub extra_passes: usize,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            min_passes: 6,
            videos_per_pass: 12,
            extra_passes: 2,
        }
    }
}

impl ScrollPolicy {
    /// Number of scroll passes needed to surface `wanted` videos.
    pub fn passes_for(&self, wanted: usize) -> usize {
        let per_pass = self.videos_per_pass.max(1);
        self.min_passes.max(wanted / per_pass + self.extra_passes)
    }
}

/// Poll used while a lazy-loaded thumbnail swaps in.
///
/// Fixed interval by default; `growth` above 1 turns it into a capped
/// exponential backoff.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollPolicy {
    pub attempts: usize,
    pub delay_ms: u64,
    pub growth: u32,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 8,
            delay_ms: 250,
            growth: 1,
            max_delay_ms: 1000,
            jitter_ms: 0,
        }
    }
}

impl PollPolicy {
    pub fn backoff(&self) -> Backoff {
        let base = Duration::from_millis(self.delay_ms);
        if self.growth <= 1 && self.jitter_ms == 0 {
            return Backoff::fixed(self.attempts, base);
        }
        Backoff {
            max_attempts: self.attempts,
            base_delay: base,
            multiplier: self.growth.max(1),
            max_delay: base.max(Duration::from_millis(self.max_delay_ms)),
            jitter: Duration::from_millis(self.jitter_ms),
        }
    }
}

/// A place to read a text field from: an element's text, or one of its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TextSource {
    pub selector: String,
    /// Read this attribute instead of the element text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl TextSource {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: None,
        }
    }

    pub fn attribute(selector: &str, attribute: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: Some(attribute.to_string()),
        }
    }
}

/// CSS selectors, in priority order where a list is given.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Selectors {
    pub video_link: String,
    pub views: String,
    pub likes: Vec<String>,
    pub comments: Vec<String>,
    pub description: Vec<TextSource>,
    /// Substrings identifying the consent dialog's accept button.
    pub consent_labels: Vec<String>,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            video_link: r#"a[href*="/video/"]"#.to_string(),
            views: r#"strong[data-e2e*="views"], span[data-e2e*="views"]"#.to_string(),
            likes: vec![
                r#"strong[data-e2e="browse-like-count"]"#.to_string(),
                r#"strong[data-e2e*="like"]"#.to_string(),
                r#"strong[class*="like"]"#.to_string(),
            ],
            comments: vec![
                r#"strong[data-e2e="browse-comment-count"]"#.to_string(),
                r#"strong[data-e2e*="comment"]"#.to_string(),
                r#"strong[class*="comment"]"#.to_string(),
            ],
            description: vec![
                TextSource::text(r#"div[data-e2e="browse-video-desc"]"#),
                TextSource::text(r#"h1[data-e2e*="desc"]"#),
                TextSource::attribute(r#"meta[name="description"]"#, "content"),
            ],
            consent_labels: vec!["Accept".into(), "ACCEPT".into(), "Autoriser".into()],
        }
    }
}

impl Selectors {
    /// Every selector whose presence means a video page has rendered.
    pub fn detail_ready(&self) -> Vec<String> {
        self.likes
            .iter()
            .chain(self.comments.iter())
            .cloned()
            .chain(self.description.iter().map(|s| s.selector.clone()))
            .collect()
    }
}

/// Parse a YAML document into a [`ScrapeConfig`].
pub fn parse_config(yaml: &str) -> Result<ScrapeConfig, Box<dyn Error>> {
    let config: ScrapeConfig = serde_yaml::from_str(yaml)?;
    Ok(config)
}

/// Load the configuration file at `path`.
#[instrument(level = "info")]
pub async fn load_config(path: &str) -> Result<ScrapeConfig, Box<dyn Error>> {
    let yaml = tokio::fs::read_to_string(path).await?;
    let config = parse_config(&yaml)?;
    info!(path, headless = config.headless, "Loaded scrape configuration");
    Ok(config)
}
