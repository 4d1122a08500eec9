//! Thumbnail resolution for a video tile.
//!
//! Tiles are lazy-loaded: until the tile scrolls into view, `<img src>` is a
//! 1×1 transparent GIF data URI and the real URL sits in `srcset`,
//! `data-*` attributes, or arrives a moment later. [`resolve_thumbnail`] walks
//! [`STRATEGIES`] in order and returns the first real image URL.

use crate::browser::Element;
use crate::config::PollPolicy;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument};

/// Substrings that identify the lazy-load stub image.
pub const PLACEHOLDER_SIGNATURES: [&str; 2] = ["data:image/gif;base64", "R0lGODlhAQABA"];

const SOURCE_SELECTOR: &str = "picture source[srcset], source[srcset]";
const IMG_SELECTOR: &str = "picture img, img";
const SOURCE_ATTRS: [&str; 3] = ["srcset", "data-srcset", "data-src"];
const IMG_SRCSET_ATTRS: [&str; 2] = ["srcset", "data-srcset"];
const IMG_SRC_ATTRS: [&str; 5] = ["src", "data-src", "data-original", "data-lazy", "data-image"];
const ANCESTOR_ATTRS: [&str; 4] = ["data-src", "data-bg", "data-image", "data-thumbnail"];
/// The tile itself plus this many ancestors are searched by the last strategy.
const ANCESTOR_DEPTH: usize = 2;

/// One way of finding the thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `<source srcset>` inside the tile.
    SourceSrcset,
    /// `<img>` srcset, then plain src-like attributes.
    ImgAttributes,
    /// Re-read the first `<img>` while the lazy loader swaps the stub out.
    LazyLoadPoll,
    /// `data-*` image attributes on the tile and its ancestors.
    AncestorData,
}

/// Strategies in the order they are tried.
pub const STRATEGIES: [Strategy; 4] = [
    Strategy::SourceSrcset,
    Strategy::ImgAttributes,
    Strategy::LazyLoadPoll,
    Strategy::AncestorData,
];

/// Timing for [`resolve_thumbnail`].
#[derive(Debug, Clone)]
pub struct ThumbnailPolicy {
    /// Pause after scrolling the tile into view.
    pub settle: Duration,
    pub poll: PollPolicy,
}

impl Default for ThumbnailPolicy {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(350),
            poll: PollPolicy::default(),
        }
    }
}

/// Whether `value` is the lazy-load stub rather than a real image.
pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_SIGNATURES.iter().any(|sig| value.contains(sig))
}

fn unescape(value: &str) -> String {
    html_escape::decode_html_entities(value).into_owned()
}

/// Keep `value` only if it is a non-empty, non-placeholder URL.
fn usable(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty() && !is_placeholder(&value)).then_some(value)
}

/// Leading integer of a srcset descriptor (`640w`, `2x`, `300`).
fn descriptor_score(descriptor: &str) -> Option<u64> {
    let digits: String = descriptor.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Pick the best URL from a `srcset` list.
///
/// Candidates are `URL [descriptor]` separated by commas. When any descriptor
/// carries a number, the highest number wins (earliest on ties); otherwise
/// the first candidate wins. Returns `None` for an empty list.
pub fn parse_srcset(srcset: &str) -> Option<String> {
    let decoded = unescape(srcset);
    let mut first: Option<&str> = None;
    let mut best: Option<(u64, &str)> = None;

    for part in decoded.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let mut segs = part.split_whitespace();
        let Some(url) = segs.next() else { continue };
        first.get_or_insert(url);
        if let Some(score) = segs.next().and_then(descriptor_score) {
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, url));
            }
        }
    }

    best.map(|(_, url)| url)
        .or(first)
        .map(unescape)
}

/// Resolve the thumbnail URL for a video tile.
///
/// Returns an empty string when no strategy yields a real image. Element
/// errors are logged and treated as "not found"; this never fails.
#[instrument(level = "debug", skip_all)]
pub async fn resolve_thumbnail<E: Element>(tile: &E, policy: &ThumbnailPolicy) -> String {
    if let Err(e) = tile.scroll_into_view().await {
        debug!(error = %e, "scroll_into_view failed");
    } else if !policy.settle.is_zero() {
        sleep(policy.settle).await;
    }

    for strategy in STRATEGIES {
        let found = match strategy {
            Strategy::SourceSrcset => from_sources(tile).await,
            Strategy::ImgAttributes => from_images(tile).await,
            Strategy::LazyLoadPoll => from_lazy_load(tile, &policy.poll).await,
            Strategy::AncestorData => from_ancestors(tile).await,
        };
        if let Some(url) = found {
            debug!(?strategy, %url, "Resolved thumbnail");
            return url;
        }
    }
    debug!("No thumbnail candidate resolved");
    String::new()
}

/// First non-empty attribute among `names`, errors folded into `None`.
async fn first_attribute<E: Element>(el: &E, names: &[&str]) -> Option<String> {
    for name in names {
        match el.attribute(name).await {
            Ok(Some(v)) if !v.is_empty() => return Some(v),
            Ok(_) => {}
            Err(e) => debug!(attribute = *name, error = %e, "attribute read failed"),
        }
    }
    None
}

async fn find_or_empty<E: Element>(el: &E, selector: &str) -> Vec<E> {
    el.find_all(selector).await.unwrap_or_else(|e| {
        debug!(selector, error = %e, "sub-query failed");
        Vec::new()
    })
}

async fn from_sources<E: Element>(tile: &E) -> Option<String> {
    for source in find_or_empty(tile, SOURCE_SELECTOR).await {
        let Some(srcset) = first_attribute(&source, &SOURCE_ATTRS).await else {
            continue;
        };
        if let Some(url) = parse_srcset(&srcset).and_then(usable) {
            return Some(url);
        }
    }
    None
}

async fn from_images<E: Element>(tile: &E) -> Option<String> {
    for img in find_or_empty(tile, IMG_SELECTOR).await {
        for name in IMG_SRCSET_ATTRS {
            if let Ok(Some(v)) = img.attribute(name).await {
                if let Some(url) = parse_srcset(&v).and_then(usable) {
                    return Some(url);
                }
            }
        }
        for name in IMG_SRC_ATTRS {
            if let Ok(Some(v)) = img.attribute(name).await {
                if let Some(url) = usable(unescape(&v)) {
                    return Some(url);
                }
            }
        }
    }
    None
}

/// Read the current `src`/`srcset` of one image, rejecting the stub.
async fn current_image_url<E: Element>(img: &E) -> Option<String> {
    if let Ok(Some(src)) = img.attribute("src").await {
        if let Some(url) = usable(unescape(&src)) {
            return Some(url);
        }
    }
    let srcset = first_attribute(img, &IMG_SRCSET_ATTRS).await?;
    parse_srcset(&srcset).and_then(usable)
}

async fn from_lazy_load<E: Element>(tile: &E, poll: &PollPolicy) -> Option<String> {
    let img = find_or_empty(tile, IMG_SELECTOR).await.into_iter().next()?;
    let img = &img;
    poll.backoff()
        .poll(move |_| current_image_url(img))
        .await
}

async fn from_ancestors<E: Element>(tile: &E) -> Option<String> {
    let values = match tile.ancestor_attributes(ANCESTOR_DEPTH, &ANCESTOR_ATTRS).await {
        Ok(values) => values,
        Err(e) => {
            debug!(error = %e, "ancestor attribute read failed");
            return None;
        }
    };
    values
        .into_iter()
        .filter(|v| !is_placeholder(v))
        .find_map(|v| usable(unescape(&v)))
}
