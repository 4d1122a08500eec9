//! The DOM seam between the scraper and a live browser.
//!
//! The collection driver and the extraction heuristics only talk to these
//! traits, never to a CDP client directly:
//!
//! - [`Element`]: attribute/text reads and sub-queries on one node
//! - [`Page`]: navigation, document-level queries, scrolling
//! - [`Session`]: owns a page for the length of a scrape and tears the
//!   browser down afterwards
//!
//! # Backends
//!
//! | Backend | Module | Notes |
//! |---------|--------|-------|
//! | Chromium over CDP | [`chrome`] | Production backend (`chromiumoxide`) |
//! | Static HTML | `snapshot` | Test-only, serves canned pages parsed with `scraper` |
//!
//! Selectors are plain CSS everywhere so both backends accept the same lists.

use std::error::Error;

pub mod chrome;
#[cfg(test)]
pub mod snapshot;

/// One DOM element.
pub trait Element: Sized {
    /// Current value of an attribute, `None` when absent.
    async fn attribute(&self, name: &str) -> Result<Option<String>, Box<dyn Error>>;

    /// Rendered text content.
    async fn text(&self) -> Result<String, Box<dyn Error>>;

    /// Descendants matching a CSS selector, in document order.
    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, Box<dyn Error>>;

    /// Non-empty values of `names` on this element and up to `depth` ancestors.
    ///
    /// Values are ordered nearest element first, then by position in `names`.
    async fn ancestor_attributes(
        &self,
        depth: usize,
        names: &[&str],
    ) -> Result<Vec<String>, Box<dyn Error>>;

    /// Bring the element into the viewport so lazy loaders fire.
    async fn scroll_into_view(&self) -> Result<(), Box<dyn Error>>;
}

/// One browser tab.
pub trait Page {
    type Element: Element;

    /// Navigate and wait for the load to settle.
    async fn goto(&self, url: &str) -> Result<(), Box<dyn Error>>;

    /// Elements matching a CSS selector, in document order.
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, Box<dyn Error>>;

    /// `document.body.scrollHeight`.
    async fn scroll_height(&self) -> Result<u64, Box<dyn Error>>;

    async fn scroll_to_bottom(&self) -> Result<(), Box<dyn Error>>;

    /// Click the first `<button>` whose text contains any of `labels`.
    ///
    /// Returns whether a button was clicked.
    async fn click_button_containing(&self, labels: &[String]) -> Result<bool, Box<dyn Error>>;

    /// First element matching `selector`, if any.
    async fn find_first(&self, selector: &str) -> Result<Option<Self::Element>, Box<dyn Error>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }
}

/// A browser session scoped to one scrape.
pub trait Session {
    type Page: Page;

    fn page(&self) -> &Self::Page;

    /// Shut the browser down. Never fails; problems are logged.
    async fn close(self);
}
