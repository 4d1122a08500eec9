//! In-memory browser backed by static HTML.
//!
//! Serves canned documents keyed by URL and answers queries with `scraper`.
//! Elements are addressed by their position in document order, which keeps
//! them independent of the borrowed `ElementRef` lifetimes.

use super::{Element, Page, Session};
use scraper::{ElementRef, Html, Selector};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::error::Error;
use std::rc::Rc;

fn parse_selector(selector: &str) -> Result<Selector, Box<dyn Error>> {
    Selector::parse(selector).map_err(|e| format!("invalid selector {selector:?}: {e}").into())
}

fn all_elements(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
}

fn position_of(doc: &Html, target: ElementRef<'_>) -> Option<usize> {
    all_elements(doc).position(|e| e == target)
}

/// A set of pages the fake browser can navigate to.
#[derive(Default)]
pub struct SnapshotSite {
    pages: HashMap<String, String>,
}

impl SnapshotSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Open a session on this site.
    pub fn session(self) -> SnapshotSession {
        SnapshotSession {
            page: SnapshotPage {
                pages: self.pages,
                current: RefCell::new(None),
                visits: RefCell::new(Vec::new()),
                clicked: Cell::new(false),
            },
            closed: Rc::new(Cell::new(false)),
        }
    }
}

pub struct SnapshotSession {
    page: SnapshotPage,
    closed: Rc<Cell<bool>>,
}

impl SnapshotSession {
    /// Flag flipped by [`Session::close`], observable after the session is consumed.
    pub fn closed_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.closed)
    }
}

impl Session for SnapshotSession {
    type Page = SnapshotPage;

    fn page(&self) -> &SnapshotPage {
        &self.page
    }

    async fn close(self) {
        self.closed.set(true);
    }
}

pub struct SnapshotPage {
    pages: HashMap<String, String>,
    current: RefCell<Option<Rc<Html>>>,
    visits: RefCell<Vec<String>>,
    clicked: Cell<bool>,
}

impl SnapshotPage {
    /// URLs navigated to, in order.
    pub fn visits(&self) -> Vec<String> {
        self.visits.borrow().clone()
    }

    pub fn consent_clicked(&self) -> bool {
        self.clicked.get()
    }

    fn document(&self) -> Result<Rc<Html>, Box<dyn Error>> {
        self.current
            .borrow()
            .clone()
            .ok_or_else(|| "no page loaded".into())
    }
}

impl Page for SnapshotPage {
    type Element = SnapshotElement;

    async fn goto(&self, url: &str) -> Result<(), Box<dyn Error>> {
        self.visits.borrow_mut().push(url.to_string());
        let html = self
            .pages
            .get(url)
            .ok_or_else(|| format!("net::ERR_NAME_NOT_RESOLVED at {url}"))?;
        *self.current.borrow_mut() = Some(Rc::new(Html::parse_document(html)));
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<SnapshotElement>, Box<dyn Error>> {
        let doc = self.document()?;
        let selector = parse_selector(selector)?;
        let indices: Vec<usize> = doc
            .select(&selector)
            .filter_map(|e| position_of(&doc, e))
            .collect();
        Ok(indices
            .into_iter()
            .map(|index| SnapshotElement {
                doc: Rc::clone(&doc),
                index,
            })
            .collect())
    }

    async fn scroll_height(&self) -> Result<u64, Box<dyn Error>> {
        // Static documents never grow.
        self.document()?;
        Ok(1080)
    }

    async fn scroll_to_bottom(&self) -> Result<(), Box<dyn Error>> {
        self.document()?;
        Ok(())
    }

    async fn click_button_containing(&self, labels: &[String]) -> Result<bool, Box<dyn Error>> {
        let doc = self.document()?;
        let buttons = parse_selector("button")?;
        let found = doc.select(&buttons).any(|b| {
            let text: String = b.text().collect();
            labels.iter().any(|l| text.contains(l.as_str()))
        });
        if found {
            self.clicked.set(true);
        }
        Ok(found)
    }
}

pub struct SnapshotElement {
    doc: Rc<Html>,
    index: usize,
}

impl SnapshotElement {
    fn element(&self) -> Result<ElementRef<'_>, Box<dyn Error>> {
        all_elements(&self.doc)
            .nth(self.index)
            .ok_or_else(|| "stale element reference".into())
    }
}

impl Element for SnapshotElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.element()?.value().attr(name).map(str::to_string))
    }

    async fn text(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.element()?.text().collect())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, Box<dyn Error>> {
        let selector = parse_selector(selector)?;
        let el = self.element()?;
        Ok(el
            .select(&selector)
            .filter_map(|e| position_of(&self.doc, e))
            .map(|index| SnapshotElement {
                doc: Rc::clone(&self.doc),
                index,
            })
            .collect())
    }

    async fn ancestor_attributes(
        &self,
        depth: usize,
        names: &[&str],
    ) -> Result<Vec<String>, Box<dyn Error>> {
        let mut out = Vec::new();
        let mut node = Some(self.element()?);
        for _ in 0..=depth {
            let Some(el) = node else { break };
            for name in names {
                if let Some(v) = el.value().attr(name).filter(|v| !v.is_empty()) {
                    out.push(v.to_string());
                }
            }
            node = el.parent().and_then(ElementRef::wrap);
        }
        Ok(out)
    }

    async fn scroll_into_view(&self) -> Result<(), Box<dyn Error>> {
        self.element()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<html><body>
        <div id="outer" data-bg="bg.jpg">
            <a href="/v/1"><img src="one.jpg"></a>
            <a href="/v/2"><img src="two.jpg"></a>
        </div>
        <button>Tout Autoriser</button>
    </body></html>"#;

    #[tokio::test]
    async fn test_queries_and_ancestors() {
        let session = SnapshotSite::new().page("http://t/", DOC).session();
        let page = session.page();
        page.goto("http://t/").await.unwrap();

        let links = page.find_all("a").await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].attribute("href").await.unwrap().as_deref(), Some("/v/2"));

        let imgs = links[0].find_all("img").await.unwrap();
        assert_eq!(imgs.len(), 1);
        assert_eq!(imgs[0].attribute("src").await.unwrap().as_deref(), Some("one.jpg"));

        let found = imgs[0].ancestor_attributes(2, &["data-bg", "href"]).await.unwrap();
        assert_eq!(found, vec!["/v/1".to_string(), "bg.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_url_fails_navigation() {
        let session = SnapshotSite::new().session();
        assert!(session.page().goto("http://missing/").await.is_err());
        assert!(session.page().find_all("a").await.is_err());
    }

    #[tokio::test]
    async fn test_consent_click_and_close() {
        let session = SnapshotSite::new().page("http://t/", DOC).session();
        let closed = session.closed_flag();
        session.page().goto("http://t/").await.unwrap();
        let labels = vec!["Accept".to_string(), "Autoriser".to_string()];
        assert!(session.page().click_button_containing(&labels).await.unwrap());
        assert!(session.page().consent_clicked());
        session.close().await;
        assert!(closed.get());
    }
}
