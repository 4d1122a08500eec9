//! Chromium backend over the DevTools protocol.
//!
//! Launches a local Chromium with [`chromiumoxide`], pumps its event handler on
//! a background task, and exposes one tab through the [`Page`] trait.
//!
//! # Launch Flags
//!
//! - headless unless the config says otherwise
//! - `--no-sandbox` and `--disable-dev-shm-usage` so it runs inside containers
//! - a desktop Chrome user agent (the mobile/headless default gets a stripped page)

use super::{Element, Page, Session};
use crate::config::ScrapeConfig;
use chromiumoxide::element::Element as CdpElement;
use chromiumoxide::{Browser, BrowserConfig, Handler};
use futures::StreamExt;
use std::error::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// A running Chromium plus the single tab the scrape drives.
pub struct ChromeSession {
    browser: Browser,
    page: ChromePage,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    /// Launch the browser and open a blank tab.
    ///
    /// # Errors
    ///
    /// Returns an error if no Chromium executable is found or the DevTools
    /// connection cannot be established.
    #[instrument(level = "info", skip_all, fields(headless = config.headless))]
    pub async fn launch(config: &ScrapeConfig) -> Result<Self, Box<dyn Error>> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", config.user_agent));
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build()?;

        let (browser, handler) = Browser::launch(browser_config).await?;
        let handler_task = spawn_handler_task(handler);

        let page = browser.new_page("about:blank").await?;
        info!("Browser session started");

        Ok(Self {
            browser,
            page: ChromePage { inner: page },
            handler_task,
        })
    }
}

impl Session for ChromeSession {
    type Page = ChromePage;

    fn page(&self) -> &ChromePage {
        &self.page
    }

    #[instrument(level = "info", skip_all)]
    async fn close(self) {
        let ChromeSession {
            mut browser,
            page,
            handler_task,
        } = self;
        drop(page);

        if let Err(e) = browser.close().await {
            warn!(error = %e, "Browser close command failed");
        }
        match browser.wait().await {
            Ok(status) => debug!(?status, "Browser process exited"),
            Err(e) => warn!(error = %e, "Waiting for browser exit failed"),
        }
        handler_task.abort();
        info!("Browser session closed");
    }
}

fn spawn_handler_task(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!(error = %e, "CDP handler event error");
            }
        }
    })
}

/// One Chromium tab.
pub struct ChromePage {
    inner: chromiumoxide::Page,
}

impl Page for ChromePage {
    type Element = ChromeElement;

    #[instrument(level = "debug", skip(self))]
    async fn goto(&self, url: &str) -> Result<(), Box<dyn Error>> {
        self.inner.goto(url).await?;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ChromeElement>, Box<dyn Error>> {
        let elements = self.inner.find_elements(selector).await?;
        Ok(elements.into_iter().map(ChromeElement::from).collect())
    }

    async fn scroll_height(&self) -> Result<u64, Box<dyn Error>> {
        let height = self
            .inner
            .evaluate("document.body.scrollHeight")
            .await?
            .into_value::<u64>()?;
        Ok(height)
    }

    async fn scroll_to_bottom(&self) -> Result<(), Box<dyn Error>> {
        self.inner
            .evaluate("window.scrollTo(0, document.body.scrollHeight);")
            .await?;
        Ok(())
    }

    async fn click_button_containing(&self, labels: &[String]) -> Result<bool, Box<dyn Error>> {
        let js = format!(
            r#"(() => {{
                const labels = {labels};
                for (const button of document.querySelectorAll('button')) {{
                    const text = button.textContent || '';
                    if (labels.some(label => text.includes(label))) {{
                        button.click();
                        return true;
                    }}
                }}
                return false;
            }})()"#,
            labels = serde_json::to_string(labels)?
        );
        let clicked = self.inner.evaluate(js).await?.into_value::<bool>()?;
        Ok(clicked)
    }
}

/// One element inside a Chromium tab.
pub struct ChromeElement {
    inner: CdpElement,
}

impl From<CdpElement> for ChromeElement {
    fn from(inner: CdpElement) -> Self {
        Self { inner }
    }
}

impl Element for ChromeElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.inner.attribute(name).await?)
    }

    async fn text(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.inner.inner_text().await?.unwrap_or_default())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, Box<dyn Error>> {
        let elements = self.inner.find_elements(selector).await?;
        Ok(elements.into_iter().map(ChromeElement::from).collect())
    }

    async fn ancestor_attributes(
        &self,
        depth: usize,
        names: &[&str],
    ) -> Result<Vec<String>, Box<dyn Error>> {
        // The result travels back as a JSON string: primitives come back by
        // value, arrays would come back as a remote object handle.
        let js = format!(
            r#"function() {{
                const names = {names};
                const out = [];
                let node = this;
                for (let level = 0; level <= {depth} && node; level++) {{
                    if (node.getAttribute) {{
                        for (const name of names) {{
                            const value = node.getAttribute(name);
                            if (value) out.push(value);
                        }}
                    }}
                    node = node.parentElement;
                }}
                return JSON.stringify(out);
            }}"#,
            names = serde_json::to_string(names)?,
            depth = depth
        );
        let returns = self.inner.call_js_fn(js, false).await?;
        let raw = returns
            .result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .unwrap_or("[]")
            .to_string();
        Ok(serde_json::from_str(&raw)?)
    }

    async fn scroll_into_view(&self) -> Result<(), Box<dyn Error>> {
        self.inner
            .call_js_fn("function() { this.scrollIntoView({block: 'center'}); }", false)
            .await?;
        Ok(())
    }
}
