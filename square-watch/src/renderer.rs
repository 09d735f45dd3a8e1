use crate::traits::{PageRenderer, RendererLauncher};
use crate::types::{RendererConfig, Result, WatchError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Launches a headless Chromium per poll cycle.
pub struct ChromiumLauncher {
    config: RendererConfig,
}

impl ChromiumLauncher {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder();
        if !self.config.headless {
            builder = builder.with_head();
        }
        if self.config.no_sandbox {
            builder = builder.arg("--no-sandbox");
        }
        // Avoid /dev/shm size issues in containers
        builder = builder.arg("--disable-dev-shm-usage");
        if let Some(path) = &self.config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(WatchError::RendererUnavailable)
    }
}

#[async_trait]
impl RendererLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn PageRenderer>> {
        info!("Launching browser (headless: {})", self.config.headless);

        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| WatchError::RendererUnavailable(e.to_string()))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handle.abort();
                return Err(WatchError::RendererUnavailable(e.to_string()));
            }
        };

        Ok(Box::new(ChromiumRenderer {
            browser: Mutex::new(browser),
            page,
            handler: Mutex::new(Some(handle)),
            poll_interval: Duration::from_millis(self.config.visibility_poll_ms.max(10)),
        }))
    }
}

/// One browser with a single tab, reused for every navigation in a cycle.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    page: Page,
    handler: Mutex<Option<JoinHandle<()>>>,
    poll_interval: Duration,
}

impl ChromiumRenderer {
    // Scripts never return null: an absent value comes back as an empty array.
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        let result = self.page.evaluate(script).await.map_err(cdp_error)?;
        Ok(result.into_value()?)
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        self.eval(visibility_script(selector)?).await
    }

    async fn poll_until_visible(&self, selector: &str) -> Result<()> {
        loop {
            if self.is_visible(selector).await? {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        let started = Instant::now();

        match tokio::time::timeout(timeout, self.poll_until_visible(selector)).await {
            Ok(result) => {
                debug!("'{}' visible after {:?}", selector, started.elapsed());
                result
            }
            Err(_) => Err(WatchError::FeedLoadTimeout {
                selector: selector.to_string(),
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let selector = js_string(selector)?;
        self.eval(format!("document.querySelectorAll({}).length", selector)).await
    }

    async fn read_text(&self, selector: &str, index: usize) -> Result<Option<String>> {
        let selector = js_string(selector)?;
        let found: Vec<String> = self
            .eval(format!(
                "(() => {{ const el = document.querySelectorAll({})[{}]; return el ? [el.textContent || ''] : []; }})()",
                selector, index
            ))
            .await?;
        Ok(found.into_iter().next())
    }

    async fn read_child_attribute(
        &self,
        selector: &str,
        index: usize,
        child: &str,
        name: &str,
    ) -> Result<Option<String>> {
        let selector = js_string(selector)?;
        let child = js_string(child)?;
        let name = js_string(name)?;
        let found: Vec<String> = self
            .eval(format!(
                "(() => {{ const card = document.querySelectorAll({0})[{1}]; \
                 const el = card ? card.querySelector({2}) : null; \
                 return el && el.hasAttribute({3}) ? [el.getAttribute({3})] : []; }})()",
                selector, index, child, name
            ))
            .await?;
        Ok(found.into_iter().next())
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await.map(|_| ()).map_err(cdp_error);

        if let Some(handle) = self.handler.lock().await.take() {
            // the event loop only ends once the browser is gone
            if closed.is_err() {
                handle.abort();
            } else if let Err(e) = handle.await {
                warn!("Browser handler task ended abnormally: {}", e);
            }
        }

        debug!("Browser closed");
        closed
    }
}

/// Quote a value as a JavaScript string literal.
fn js_string(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn visibility_script(selector: &str) -> Result<String> {
    Ok(format!(
        "(() => {{ \
            const el = document.querySelector({}); \
            if (!el) return false; \
            const style = window.getComputedStyle(el); \
            const rect = el.getBoundingClientRect(); \
            return style.visibility !== 'hidden' && style.display !== 'none' && rect.width > 0 && rect.height > 0; \
        }})()",
        js_string(selector)?
    ))
}

/// Connection-level failures mean the browser is gone; everything else is
/// scoped to the current page.
fn cdp_error(err: CdpError) -> WatchError {
    match err {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            WatchError::RendererUnavailable(err.to_string())
        }
        other => WatchError::Renderer(other.to_string()),
    }
}
