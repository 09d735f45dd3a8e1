// Shared fakes for driving the watcher without a browser
#![allow(dead_code)]

use async_trait::async_trait;
use square_watch::{PageRenderer, RendererLauncher, Result, SiteConfig, WatchConfig, WatchError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const BASE_URL: &str = "https://www.binance.com";

pub fn profile_url(account: &str) -> String {
    format!("{}/zh-CN/square/profile/{}", BASE_URL, account)
}

pub fn detail_url(post_id: u32) -> String {
    format!("{}/zh-CN/square/post/{}", BASE_URL, post_id)
}

#[derive(Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub attrs: HashMap<String, String>,
    /// First match of a child selector inside this element
    pub children: HashMap<String, FakeElement>,
}

impl FakeElement {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, child: FakeElement) -> Self {
        self.children.insert(selector.to_string(), child);
        self
    }
}

/// A rendered page: selector -> matches in document order.
///
/// Pages start out with the default feed container. A selector listed in `delays` only shows up that long after navigation.
#[derive(Clone)]
pub struct FakePage {
    pub visible: bool,
    pub elements: HashMap<String, Vec<FakeElement>>,
    pub delays: HashMap<String, Duration>,
}

impl FakePage {
    pub fn new() -> Self {
        let container = SiteConfig::default().feed_container_selector;
        Self {
            visible: true,
            elements: HashMap::from([(container, vec![FakeElement::default()])]),
            delays: HashMap::new(),
        }
    }

    /// Page whose feed container never shows up
    pub fn never_visible() -> Self {
        Self {
            visible: false,
            ..Self::new()
        }
    }

    pub fn with(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements.entry(selector.to_string()).or_default().push(element);
        self
    }

    pub fn with_element(self, selector: &str, text: &str, attrs: &[(&str, &str)]) -> Self {
        let element = attrs
            .iter()
            .fold(FakeElement::new(text), |element, (name, value)| element.attr(name, value));
        self.with(selector, element)
    }

    /// Card in the feed, optionally carrying a link.
    pub fn with_card(self, site: &SiteConfig, text: &str, href: Option<&str>) -> Self {
        let mut card = FakeElement::new(text);
        if let Some(href) = href {
            card = card.child(&site.post_link_selector, FakeElement::new(text).attr("href", href));
        }
        self.with(&site.post_text_selector, card)
    }

    /// Elements matching `selector` only render `after` the page loads
    pub fn delayed(mut self, selector: &str, after: Duration) -> Self {
        self.delays.insert(selector.to_string(), after);
        self
    }

    /// Feed made of `(card text, href)` posts in display order.
    pub fn feed(site: &SiteConfig, posts: &[(&str, &str)]) -> Self {
        posts
            .iter()
            .fold(Self::new(), |page, (text, href)| page.with_card(site, text, Some(*href)))
    }

    pub fn detail(site: &SiteConfig, create_time: &str, body: &str) -> Self {
        Self::new()
            .with_element(&site.create_time_selector, create_time, &[])
            .with_element(&site.body_selector, body, &[])
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    pages: HashMap<String, FakePage>,
    current: Mutex<Option<(String, Instant)>>,
    pub visited: Mutex<Vec<String>>,
    closes: Arc<AtomicUsize>,
    fail_on: Option<String>,
}

impl FakeRenderer {
    pub fn new(pages: HashMap<String, FakePage>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// Current page and the time since it was navigated to
    fn page(&self) -> Option<(FakePage, Duration)> {
        let current = self.current.lock().unwrap();
        current
            .as_ref()
            .and_then(|(url, at)| self.pages.get(url).map(|page| (page.clone(), at.elapsed())))
    }

    fn rendered(&self, selector: &str) -> Vec<FakeElement> {
        match self.page() {
            Some((page, elapsed)) if page.delays.get(selector).map_or(true, |d| elapsed >= *d) => {
                page.elements.get(selector).cloned().unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }

    fn is_present(&self, selector: &str) -> bool {
        match self.page() {
            Some((page, elapsed)) => {
                page.visible
                    && page.delays.get(selector).map_or(true, |d| elapsed >= *d)
                    && page.elements.get(selector).map_or(false, |els| !els.is_empty())
            }
            None => false,
        }
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn navigate(&self, url: &str) -> Result<()> {
        if self.fail_on.as_deref() == Some(url) {
            return Err(WatchError::RendererUnavailable("browser crashed".to_string()));
        }
        self.visited.lock().unwrap().push(url.to_string());
        *self.current.lock().unwrap() = Some((url.to_string(), Instant::now()));
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_present(selector) {
                return Ok(());
            }
            let never = self.page().map_or(true, |(page, _)| !page.visible);
            if never || Instant::now() >= deadline {
                return Err(WatchError::FeedLoadTimeout {
                    selector: selector.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.rendered(selector).len())
    }

    async fn read_text(&self, selector: &str, index: usize) -> Result<Option<String>> {
        Ok(self.rendered(selector).get(index).map(|el| el.text.clone()))
    }

    async fn read_child_attribute(
        &self,
        selector: &str,
        index: usize,
        child: &str,
        name: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .rendered(selector)
            .get(index)
            .and_then(|el| el.children.get(child))
            .and_then(|link| link.attrs.get(name).cloned()))
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Launcher handing out renderers over the same scripted pages.
#[derive(Default)]
pub struct FakeLauncher {
    pages: HashMap<String, FakePage>,
    pub launches: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    unavailable: bool,
    crash_on: Option<String>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn page(mut self, url: impl Into<String>, page: FakePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Navigating to `url` reports the browser as gone
    pub fn crash_on(mut self, url: impl Into<String>) -> Self {
        self.crash_on = Some(url.into());
        self
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RendererLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageRenderer>> {
        if self.unavailable {
            return Err(WatchError::RendererUnavailable("no browser".to_string()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRenderer {
            pages: self.pages.clone(),
            current: Mutex::new(None),
            visited: Mutex::new(Vec::new()),
            closes: self.closes.clone(),
            fail_on: self.crash_on.clone(),
        }))
    }
}

/// Config pointing the webhook at `webhook_base` (a mockito server).
pub fn test_config(accounts: &[&str], webhook_base: &str) -> WatchConfig {
    let mut config = WatchConfig::default();
    config.accounts = accounts.iter().map(|a| a.to_string()).collect();
    config.notify.webhook_url = format!("{}/robot/send", webhook_base);
    config.notify.access_token = "test-token".to_string();
    config.poll_interval_seconds = 1;
    config.page_wait_timeout_seconds = 1;
    config
}
