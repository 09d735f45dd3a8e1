use crate::types::{NotificationPayload, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A navigable, rendered page. Elements are addressed by CSS selector plus
/// their index among the matches, in document order.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load `url` in the page
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until the first match of `selector` is visible.
    /// Fails with `FeedLoadTimeout` once `timeout` has elapsed.
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Number of elements currently matching `selector`
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Text content of the `index`-th match, `None` when there is no such element
    async fn read_text(&self, selector: &str, index: usize) -> Result<Option<String>>;

    /// Attribute `name` of the first `child` element inside the `index`-th
    /// match of `selector`
    async fn read_child_attribute(
        &self,
        selector: &str,
        index: usize,
        child: &str,
        name: &str,
    ) -> Result<Option<String>>;

    /// Release the underlying browser session
    async fn close(&self) -> Result<()>;
}

/// Hands out a fresh renderer for every poll cycle.
#[async_trait]
pub trait RendererLauncher: Send + Sync {
    /// Errors here are `RendererUnavailable` and end the loop.
    async fn launch(&self) -> Result<Box<dyn PageRenderer>>;
}

/// Destination for alerts (chat webhook, log, ...)
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver once, no retry. Returns the provider's response body.
    async fn send(&self, payload: &NotificationPayload) -> Result<serde_json::Value>;
}
