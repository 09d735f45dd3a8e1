use crate::filter::{PostFilter, Verdict};
use crate::locator::locate_first_unpinned;
use crate::notifier::build_payload;
use crate::sources::BinanceSquare;
use crate::timestamp::parse_relative_age;
use crate::traits::{NotifyChannel, PageRenderer, RendererLauncher};
use crate::types::{Account, CycleReport, FeedPost, Result, WatchConfig, WatchError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// What happened to one account during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountOutcome {
    Notified { detail_url: String, response: serde_json::Value },
    Skipped { detail_url: String, verdict: Verdict },
}

/// The poll loop: feed page, first unpinned post, timestamp, filter, alert.
pub struct SquareWatcher {
    config: Arc<WatchConfig>,
    launcher: Arc<dyn RendererLauncher>,
    channel: Arc<dyn NotifyChannel>,
    filter: PostFilter,
}

impl SquareWatcher {
    pub fn new(
        config: Arc<WatchConfig>,
        launcher: Arc<dyn RendererLauncher>,
        channel: Arc<dyn NotifyChannel>,
    ) -> Self {
        let filter = PostFilter::from_config(&config);
        Self {
            config,
            launcher,
            channel,
            filter,
        }
    }

    /// Run cycles until `shutdown` is cancelled. Only a renderer that cannot
    /// be launched (or dies mid-cycle) ends the loop with an error.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        info!(
            "Watching {} accounts every {}s via {}",
            self.config.accounts.len(),
            self.config.poll_interval_seconds,
            self.channel.name()
        );

        while !shutdown.is_cancelled() {
            let report = self.run_cycle(&shutdown).await?;
            info!(
                "Cycle done: {} checked, {} notified, {} skipped, {} failed",
                report.checked, report.notified, report.skipped, report.failed
            );

            info!("Waiting {}s before the next check", self.config.poll_interval_seconds);
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = shutdown.cancelled() => {}
            }
        }

        info!("Shutdown requested, watcher stopped");
        Ok(())
    }

    /// One pass over every account with a freshly launched renderer. The
    /// renderer is closed before returning, whatever the accounts did.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> Result<CycleReport> {
        let span = info_span!("cycle", id = %Uuid::new_v4());
        self.cycle(shutdown).instrument(span).await
    }

    async fn cycle(&self, shutdown: &CancellationToken) -> Result<CycleReport> {
        let renderer = self.launcher.launch().await?;
        let mut report = CycleReport::default();
        let mut fatal = None;

        for account in self.config.account_list() {
            if shutdown.is_cancelled() {
                break;
            }

            let outcome = tokio::select! {
                outcome = self
                    .check_account(renderer.as_ref(), &account)
                    .instrument(info_span!("account", name = %account)) => outcome,
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested during {}", account);
                    break;
                }
            };

            report.checked += 1;
            match outcome {
                Ok(AccountOutcome::Notified { response, .. }) => {
                    report.notified += 1;
                    info!("Notified for {}: {}", account, response);
                }
                Ok(AccountOutcome::Skipped { detail_url, verdict }) => {
                    report.skipped += 1;
                    info!("No alert for {} ({}): {:?}", account, detail_url, verdict);
                }
                Err(e) if e.is_fatal() => {
                    error!("Renderer failed while checking {}: {}", account, e);
                    report.failed += 1;
                    fatal = Some(e);
                    break;
                }
                Err(e @ WatchError::NotificationDelivery(_)) | Err(e @ WatchError::Http(_)) => {
                    report.failed += 1;
                    error!("Failed to deliver alert for {}: {}", account, e);
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("Skipping {} this cycle: {}", account, e);
                }
            }
        }

        if let Err(e) = renderer.close().await {
            warn!("Failed to close renderer: {}", e);
        }

        match fatal {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Check one account end to end. Every error returned here is scoped to
    /// this account unless `is_fatal()`.
    pub async fn check_account(&self, renderer: &dyn PageRenderer, account: &Account) -> Result<AccountOutcome> {
        let selectors = &self.config.site;
        let site = BinanceSquare::new(selectors);
        let timeout = self.config.page_wait_timeout();

        let profile_url = site.profile_url(account)?;
        info!("Visiting URL: {}", profile_url);
        renderer.navigate(&profile_url).await?;
        renderer.wait_for_visible(&selectors.feed_container_selector, timeout).await?;
        // the container renders before the feed fills in
        renderer.wait_for_visible(&selectors.post_text_selector, timeout).await?;

        let card = locate_first_unpinned(renderer, selectors, account).await?;
        let detail_url = site.detail_url(&card.href)?;
        info!("First article URL: {}", detail_url);

        renderer.navigate(&detail_url).await?;
        renderer.wait_for_visible(&selectors.feed_container_selector, timeout).await?;
        renderer.wait_for_visible(&selectors.create_time_selector, timeout).await?;

        let raw_time = read_required(renderer, &selectors.create_time_selector).await?;
        let relative_age = parse_relative_age(&raw_time)?;
        debug!("Post {} is {} old", detail_url, relative_age);

        let age_verdict = self.filter.check_age(&relative_age);
        if !age_verdict.qualifies() {
            return Ok(AccountOutcome::Skipped {
                detail_url,
                verdict: age_verdict,
            });
        }

        renderer.wait_for_visible(&selectors.body_selector, timeout).await?;
        let body_text = read_required(renderer, &selectors.body_selector).await?;

        let post = FeedPost {
            detail_url,
            is_pinned: card.is_pinned,
            relative_age,
            body_text,
        };

        let verdict = self.filter.evaluate(&post);
        if !verdict.qualifies() {
            return Ok(AccountOutcome::Skipped {
                detail_url: post.detail_url,
                verdict,
            });
        }

        info!("Sending {} alert for {}", self.channel.name(), account);
        let title = format!("{}{}", self.config.title_prefix, account);
        let payload = build_payload(&title, post.body_text.trim(), self.config.notify.at_all);
        let response = self.channel.send(&payload).await?;

        Ok(AccountOutcome::Notified {
            detail_url: post.detail_url,
            response,
        })
    }
}

async fn read_required(renderer: &dyn PageRenderer, selector: &str) -> Result<String> {
    renderer
        .read_text(selector, 0)
        .await?
        .ok_or_else(|| WatchError::Renderer(format!("'{}' is missing from the page", selector)))
}
