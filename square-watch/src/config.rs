use crate::types::{Result, WatchConfig, WatchError};
use std::env;
use std::path::Path;
use tracing::{debug, info};

pub const ENV_TOKEN: &str = "dingding_token";
pub const ENV_ACCOUNTS: &str = "SQUARE_WATCH_ACCOUNTS";
pub const ENV_THRESHOLD: &str = "SQUARE_WATCH_THRESHOLD";
pub const ENV_INTERVAL: &str = "SQUARE_WATCH_INTERVAL_SECS";

impl WatchConfig {
    /// Build the configuration once at startup: defaults, then the optional
    /// JSON file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config: WatchConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Applies overrides from a key lookup. Takes a closure so tests don't
    /// have to touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_TOKEN) {
            self.notify.access_token = token.trim().to_string();
        }

        if let Some(accounts) = lookup(ENV_ACCOUNTS) {
            self.accounts = accounts
                .split(',')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
            debug!("Accounts overridden from {}: {:?}", ENV_ACCOUNTS, self.accounts);
        }

        if let Some(threshold) = lookup(ENV_THRESHOLD) {
            self.freshness_threshold_minutes = threshold.trim().parse().map_err(|_| {
                WatchError::Config(format!("{} must be a non-negative integer, got '{}'", ENV_THRESHOLD, threshold))
            })?;
        }

        if let Some(interval) = lookup(ENV_INTERVAL) {
            self.poll_interval_seconds = interval.trim().parse().map_err(|_| {
                WatchError::Config(format!("{} must be a number of seconds, got '{}'", ENV_INTERVAL, interval))
            })?;
        }

        Ok(())
    }

    /// Rejects configurations that would make the loop useless or spin.
    pub fn validate(&self, require_token: bool) -> Result<()> {
        if require_token && self.notify.access_token.is_empty() {
            return Err(WatchError::MissingToken);
        }
        if self.accounts.is_empty() {
            return Err(WatchError::Config("at least one account must be configured".to_string()));
        }
        if self.poll_interval_seconds == 0 {
            return Err(WatchError::Config("poll_interval_seconds must be greater than zero".to_string()));
        }
        if self.page_wait_timeout_seconds == 0 {
            return Err(WatchError::Config("page_wait_timeout_seconds must be greater than zero".to_string()));
        }
        if self.keyword_filter_enabled && self.keywords.iter().all(|k| k.is_empty()) {
            return Err(WatchError::Config("keyword filter is enabled but no keywords are configured".to_string()));
        }
        url::Url::parse(&self.site.base_url)?;
        url::Url::parse(&self.notify.webhook_url)?;
        Ok(())
    }
}
