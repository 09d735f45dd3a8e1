use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// Re-export the shared data model
pub use interfaces::defs::{is_pinned, Account, FeedPost, NotificationPayload, RelativeAge, TimeUnit};

pub const DEFAULT_ACCOUNTS: &[&str] = &["binance_announcement", "binance_news", "binancezh"];

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "活动", "奖励", "Alpha", "上线", "空投", "赠送", "福利", "送出", "补贴", "交易大赛", "交易竞赛",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub accounts: Vec<String>,
    /// Largest minute count still considered fresh (inclusive).
    pub freshness_threshold_minutes: u32,
    pub keyword_filter_enabled: bool,
    pub keywords: Vec<String>,
    pub poll_interval_seconds: u64,
    pub page_wait_timeout_seconds: u64,
    pub title_prefix: String,
    pub site: SiteConfig,
    pub notify: NotifyConfig,
    pub renderer: RendererConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            accounts: DEFAULT_ACCOUNTS.iter().map(|a| a.to_string()).collect(),
            freshness_threshold_minutes: 5,
            keyword_filter_enabled: true,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            poll_interval_seconds: 60,
            page_wait_timeout_seconds: 20,
            title_prefix: "bn报警通知: ".to_string(),
            site: SiteConfig::default(),
            notify: NotifyConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn page_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.page_wait_timeout_seconds)
    }

    pub fn account_list(&self) -> Vec<Account> {
        self.accounts.iter().map(Account::new).collect()
    }
}

/// Where the feed lives and how its markup is addressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub locale: String,
    pub feed_container_selector: String,
    pub post_text_selector: String,
    /// Link inside a post card, relative to the card
    pub post_link_selector: String,
    pub create_time_selector: String,
    pub body_selector: String,
    pub pinned_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.binance.com".to_string(),
            locale: "zh-CN".to_string(),
            feed_container_selector: ".feed-layout-main".to_string(),
            post_text_selector: ".feed-layout-main .FeedList .feed-content-text".to_string(),
            post_link_selector: "a".to_string(),
            create_time_selector: ".feed-layout-main .author .create-time".to_string(),
            body_selector: ".feed-layout-main .richtext-container".to_string(),
            pinned_marker: "置顶".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: String,
    /// Filled from the `dingding_token` environment variable, never from a file.
    #[serde(skip)]
    pub access_token: String,
    pub at_all: bool,
    pub attribution: String,
    pub timeout_seconds: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: "https://oapi.dingtalk.com/robot/send".to_string(),
            access_token: String::new(),
            at_all: true,
            attribution: "> sent by square-watch".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub headless: bool,
    pub no_sandbox: bool,
    pub chrome_executable: Option<PathBuf>,
    pub visibility_poll_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: true,
            chrome_executable: None,
            visibility_poll_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub checked: usize,
    pub notified: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Timed out after {waited_ms}ms waiting for '{selector}' to become visible")]
    FeedLoadTimeout { selector: String, waited_ms: u64 },

    #[error("No unpinned post found for {account} (scanned {scanned} items)")]
    NoPostFound { account: String, scanned: usize },

    #[error("Unparseable timestamp: '{raw}'")]
    UnparseableTimestamp { raw: String },

    #[error("Invalid magnitude in timestamp: '{raw}'")]
    InvalidMagnitude { raw: String },

    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),

    #[error("Renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("Renderer error: {0}")]
    Renderer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("dingding_token is not set; export it or add it to .env")]
    MissingToken,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WatchError {
    /// Only a dead renderer ends the loop; everything else skips one account.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WatchError::RendererUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
