/// A watched social-feed account, e.g. `binance_news`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Account {
    pub handle: String,
}

impl Account {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
        }
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.handle)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Other(String),
}

const SECOND_PREFIXES: &[&str] = &["秒", "second", "sec"];
const MINUTE_PREFIXES: &[&str] = &["分钟", "minute", "min"];
const HOUR_PREFIXES: &[&str] = &["小时", "hour"];
const DAY_PREFIXES: &[&str] = &["天", "day"];

impl TimeUnit {
    /// Classifies a unit token such as `分钟前` or `minutes` by prefix.
    pub fn from_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        let has_prefix = |prefixes: &[&str]| prefixes.iter().any(|p| lowered.starts_with(p));

        if has_prefix(MINUTE_PREFIXES) {
            TimeUnit::Minutes
        } else if has_prefix(SECOND_PREFIXES) {
            TimeUnit::Seconds
        } else if has_prefix(HOUR_PREFIXES) {
            TimeUnit::Hours
        } else if has_prefix(DAY_PREFIXES) {
            TimeUnit::Days
        } else {
            TimeUnit::Other(label.to_owned())
        }
    }
}

/// Elapsed time as shown by the feed, e.g. `3 分钟前`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelativeAge {
    pub magnitude: u32,
    pub unit: TimeUnit,
    // raw unit token, kept for logging
    pub label: String,
}

impl RelativeAge {
    pub fn is_minutes(&self) -> bool {
        self.unit == TimeUnit::Minutes
    }
}

impl std::fmt::Display for RelativeAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.magnitude, self.label)
    }
}

/// The first non-pinned post of an account, as seen during one poll cycle.
/// Built from the rendered page and dropped once the cycle has evaluated it.
#[derive(Clone, Debug)]
pub struct FeedPost {
    pub detail_url: String,
    pub is_pinned: bool,
    pub relative_age: RelativeAge,
    pub body_text: String,
}

pub fn is_pinned(card_text: &str, marker: &str) -> bool {
    !marker.is_empty() && card_text.contains(marker)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub timestamp_label: String,
    pub mention_all: bool,
}
