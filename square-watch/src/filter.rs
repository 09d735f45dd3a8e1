use crate::types::{FeedPost, RelativeAge, WatchConfig};
use tracing::debug;

/// Outcome of evaluating one post against the freshness and keyword rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Qualifies { keyword: Option<String> },
    Pinned,
    /// Unit is not minutes (seconds, hours, days, ...)
    NotMinutes,
    Stale { minutes: u32 },
    NoKeyword,
}

impl Verdict {
    pub fn qualifies(&self) -> bool {
        matches!(self, Verdict::Qualifies { .. })
    }
}

/// Stage that decides whether a post is worth an alert
#[derive(Debug, Clone)]
pub struct PostFilter {
    threshold_minutes: u32,
    keywords: Vec<String>,
    keyword_filter_enabled: bool,
}

impl PostFilter {
    pub fn new(threshold_minutes: u32, keywords: Vec<String>) -> Self {
        Self {
            threshold_minutes,
            keywords: keywords.into_iter().filter(|k| !k.is_empty()).collect(),
            keyword_filter_enabled: true,
        }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(config.freshness_threshold_minutes, config.keywords.clone())
            .with_keyword_filter(config.keyword_filter_enabled)
    }

    pub fn with_keyword_filter(mut self, enabled: bool) -> Self {
        self.keyword_filter_enabled = enabled;
        self
    }

    pub fn threshold_minutes(&self) -> u32 {
        self.threshold_minutes
    }

    /// Freshness only. Checked before the body is read.
    pub fn check_age(&self, age: &RelativeAge) -> Verdict {
        if !age.is_minutes() {
            return Verdict::NotMinutes;
        }
        if age.magnitude > self.threshold_minutes {
            return Verdict::Stale { minutes: age.magnitude };
        }
        Verdict::Qualifies { keyword: None }
    }

    /// First configured keyword contained in `body`. Case-sensitive substring match.
    pub fn matched_keyword(&self, body: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|keyword| body.contains(keyword.as_str()))
            .map(|keyword| keyword.as_str())
    }

    pub fn evaluate(&self, post: &FeedPost) -> Verdict {
        if post.is_pinned {
            return Verdict::Pinned;
        }

        let age_verdict = self.check_age(&post.relative_age);
        if !age_verdict.qualifies() {
            return age_verdict;
        }

        if !self.keyword_filter_enabled {
            return Verdict::Qualifies { keyword: None };
        }

        match self.matched_keyword(&post.body_text) {
            Some(keyword) => {
                debug!("Post {} matched keyword '{}'", post.detail_url, keyword);
                Verdict::Qualifies { keyword: Some(keyword.to_string()) }
            }
            None => Verdict::NoKeyword,
        }
    }
}
