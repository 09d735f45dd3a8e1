use crate::types::{Account, Result, SiteConfig};
use url::Url;

/// Binance Square specific URL layout.
///
/// Profile feeds live under `/{locale}/square/profile/{account}`; post links
/// in the feed are site-relative and lack the locale segment.
pub struct BinanceSquare<'a> {
    site: &'a SiteConfig,
}

impl<'a> BinanceSquare<'a> {
    pub fn new(site: &'a SiteConfig) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &SiteConfig {
        self.site
    }

    pub fn profile_url(&self, account: &Account) -> Result<String> {
        let base = Url::parse(&self.site.base_url)?;
        let url = base.join(&format!("/{}/square/profile/{}", self.site.locale, account.handle))?;
        Ok(url.to_string())
    }

    /// Resolve a post link taken from the feed into its detail page URL.
    pub fn detail_url(&self, href: &str) -> Result<String> {
        if href.starts_with("http://") || href.starts_with("https://") {
            return Ok(Url::parse(href)?.to_string());
        }

        let base = Url::parse(&self.site.base_url)?;
        let path = if href.starts_with('/') {
            format!("/{}{}", self.site.locale, href)
        } else {
            format!("/{}/{}", self.site.locale, href)
        };
        Ok(base.join(&path)?.to_string())
    }
}
