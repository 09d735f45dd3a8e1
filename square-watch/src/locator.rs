use crate::traits::PageRenderer;
use crate::types::{is_pinned, Account, Result, SiteConfig, WatchError};
use tracing::debug;

/// A post card picked from the rendered feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCard {
    pub index: usize,
    pub href: String,
    pub is_pinned: bool,
}

/// Finds the first post in a rendered feed that is not pinned.
///
/// The scan is bounded by the number of post cards present when it starts,
/// so a feed made only of pinned posts ends in `NoPostFound`. The link is
/// read from inside each card, so a card without one never borrows the link
/// of a neighbour.
pub async fn locate_first_unpinned(
    renderer: &dyn PageRenderer,
    site: &SiteConfig,
    account: &Account,
) -> Result<FeedCard> {
    let rendered = renderer.count(&site.post_text_selector).await?;
    debug!("Feed for {} rendered {} post cards", account, rendered);

    for index in 0..rendered {
        let card_text = renderer
            .read_text(&site.post_text_selector, index)
            .await?
            .unwrap_or_default();

        if is_pinned(&card_text, &site.pinned_marker) {
            debug!("Skipping pinned post #{} for {}", index, account);
            continue;
        }

        let href = renderer
            .read_child_attribute(&site.post_text_selector, index, &site.post_link_selector, "href")
            .await?;

        match href {
            Some(href) if !href.trim().is_empty() => {
                return Ok(FeedCard {
                    index,
                    href: href.trim().to_string(),
                    is_pinned: false,
                })
            }
            _ => debug!("Post #{} for {} has no link, moving on", index, account),
        }
    }

    Err(WatchError::NoPostFound {
        account: account.handle.clone(),
        scanned: rendered,
    })
}
