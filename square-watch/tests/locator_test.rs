mod common;

use common::{init_tracing, FakeLauncher, FakePage};
use square_watch::{locate_first_unpinned, Account, FeedCard, PageRenderer, RendererLauncher, SiteConfig, WatchError};

const FEED: &str = "https://feed.test/";

async fn locate(page: FakePage) -> square_watch::Result<FeedCard> {
    init_tracing();
    let site = SiteConfig::default();
    let renderer = FakeLauncher::new().page(FEED, page).launch().await?;
    renderer.navigate(FEED).await?;
    locate_first_unpinned(renderer.as_ref(), &site, &Account::new("binance_news")).await
}

#[tokio::test]
async fn test_first_post_when_nothing_pinned() {
    let site = SiteConfig::default();
    let page = FakePage::feed(&site, &[("新的空投", "/square/post/1"), ("市场回顾", "/square/post/2")]);
    assert_eq!(locate(page).await.unwrap().href, "/square/post/1");
}

#[tokio::test]
async fn test_skips_leading_pinned_posts() {
    let site = SiteConfig::default();
    let page = FakePage::feed(
        &site,
        &[
            ("置顶 欢迎来到币安广场", "/square/post/10"),
            ("置顶 社区规则", "/square/post/11"),
            ("置顶 常见问题", "/square/post/12"),
            ("最新公告", "/square/post/13"),
            ("更早的公告", "/square/post/14"),
        ],
    );
    assert_eq!(locate(page).await.unwrap().href, "/square/post/13");
}

#[tokio::test]
async fn test_all_pinned_feed_terminates() {
    let site = SiteConfig::default();
    let page = FakePage::feed(&site, &[("置顶 一", "/square/post/1"), ("置顶 二", "/square/post/2")]);

    match locate(page).await {
        Err(WatchError::NoPostFound { account, scanned }) => {
            assert_eq!(account, "binance_news");
            assert_eq!(scanned, 2);
        }
        other => panic!("expected NoPostFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_feed_is_no_post_found() {
    let result = locate(FakePage::new()).await;
    assert!(matches!(result, Err(WatchError::NoPostFound { scanned: 0, .. })));
}

#[tokio::test]
async fn test_post_without_link_is_passed_over() {
    let site = SiteConfig::default();
    let page = FakePage::new()
        .with_card(&site, "没有链接的帖子", None)
        .with_card(&site, "有链接的帖子", Some("/square/post/99"));

    let card = locate(page).await.unwrap();
    assert_eq!(card.index, 1);
    assert_eq!(card.href, "/square/post/99");
    assert!(!card.is_pinned);
}

#[tokio::test]
async fn test_link_is_read_from_its_own_card() {
    let site = SiteConfig::default();
    let page = FakePage::new()
        .with_card(&site, "置顶 欢迎", Some("/square/post/1"))
        .with_card(&site, "转发的图片", None)
        .with_card(&site, "最新公告", Some("/square/post/3"));

    let card = locate(page).await.unwrap();
    assert_eq!(card.index, 2);
    assert_eq!(card.href, "/square/post/3");
}
