use std::time::Duration;

use tv_coming::errors::SourceError;
use tv_coming::sources::{FeedFetcher, RssFeedFetcher};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>豆瓣剧集 - 即将播出</title>
    <link>https://movie.douban.com/tv/</link>
    <item>
      <title>Show A</title>
      <link>https://movie.douban.com/subject/1/</link>
      <description><![CDATA[<p>想看人数：6,000</p>]]></description>
      <category>2024 / 美国 / 剧情 悬疑</category>
    </item>
    <item>
      <title>Show B</title>
      <link>https://movie.douban.com/subject/2/</link>
      <description>想看人数：120</description>
      <category>2024 / 日本 / 动画</category>
    </item>
  </channel>
</rss>"#;

fn fetcher() -> RssFeedFetcher {
    RssFeedFetcher::new(Duration::from_secs(5), "tv-coming-test/1.0", None).unwrap()
}

#[tokio::test]
async fn test_fetch_parses_items() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/douban/tv/coming"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml; charset=utf-8")
                .set_body_string(FEED),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/douban/tv/coming", mock_server.uri());
    let items = fetcher().fetch(&url, false).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Show A");
    assert_eq!(items[0].link, "https://movie.douban.com/subject/1/");
    assert!(items[0].description.contains("想看人数：6,000"));
    assert_eq!(items[0].category, "2024 / 美国 / 剧情 悬疑");
    assert_eq!(items[1].title, "Show B");
}

#[tokio::test]
async fn test_fetch_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/douban/tv/coming", mock_server.uri());
    let err = fetcher().fetch(&url, false).await.unwrap_err();

    assert!(matches!(err, SourceError::Http { status: 500, .. }));
}

#[tokio::test]
async fn test_fetch_empty_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   "))
        .mount(&mock_server)
        .await;

    let url = format!("{}/douban/tv/coming", mock_server.uri());
    let err = fetcher().fetch(&url, false).await.unwrap_err();

    assert!(matches!(err, SourceError::EmptyResponse { .. }));
}

#[tokio::test]
async fn test_fetch_rejects_html() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Rate limited</body></html>"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/douban/tv/coming", mock_server.uri());
    let err = fetcher().fetch(&url, false).await.unwrap_err();

    assert!(matches!(err, SourceError::ParseError { .. }));
}

#[tokio::test]
async fn test_fetch_unreachable_host() {
    // Nothing listens on the discard port.
    let err = fetcher()
        .fetch("http://127.0.0.1:9/douban/tv/coming", false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SourceError::Transport { .. } | SourceError::Timeout { .. }
    ));
}

#[tokio::test]
async fn test_fetch_routes_through_configured_proxy() {
    // The mock server stands in for the proxy; the feed host does not resolve.
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&proxy)
        .await;

    let fetcher = RssFeedFetcher::new(
        Duration::from_secs(5),
        "tv-coming-test/1.0",
        Some(&proxy.uri()),
    )
    .unwrap();
    let url = "http://feed.invalid/douban/tv/coming";

    let items = fetcher.fetch(url, true).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].title, "Show B");

    let err = fetcher.fetch(url, false).await.unwrap_err();
    assert!(matches!(
        err,
        SourceError::Transport { .. } | SourceError::Timeout { .. }
    ));
}

#[tokio::test]
async fn test_fetch_without_proxy_configured_goes_direct() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/douban/tv/coming"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/douban/tv/coming", mock_server.uri());
    let items = fetcher().fetch(&url, true).await.unwrap();

    assert_eq!(items.len(), 2);
}
