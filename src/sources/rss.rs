//! RSS source implementation
//!
//! Fetches the feed with a single GET and extracts `title`, `link`,
//! `description` and `category` from every `<item>` with a streaming
//! quick-xml reader. Nothing here retries: a failed fetch is reported to the
//! orchestrator, which abandons the run.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::FeedFetcher;
use crate::errors::{SourceError, SourceResult};
use crate::models::CandidateItem;
use crate::utils::url::obfuscate_credentials;

const SOURCE_TYPE: &str = "rss";

/// RSS feed fetcher
///
/// Holds two clients: a direct one and, when a proxy is configured, one that
/// routes every request through it. The caller picks per fetch.
pub struct RssFeedFetcher {
    client: Client,
    proxied_client: Option<Client>,
}

impl RssFeedFetcher {
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        proxy_url: Option<&str>,
    ) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| SourceError::invalid_config("http_client", e.to_string()))?;

        let proxied_client = match proxy_url {
            Some(proxy_url) if !proxy_url.trim().is_empty() => {
                let proxy = Proxy::all(proxy_url.trim())
                    .map_err(|e| SourceError::invalid_config("proxy_url", e.to_string()))?;
                let client = Client::builder()
                    .timeout(timeout)
                    .user_agent(user_agent)
                    .proxy(proxy)
                    .build()
                    .map_err(|e| SourceError::invalid_config("http_client", e.to_string()))?;
                info!("Feed proxy configured: {}", obfuscate_credentials(proxy_url));
                Some(client)
            }
            _ => None,
        };

        Ok(Self {
            client,
            proxied_client,
        })
    }

    fn client_for(&self, use_proxy: bool) -> &Client {
        match (use_proxy, &self.proxied_client) {
            (true, Some(client)) => client,
            (true, None) => {
                warn!("Proxy requested for feed fetch but no proxy_url is configured, fetching directly");
                &self.client
            }
            _ => &self.client,
        }
    }
}

#[async_trait]
impl FeedFetcher for RssFeedFetcher {
    async fn fetch(&self, url: &str, use_proxy: bool) -> SourceResult<Vec<CandidateItem>> {
        debug!("Fetching RSS feed: {} (proxy: {})", url, use_proxy);

        let response = self
            .client_for(use_proxy)
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                message: format!(
                    "{} - URL: {}",
                    status.canonical_reason().unwrap_or("Unknown"),
                    url
                ),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;
        if body.trim().is_empty() {
            return Err(SourceError::empty_response(url));
        }

        let items = parse_rss_items(&body)?;
        debug!("Parsed {} items from {}", items.len(), url);
        Ok(items)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Link,
    Description,
    Category,
}

impl ItemField {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"description" => Some(Self::Description),
            b"category" => Some(Self::Category),
            _ => None,
        }
    }
}

/// Parse an RSS document into candidate items.
///
/// Only direct children of `<item>` are read; the first occurrence of each
/// field wins. Documents without a `<channel>` are rejected.
pub fn parse_rss_items(content: &str) -> SourceResult<Vec<CandidateItem>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut saw_channel = false;
    let mut current: Option<CandidateItem> = None;
    let mut current_field: Option<ItemField> = None;
    // Depth inside the current <item>, 1 = direct child
    let mut depth = 0usize;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                if current.is_some() {
                    depth += 1;
                    if depth == 1 {
                        current_field = ItemField::from_tag(name.as_ref());
                        text.clear();
                    }
                } else if name.as_ref() == b"item" {
                    current = Some(CandidateItem::default());
                    depth = 0;
                } else if name.as_ref() == b"channel" {
                    saw_channel = true;
                }
            }

            Ok(Event::End(ref e)) => {
                if current.is_none() {
                    continue;
                }
                if depth == 0 {
                    if e.name().as_ref() == b"item" {
                        if let Some(item) = current.take() {
                            if item.is_identifiable() {
                                items.push(item);
                            } else {
                                debug!("Dropping RSS item without title and link");
                            }
                        }
                    }
                    continue;
                }
                if depth == 1 {
                    if let (Some(item), Some(field)) = (current.as_mut(), current_field.take()) {
                        assign_field(item, field, text.trim());
                    }
                    text.clear();
                }
                depth -= 1;
            }

            Ok(Event::Text(e)) => {
                if current_field.is_some() {
                    let decoded = match e.unescape() {
                        Ok(value) => value.into_owned(),
                        Err(_) => String::from_utf8_lossy(&e).into_owned(),
                    };
                    text.push_str(&decoded);
                }
            }

            Ok(Event::CData(e)) => {
                if current_field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(SourceError::parse_error(
                    SOURCE_TYPE,
                    format!(
                        "XML parsing error at position {}: {}",
                        reader.buffer_position(),
                        e
                    ),
                ));
            }

            _ => {}
        }
    }

    if !saw_channel {
        return Err(SourceError::parse_error(
            SOURCE_TYPE,
            "document has no <channel> element",
        ));
    }

    Ok(items)
}

fn assign_field(item: &mut CandidateItem, field: ItemField, value: &str) {
    let slot = match field {
        ItemField::Title => &mut item.title,
        ItemField::Link => &mut item.link,
        ItemField::Description => &mut item.description,
        ItemField::Category => &mut item.category,
    };
    if slot.is_empty() {
        *slot = value.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>豆瓣剧集-即将播出</title>
    <link>https://movie.douban.com/tv/</link>
    <item>
      <title><![CDATA[Show A]]></title>
      <link>https://movie.douban.com/subject/123/</link>
      <description><![CDATA[<p>想看人数：6,000</p>]]></description>
      <category>2024 / 美国 / 剧情</category>
    </item>
    <item>
      <title>Show &amp; B</title>
      <link></link>
      <description>&lt;p&gt;想看人数：12&lt;/p&gt;</description>
      <category>2024 / 日本 韩国 / 喜剧</category>
      <category>ignored</category>
    </item>
    <item>
      <title></title>
      <link></link>
      <description>no identity</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parses_items_and_drops_unidentifiable() {
        let items = parse_rss_items(FEED).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Show A");
        assert_eq!(items[0].link, "https://movie.douban.com/subject/123/");
        assert_eq!(items[0].description, "<p>想看人数：6,000</p>");
        assert_eq!(items[0].category, "2024 / 美国 / 剧情");

        assert_eq!(items[1].title, "Show & B");
        assert!(items[1].link.is_empty());
        assert_eq!(items[1].description, "<p>想看人数：12</p>");
        assert_eq!(items[1].category, "2024 / 日本 韩国 / 喜剧");
    }

    #[test]
    fn test_channel_fields_do_not_leak_into_items() {
        let items = parse_rss_items(FEED).unwrap();
        assert!(items.iter().all(|i| i.title != "豆瓣剧集-即将播出"));
    }

    #[test]
    fn test_empty_channel_is_not_an_error() {
        let items = parse_rss_items("<rss><channel><title>x</title></channel></rss>").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_non_rss_document_is_rejected() {
        let result = parse_rss_items("<html><body>rate limited</body></html>");
        assert!(matches!(result, Err(SourceError::ParseError { .. })));
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        let result = parse_rss_items("<rss><channel><item><title>x</item></channel></rss>");
        assert!(matches!(result, Err(SourceError::ParseError { .. })));
    }
}
