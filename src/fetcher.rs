//! Feed fetching for feedwatch.
//!
//! This module fetches and parses RSS/Atom feeds with resource limits.

use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;

use crate::config::FetchConfig;
use crate::{FeedwatchError, Result};

/// User agent string for feed fetching.
const USER_AGENT: &str = "feedwatch/0.1 (feed watcher)";

/// An item extracted from a fetched feed.
#[derive(Debug, Clone)]
pub struct FetchedItem {
    /// Item title.
    pub title: String,
    /// Link to the original article.
    pub link: Option<String>,
    /// When the item was published. Items without a publication time cannot
    /// be evaluated for freshness.
    pub published_at: Option<DateTime<Utc>>,
}

/// Source of feed items, abstracted so the watcher can be driven in tests.
#[allow(async_fn_in_trait)]
pub trait FeedFetcher {
    /// Fetch and parse the feed at `url`, in document order.
    async fn fetch(&self, url: &str) -> Result<Vec<FetchedItem>>;
}

/// HTTP feed fetcher with resource limits.
pub struct HttpFeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl HttpFeedFetcher {
    /// Create a new fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedwatchError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }
}

impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<FetchedItem>> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedwatchError::Fetch(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FeedwatchError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        // Check content length if available
        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(FeedwatchError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FeedwatchError::Fetch(format!("failed to read response: {}", e)))?;

        // Check actual size
        if bytes.len() as u64 > self.max_feed_size {
            return Err(FeedwatchError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        parse_items(&bytes)
    }
}

/// Validate that a URL is a plausible feed location.
///
/// Watchlist entries are operator-maintained, so this only rejects lines
/// that cannot be fetched at all: non-HTTP schemes and hostless URLs.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| FeedwatchError::Fetch(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FeedwatchError::Fetch(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(FeedwatchError::Fetch("URL has no host".to_string()));
    }

    Ok(())
}

/// Parse feed bytes into items.
fn parse_items(bytes: &[u8]) -> Result<Vec<FetchedItem>> {
    let feed = parser::parse(bytes)
        .map_err(|e| FeedwatchError::Fetch(format!("failed to parse feed: {}", e)))?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());
            let link = entry.links.first().map(|l| l.href.clone());
            // Publication time only. An entry's updated stamp moves on every
            // edit and must not make an old item look new again.
            let published_at = entry.published;

            FetchedItem {
                title,
                link,
                published_at,
            }
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_url_valid_https() {
        assert!(validate_url("https://example.com/feed.xml").is_ok());
    }

    #[test]
    fn test_validate_url_valid_http() {
        assert!(validate_url("http://example.com/feed.xml").is_ok());
    }

    #[test]
    fn test_validate_url_invalid_scheme() {
        let result = validate_url("ftp://example.com/feed.xml");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unsupported URL scheme"));
    }

    #[test]
    fn test_validate_url_not_a_url() {
        let result = validate_url("not a url");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid URL"));
    }

    #[test]
    fn test_new_fetcher_from_defaults() {
        assert!(HttpFeedFetcher::new(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn test_parse_items_rss() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    <item>
      <title>First Article</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
      <pubDate>Wed, 01 May 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second Article</title>
      <link>https://example.com/2</link>
      <guid>guid-2</guid>
    </item>
  </channel>
</rss>"#;

        let items = parse_items(rss.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First Article");
        assert_eq!(items[0].link, Some("https://example.com/1".to_string()));
        assert_eq!(
            items[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
        // No pubDate, no publication time
        assert!(items[1].published_at.is_none());
    }

    #[test]
    fn test_parse_items_atom() {
        let atom = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <entry>
    <id>urn:uuid:1</id>
    <title>Atom Entry</title>
    <link href="https://example.com/entry"/>
    <published>2024-05-01T10:00:00Z</published>
    <updated>2024-06-01T10:00:00Z</updated>
  </entry>
</feed>"#;

        let items = parse_items(atom.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Atom Entry");
        assert_eq!(
            items[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_items_atom_updated_only_has_no_publication_time() {
        let atom = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <entry>
    <id>urn:uuid:1</id>
    <title>Edited Entry</title>
    <updated>2024-06-01T10:00:00Z</updated>
  </entry>
</feed>"#;

        let items = parse_items(atom.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].published_at.is_none());
    }

    #[test]
    fn test_parse_items_untitled() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <item>
      <guid>1</guid>
    </item>
  </channel>
</rss>"#;

        let items = parse_items(rss.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Untitled");
        assert!(items[0].link.is_none());
    }

    #[test]
    fn test_parse_items_invalid() {
        let invalid = "This is not XML";
        assert!(parse_items(invalid.as_bytes()).is_err());
    }
}
