use crate::traits::FeedSource;
use crate::types::{RawFeed, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use tracing::{debug, warn};

/// A feed reachable over HTTP(S).
pub struct RssFeedSource {
    pub url: String,
    fetcher: Fetcher,
}

impl RssFeedSource {
    pub fn new(url: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            url: url.into(),
            fetcher,
        }
    }

    /// One source per URL, sharing a single HTTP client.
    pub fn from_urls(urls: &[String], fetcher: &Fetcher) -> Vec<Self> {
        urls.iter()
            .map(|url| Self::new(url.clone(), fetcher.clone()))
            .collect()
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    fn source_id(&self) -> String {
        self.url.clone()
    }

    async fn pull(&self) -> Result<RawFeed> {
        let content = self.fetcher.fetch_feed(&self.url).await?;

        if !FeedParser::is_valid_feed_content(&content) {
            warn!("Content from {} does not look like a feed", self.url);
        }

        let feed = FeedParser::parse_feed(&content)?;

        debug!("Pulled {} entries from {}", feed.items.len(), self.url);
        Ok(feed)
    }
}
