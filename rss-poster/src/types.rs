use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;
use url::Url;

use crate::item::Item;

/// One feed as handed over by a feed source, before any validation.
#[derive(Debug, Clone, Default)]
pub struct RawFeed {
    pub title: Option<String>,
    pub language: Option<String>,
    pub items: Vec<RawEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub pub_date: Option<String>,
    pub content: Option<String>,
    pub media_thumbnail_url: Option<String>,
}

/// The feed-level fields that contribute metadata to an item.
#[derive(Debug, Clone, Copy)]
pub struct FeedMetadata<'a> {
    pub title: Option<&'a str>,
    pub language: Option<&'a str>,
}

impl<'a> From<&'a RawFeed> for FeedMetadata<'a> {
    fn from(feed: &'a RawFeed) -> Self {
        Self {
            title: feed.title.as_deref(),
            language: feed.language.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub text: String,
    pub external_link: Url,
    pub external_title: String,
    pub external_description: String,
    pub thumbnail_source_url: Option<Url>,
    pub created_at: Option<DateTime<Utc>>,
    pub languages: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl From<&Item> for PublishRequest {
    fn from(item: &Item) -> Self {
        Self {
            text: item.title.clone(),
            external_link: item.link.clone(),
            external_title: item.title.clone(),
            external_description: item.content.clone(),
            thumbnail_source_url: item.media_url.clone(),
            created_at: item.pub_date,
            languages: item.languages.clone(),
            tags: item.categories.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishReceipt {
    pub uri: String,
    pub cid: String,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "RSS-Poster/1.0".to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PosterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, PosterError>;
