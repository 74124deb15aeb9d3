use crate::types::{PosterError, RawEntry, RawFeed, Result};
use chrono::SecondsFormat;
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use tracing::debug;

/// Turns RSS/Atom documents into [`RawFeed`] records.
pub struct FeedParser;

impl FeedParser {
    pub fn parse_feed(content: &str) -> Result<RawFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        // Keep an absent <guid> absent instead of letting feed-rs hash one up.
        let feed = parser::Builder::new()
            .id_generator(|_, _, _| String::new())
            .build()
            .parse(content.as_bytes())
            .map_err(|e| PosterError::Parse(format!("Failed to parse feed: {}", e)))?;

        Ok(Self::convert_feed(feed))
    }

    pub fn convert_feed(feed: Feed) -> RawFeed {
        let title = feed.title.map(|t| t.content);
        let language = feed.language;
        let items: Vec<RawEntry> = feed.entries.into_iter().map(Self::convert_entry).collect();

        debug!("Parsed feed {:?} with {} entries", title, items.len());
        RawFeed { title, language, items }
    }

    fn convert_entry(entry: Entry) -> RawEntry {
        let guid = Some(entry.id.clone()).filter(|id| !id.is_empty());
        let link = entry.links.first().map(|l| l.href.clone());

        // <description> / <summary> first; content:encoded only when there is no summary.
        let content = entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()));

        let pub_date = entry
            .published
            .or(entry.updated)
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true));

        RawEntry {
            guid,
            title: entry.title.map(|t| t.content),
            link,
            pub_date,
            content,
            media_thumbnail_url: media_url(&entry.media),
        }
    }

    pub fn is_valid_feed_content(content: &str) -> bool {
        let content_lower = content.to_lowercase();

        let has_feed_indicators = content_lower.contains("<rss")
            || content_lower.contains("<feed")
            || content_lower.contains("<channel");

        has_feed_indicators && content.trim_start().starts_with('<')
    }
}

/// First `media:content` URL, else the first `media:thumbnail` image.
fn media_url(media: &[feed_rs::model::MediaObject]) -> Option<String> {
    media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
        .or_else(|| {
            media
                .iter()
                .flat_map(|m| m.thumbnails.iter())
                .map(|t| t.image.uri.clone())
                .find(|uri| !uri.is_empty())
        })
}
