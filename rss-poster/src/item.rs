use crate::types::{FeedMetadata, RawEntry};
use crate::validator;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

/// A validated feed entry plus the metadata gathered from every feed that listed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub guid: String,
    pub title: String,
    pub link: Url,
    pub pub_date: Option<DateTime<Utc>>,
    pub content: String,
    pub media_url: Option<Url>,
    pub languages: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl Item {
    /// Validates and normalizes a raw entry. Rejections are logged.
    pub fn from_raw(entry: &RawEntry) -> Option<Self> {
        let link = validator::accept(entry)?;

        Some(Self {
            guid: entry.guid.clone().unwrap_or_default(),
            title: entry.title.as_deref().unwrap_or_default().trim().to_string(),
            link,
            pub_date: entry.pub_date.as_deref().and_then(parse_timestamp),
            content: entry.content.as_deref().unwrap_or_default().trim().to_string(),
            media_url: entry
                .media_thumbnail_url
                .as_deref()
                .and_then(|u| Url::parse(u.trim()).ok()),
            languages: BTreeSet::new(),
            categories: BTreeSet::new(),
        })
    }

    /// Records one contribution of this item by a feed.
    pub fn add_metadata(&mut self, feed: FeedMetadata<'_>) {
        self.languages
            .insert(feed.language.unwrap_or_default().to_string());
        if let Some(title) = feed.title {
            self.add_categories(title.split(|c: char| !is_category_char(c)));
        }
    }

    pub fn add_categories<'a>(&mut self, categories: impl IntoIterator<Item = &'a str>) {
        self.categories.extend(
            categories
                .into_iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
        );
    }

    /// Sort key for publishing; a missing date counts as the epoch.
    pub fn sort_key(&self) -> i64 {
        self.pub_date.map(|d| d.timestamp_millis()).unwrap_or(0)
    }
}

fn is_category_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, 'æ' | 'ø' | 'å' | 'Æ' | 'Ø' | 'Å')
}

/// Accepts RFC 3339, RFC 2822 and naive ISO timestamps (read as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");

        writeln!(f, "Item {{")?;
        writeln!(f, "    guid: '{}',", self.guid)?;
        writeln!(f, "    title: '{}',", self.title)?;
        writeln!(f, "    link: '{}',", self.link)?;
        match self.pub_date {
            Some(d) => writeln!(f, "    pubDate: '{}',", d.to_rfc3339())?,
            None => writeln!(f, "    pubDate: 'none',")?,
        }
        writeln!(f, "    content: '{}',", self.content)?;
        match &self.media_url {
            Some(u) => writeln!(f, "    mediaUrl: '{}',", u)?,
            None => writeln!(f, "    mediaUrl: 'none',")?,
        }
        writeln!(f, "    languages: [{}],", join(&self.languages))?;
        writeln!(f, "    categories: [{}]", join(&self.categories))?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw() -> RawEntry {
        RawEntry {
            guid: Some("x".to_string()),
            title: Some("  Hello world \n".to_string()),
            link: Some("https://example.com/post".to_string()),
            pub_date: Some("2024-01-01T09:30:00Z".to_string()),
            content: Some("\tBody text ".to_string()),
            media_thumbnail_url: Some("https://example.com/thumb.jpg".to_string()),
        }
    }

    fn feed<'a>(title: Option<&'a str>, language: Option<&'a str>) -> FeedMetadata<'a> {
        FeedMetadata { title, language }
    }

    #[test]
    fn from_raw_trims_and_parses() {
        let item = Item::from_raw(&raw()).unwrap();

        assert_eq!(item.guid, "x");
        assert_eq!(item.title, "Hello world");
        assert_eq!(item.content, "Body text");
        assert_eq!(item.link.as_str(), "https://example.com/post");
        assert_eq!(
            item.pub_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap())
        );
        assert_eq!(
            item.media_url.as_ref().map(Url::as_str),
            Some("https://example.com/thumb.jpg")
        );
        assert!(item.languages.is_empty());
        assert!(item.categories.is_empty());
    }

    #[test]
    fn unparseable_optional_fields_become_absent() {
        let mut entry = raw();
        entry.pub_date = Some("yesterday-ish".to_string());
        entry.media_thumbnail_url = Some("::no-scheme".to_string());
        entry.content = None;

        let item = Item::from_raw(&entry).unwrap();
        assert_eq!(item.pub_date, None);
        assert_eq!(item.media_url, None);
        assert_eq!(item.content, "");
    }

    #[test]
    fn invalid_entry_yields_no_item() {
        let mut entry = raw();
        entry.guid = Some(String::new());
        assert!(Item::from_raw(&entry).is_none());
    }

    #[test]
    fn rfc2822_dates_are_understood() {
        assert_eq!(
            parse_timestamp("Mon, 01 Jan 2024 09:30:00 GMT"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-01-01T11:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap())
        );
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn categories_come_from_feed_title_words() {
        let mut item = Item::from_raw(&raw()).unwrap();
        item.add_metadata(feed(Some("Tech News Daily"), Some("en")));

        let expected: BTreeSet<String> = ["tech", "news", "daily"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(item.categories, expected);
        assert!(item.languages.contains("en"));
    }

    #[test]
    fn category_split_keeps_danish_letters() {
        let mut item = Item::from_raw(&raw()).unwrap();
        item.add_metadata(feed(Some("Nyheder på Dansk -- Økonomi/IT2"), None));

        for expected in ["nyheder", "på", "dansk", "økonomi", "it2"] {
            assert!(item.categories.contains(expected), "missing {expected}");
        }
        assert_eq!(item.categories.len(), 5);
    }

    #[test]
    fn missing_language_is_recorded_as_empty() {
        let mut item = Item::from_raw(&raw()).unwrap();
        item.add_metadata(feed(None, None));
        item.add_metadata(feed(None, Some("da")));

        assert!(item.languages.contains(""));
        assert!(item.languages.contains("da"));
        assert!(item.categories.is_empty());
    }

    #[test]
    fn repeated_metadata_is_absorbed() {
        let mut item = Item::from_raw(&raw()).unwrap();
        item.add_metadata(feed(Some("World News"), Some("en")));
        item.add_metadata(feed(Some("World News"), Some("en")));

        assert_eq!(item.languages.len(), 1);
        assert_eq!(item.categories.len(), 2);
    }

    #[test]
    fn display_lists_all_fields() {
        let mut item = Item::from_raw(&raw()).unwrap();
        item.add_metadata(feed(Some("Tech"), Some("en")));

        let text = item.to_string();
        assert!(text.contains("guid: 'x'"));
        assert!(text.contains("categories: [tech]"));
        assert!(text.contains("languages: [en]"));
    }
}
