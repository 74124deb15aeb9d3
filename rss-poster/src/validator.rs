use crate::types::RawEntry;
use tracing::warn;
use url::Url;

/// Why an entry was kept out of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("missing guid")]
    MissingGuid,

    #[error("missing title")]
    MissingTitle,

    #[error("missing link")]
    MissingLink,

    #[error("invalid link '{link}': {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: url::ParseError,
    },
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Checks the fields every item needs and hands back the parsed link.
pub fn validate(entry: &RawEntry) -> Result<Url, Rejection> {
    present(entry.guid.as_deref()).ok_or(Rejection::MissingGuid)?;
    present(entry.title.as_deref()).ok_or(Rejection::MissingTitle)?;
    let link = present(entry.link.as_deref()).ok_or(Rejection::MissingLink)?;

    Url::parse(link.trim()).map_err(|source| Rejection::InvalidLink {
        link: link.to_string(),
        source,
    })
}

/// Like [`validate`], but logs the rejection.
pub fn accept(entry: &RawEntry) -> Option<Url> {
    match validate(entry) {
        Ok(link) => Some(link),
        Err(reason) => {
            warn!("Invalid item ({}): {:?}", reason, entry);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> RawEntry {
        RawEntry {
            guid: Some("guid-1".to_string()),
            title: Some("Title".to_string()),
            link: Some("https://example.com/a".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn complete_entry_is_accepted() {
        let link = validate(&entry()).unwrap();
        assert_eq!(link.as_str(), "https://example.com/a");
    }

    #[test]
    fn empty_guid_is_rejected() {
        let mut e = entry();
        e.guid = Some(String::new());
        assert!(matches!(validate(&e), Err(Rejection::MissingGuid)));

        e.guid = None;
        assert!(matches!(validate(&e), Err(Rejection::MissingGuid)));
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut e = entry();
        e.title = Some("   ".to_string());
        assert!(matches!(validate(&e), Err(Rejection::MissingTitle)));
    }

    #[test]
    fn missing_or_broken_link_is_rejected() {
        let mut e = entry();
        e.link = None;
        assert!(matches!(validate(&e), Err(Rejection::MissingLink)));

        e.link = Some("not a url".to_string());
        assert!(matches!(validate(&e), Err(Rejection::InvalidLink { .. })));
        assert!(accept(&e).is_none());
    }
}
