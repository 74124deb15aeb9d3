use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\'', '"'];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet {
    pub index: ByteSlice,
    pub features: Vec<FacetFeature>,
}

/// UTF-8 byte range into the post text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: usize,
    pub byte_end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: String },
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"https?://[^\s<>"]+"#).expect("valid link regex"))
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?:^|\s)#([^\s#]+)").expect("valid tag regex"))
}

/// Finds links and hashtags in `text`, in order of appearance.
pub fn detect(text: &str) -> Vec<Facet> {
    let mut facets = Vec::new();

    for m in link_pattern().find_iter(text) {
        let uri = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        facets.push(Facet {
            index: ByteSlice {
                byte_start: m.start(),
                byte_end: m.start() + uri.len(),
            },
            features: vec![FacetFeature::Link { uri: uri.to_string() }],
        });
    }

    for caps in tag_pattern().captures_iter(text) {
        let Some(m) = caps.get(1) else { continue };
        let tag = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if tag.is_empty() || tag.chars().all(|c| c.is_ascii_digit()) || tag.chars().count() > 64 {
            continue;
        }
        facets.push(Facet {
            index: ByteSlice {
                // include the leading '#'
                byte_start: m.start() - 1,
                byte_end: m.start() + tag.len(),
            },
            features: vec![FacetFeature::Tag { tag: tag.to_string() }],
        });
    }

    facets.sort_by_key(|f| f.index.byte_start);
    facets
}
