use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::types::CandidateMetadata;

static RE_META_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+name=["']([^"']+)["'][^>]+content=["']([^"']+)["'][^>]*>"#).unwrap()
});
static RE_META_OG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+property=["']og:([^"']+)["'][^>]+content=["']([^"']+)["'][^>]*>"#)
        .unwrap()
});
static RE_HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href=["'][^"']+["']"#).unwrap());
static RE_IMG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img[^>]+>").unwrap());

/// Merge caller metadata with what can be read out of the markup itself.
///
/// Plain `<meta name>` tags keep their name, Open Graph tags become `og_*` and
/// Twitter card tags become `twitter_*`. Word, link and image counts are added
/// whenever text content is present.
pub fn extract_metadata(metadata: &CandidateMetadata, markup: Option<&str>) -> Map<String, Value> {
    let mut enhanced = Map::new();

    if let Some(title) = &metadata.title {
        enhanced.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(description) = &metadata.description {
        enhanced.insert("description".into(), Value::String(description.clone()));
    }
    if let Some(mime_type) = &metadata.mime_type {
        enhanced.insert("mimeType".into(), Value::String(mime_type.clone()));
    }

    let Some(markup) = markup else {
        return enhanced;
    };

    for cap in RE_META_NAME.captures_iter(markup) {
        let name = &cap[1];
        let key = match name.strip_prefix("twitter:") {
            Some(card_field) => format!("twitter_{card_field}"),
            None => name.to_string(),
        };
        enhanced.insert(key, Value::String(cap[2].to_string()));
    }

    for cap in RE_META_OG.captures_iter(markup) {
        enhanced.insert(format!("og_{}", &cap[1]), Value::String(cap[2].to_string()));
    }

    enhanced.insert("wordCount".into(), markup.split_whitespace().count().into());
    enhanced.insert("linkCount".into(), RE_HREF.find_iter(markup).count().into());
    enhanced.insert("imageCount".into(), RE_IMG.find_iter(markup).count().into());

    enhanced
}
