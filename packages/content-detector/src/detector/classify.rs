use std::collections::BTreeSet;

use super::signature::{file_extension, infer_mime_type};
use crate::types::{CandidateMetadata, ContentCategory};

/// Keywords and extensions that indicate each concrete category.
const CATEGORY_KEYWORDS: &[(ContentCategory, &[&str])] = &[
    (
        ContentCategory::Script,
        &[".txt", ".pdf", ".doc", ".docx", "script", "hypnosis", "induction", "transcript"],
    ),
    (
        ContentCategory::Audio,
        &[".mp3", ".wav", ".m4a", ".flac", ".ogg", ".aac", "audio", "sound", "voice"],
    ),
    (
        ContentCategory::Video,
        &[".mp4", ".webm", ".avi", ".mov", ".mkv", "video", "visual", "training"],
    ),
    (
        ContentCategory::Image,
        &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", "image", "pic", "photo"],
    ),
    (
        ContentCategory::Subliminal,
        &["subliminal", "binaural", "frequency", "hidden", "background", "embedded"],
    ),
    (
        ContentCategory::Interactive,
        &["game", "app", "tool", "interactive", "html5", "flash", "unity"],
    ),
    (
        ContentCategory::Social,
        &["post", "comment", "discussion", "forum", "reddit", "discord", "twitter"],
    ),
    (
        ContentCategory::Embedded,
        &["iframe", "embed", "widget", "player", "stream"],
    ),
];

/// Tag a candidate with every content category it shows evidence of.
///
/// Never returns an empty set: `{Unknown}` stands in when nothing matches.
pub fn classify(
    content: &str,
    metadata: &CandidateMetadata,
    url: Option<&str>,
) -> BTreeSet<ContentCategory> {
    let fields = [
        content.to_lowercase(),
        url.unwrap_or("").to_lowercase(),
        metadata.title().to_lowercase(),
    ];

    let mut categories: BTreeSet<ContentCategory> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| {
            keywords
                .iter()
                .any(|keyword| fields.iter().any(|field| field.contains(keyword)))
        })
        .map(|(category, _)| *category)
        .collect();

    if let Some(category) = category_from_mime(metadata, url) {
        categories.insert(category);
    }

    if categories.is_empty() {
        categories.insert(ContentCategory::Unknown);
    }

    categories
}

/// Category implied by the declared MIME type or the URL extension.
fn category_from_mime(metadata: &CandidateMetadata, url: Option<&str>) -> Option<ContentCategory> {
    let mime_type = match metadata.mime_type.as_deref() {
        Some(declared) => declared,
        None => infer_mime_type(&file_extension(url?))?,
    };

    match ContentCategory::from_mime(mime_type) {
        ContentCategory::Unknown => None,
        category => Some(category),
    }
}

/// Category for a referenced URL, by extension only.
pub fn category_from_url(url: &str) -> ContentCategory {
    infer_mime_type(&file_extension(url))
        .map(ContentCategory::from_mime)
        .unwrap_or(ContentCategory::Unknown)
}
