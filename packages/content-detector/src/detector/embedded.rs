use regex::Regex;
use std::sync::LazyLock;

use super::classify::category_from_url;
use crate::types::{ContentCategory, EmbedKind, EmbeddedRef, Platform};

static RE_IFRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<iframe[^>]*\ssrc=["']([^"']+)["'][^>]*>"#).unwrap()
});
static RE_AUDIO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<audio[^>]*\ssrc=["']([^"']+)["'][^>]*>"#).unwrap()
});
static RE_YOUTUBE_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)youtube\.com/embed/([^"'&?/\s]+)"#).unwrap()
});
static RE_VIMEO_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)player\.vimeo\.com/video/([^"'&?/\s]+)"#).unwrap()
});
static RE_SOUNDCLOUD_PLAYER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)soundcloud\.com/player").unwrap());

struct PlayerPattern {
    platform: Platform,
    regex: &'static LazyLock<Regex>,
    category: ContentCategory,
}

static PLAYER_PATTERNS: [PlayerPattern; 3] = [
    PlayerPattern {
        platform: Platform::Youtube,
        regex: &RE_YOUTUBE_EMBED,
        category: ContentCategory::Video,
    },
    PlayerPattern {
        platform: Platform::Vimeo,
        regex: &RE_VIMEO_EMBED,
        category: ContentCategory::Video,
    },
    PlayerPattern {
        platform: Platform::Soundcloud,
        regex: &RE_SOUNDCLOUD_PLAYER,
        category: ContentCategory::Audio,
    },
];

/// Scan markup for nested media: iframes, platform players, audio elements.
///
/// Best-effort regex scanning; malformed markup simply yields fewer matches.
pub fn extract_embedded(markup: &str) -> Vec<EmbeddedRef> {
    if markup.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();

    for cap in RE_IFRAME.captures_iter(markup) {
        let source = cap[1].to_string();
        found.push(EmbeddedRef {
            kind: EmbedKind::Iframe,
            inferred_content_type: category_from_url(&source),
            source,
            platform: None,
            embed_id: None,
        });
    }

    for pattern in PLAYER_PATTERNS.iter() {
        for cap in pattern.regex.captures_iter(markup) {
            found.push(EmbeddedRef {
                kind: EmbedKind::VideoEmbed,
                source: cap[0].to_string(),
                platform: Some(pattern.platform),
                embed_id: cap.get(1).map(|m| m.as_str().to_string()),
                inferred_content_type: pattern.category,
            });
        }
    }

    for cap in RE_AUDIO.captures_iter(markup) {
        let source = cap[1].to_string();
        let inferred = match category_from_url(&source) {
            ContentCategory::Unknown => ContentCategory::Audio,
            category => category,
        };
        found.push(EmbeddedRef {
            kind: EmbedKind::AudioElement,
            source,
            platform: None,
            embed_id: None,
            inferred_content_type: inferred,
        });
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iframe_and_youtube_embed() {
        let markup = r#"<div><iframe width="560" src="https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0"></iframe></div>"#;
        let refs = extract_embedded(markup);

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].kind, EmbedKind::Iframe);
        assert_eq!(refs[0].source, "https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0");
        assert_eq!(refs[1].kind, EmbedKind::VideoEmbed);
        assert_eq!(refs[1].platform, Some(Platform::Youtube));
        assert_eq!(refs[1].embed_id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_audio_element_infers_type() {
        let markup = r#"<audio controls src='/media/session.mp3'></audio><audio src="/stream"></audio>"#;
        let refs = extract_embedded(markup);

        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.kind == EmbedKind::AudioElement));
        assert_eq!(refs[0].inferred_content_type, ContentCategory::Audio);
        assert_eq!(refs[1].inferred_content_type, ContentCategory::Audio);
    }

    #[test]
    fn test_soundcloud_and_vimeo_players() {
        let markup = "see https://w.soundcloud.com/player/?url=x and https://player.vimeo.com/video/76979871";
        let refs = extract_embedded(markup);

        let platforms: Vec<_> = refs.iter().filter_map(|r| r.platform).collect();
        assert_eq!(platforms, vec![Platform::Vimeo, Platform::Soundcloud]);
        assert_eq!(refs[0].embed_id.as_deref(), Some("76979871"));
        assert_eq!(refs[1].embed_id, None);
    }

    #[test]
    fn test_plain_text_and_broken_markup() {
        assert!(extract_embedded("").is_empty());
        assert!(extract_embedded("just words, nothing embedded").is_empty());
        assert!(extract_embedded("<iframe src=\"unterminated").is_empty());
    }
}
