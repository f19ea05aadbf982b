//! Detection engine and the sub-detectors it composes.
//!
//! - [`signature`] - magic-number format sniffing with extension fallback
//! - [`platform`] - URL to platform lookup
//! - [`relevance`] - lexicon confidence scoring
//! - [`classify`] - content category tagging
//! - [`embedded`] - nested media references in markup
//! - [`metadata`] - meta/Open Graph/Twitter card extraction

pub mod classify;
pub mod embedded;
pub mod metadata;
pub mod platform;
pub mod relevance;
pub mod signature;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{DetectResult, DetectionError};
use crate::traits::ContentDetector;
use crate::types::{CandidateContent, ContentCandidate, DetectionResult};

pub use classify::classify;
pub use embedded::extract_embedded;
pub use metadata::extract_metadata;
pub use platform::detect_platform;
pub use relevance::{score, RelevanceScore, LEXICON, RELEVANCE_THRESHOLD};
pub use signature::detect_format;

/// Runs every sub-detector over one candidate.
#[derive(Debug, Clone)]
pub struct DetectionEngine {
    max_content_len: usize,
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::new(16 * 1024 * 1024)
    }
}

impl DetectionEngine {
    pub fn new(max_content_len: usize) -> Self {
        Self { max_content_len }
    }

    /// Detect relevance, categories, platform, formats and embeds.
    ///
    /// Fails only on candidates that carry nothing to inspect or that exceed
    /// the content size limit; every sub-detector itself is infallible.
    pub fn detect(&self, candidate: &ContentCandidate) -> DetectResult<DetectionResult> {
        self.validate(candidate)?;

        let url = candidate.url.as_deref().filter(|u| !u.is_empty());
        let text = candidate.text();

        tracing::debug!(
            url = url.unwrap_or(""),
            depth = candidate.depth.as_str(),
            content_len = candidate.content.as_ref().map(CandidateContent::len).unwrap_or(0),
            "Starting detection"
        );

        let platform = detect_platform(url);
        let relevance = score(&text, &candidate.metadata, url, platform);
        let content_types = classify(&text, &candidate.metadata, url);

        let detected_formats = match &candidate.content {
            Some(content) => detect_format(content.as_bytes(), url),
            None => Vec::new(),
        };

        let embedded_content = if candidate.depth.scans_embeds() {
            extract_embedded(&text)
        } else {
            Vec::new()
        };

        let markup = match &candidate.content {
            Some(CandidateContent::Text(text)) => Some(text.as_str()),
            _ => None,
        };
        let metadata = extract_metadata(&candidate.metadata, markup);

        tracing::debug!(
            url = url.unwrap_or(""),
            confidence = relevance.confidence,
            is_relevant = relevance.is_relevant,
            platform = ?platform,
            categories = content_types.len(),
            formats = detected_formats.len(),
            embeds = embedded_content.len(),
            "Detection completed"
        );

        Ok(DetectionResult {
            url: url.map(str::to_string),
            is_relevant: relevance.is_relevant,
            confidence: relevance.confidence,
            content_types,
            platform,
            detected_formats,
            embedded_content,
            pattern_matches: relevance.matches,
            metadata,
            timestamp: Utc::now(),
        })
    }

    fn validate(&self, candidate: &ContentCandidate) -> DetectResult<()> {
        let has_url = candidate.url.as_deref().is_some_and(|u| !u.trim().is_empty());
        let has_content = candidate.content.as_ref().is_some_and(|c| !c.is_empty());
        let has_metadata =
            !candidate.metadata.title().is_empty() || !candidate.metadata.description().is_empty();

        if !has_url && !has_content && !has_metadata {
            return Err(DetectionError::EmptyCandidate);
        }

        if let Some(content) = &candidate.content {
            if content.len() > self.max_content_len {
                return Err(DetectionError::ContentTooLarge {
                    len: content.len(),
                    max: self.max_content_len,
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ContentDetector for DetectionEngine {
    async fn detect(&self, candidate: &ContentCandidate) -> DetectResult<DetectionResult> {
        DetectionEngine::detect(self, candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentCategory, DetectionMethod, Depth, Platform};

    #[test]
    fn test_relevant_soundcloud_audio() {
        let candidate = ContentCandidate::for_url("https://soundcloud.com/bambi-sleep-audio")
            .with_content("bambi sleep hypnosis for relaxation")
            .with_title("Bambi Sleep - Deep Hypnosis");

        let result = DetectionEngine::default().detect(&candidate).unwrap();

        assert!(result.is_relevant);
        assert_eq!(result.platform, Some(Platform::Soundcloud));
        assert!(result.has_category(ContentCategory::Audio));
    }

    #[test]
    fn test_irrelevant_cooking_video() {
        let candidate = ContentCandidate::for_url("https://youtube.com/cooking-video")
            .with_content("how to cook pasta tutorial");

        let result = DetectionEngine::default().detect(&candidate).unwrap();

        assert!(!result.is_relevant);
        assert!(result.confidence < 15);
        assert_eq!(result.platform, Some(Platform::Youtube));
    }

    #[test]
    fn test_signature_detection_only_with_content() {
        let engine = DetectionEngine::default();
        let url_only = ContentCandidate::for_url("https://example.com/track.mp3");
        let with_bytes = url_only.clone().with_content(b"ID3\x04\x00\x00\x00\x00\x00\x21".to_vec());

        assert!(engine.detect(&url_only).unwrap().detected_formats.is_empty());

        let formats = engine.detect(&with_bytes).unwrap().detected_formats;
        assert!(formats
            .iter()
            .any(|f| f.detection_method == DetectionMethod::Signature && f.confidence == 0.9));
    }

    #[test]
    fn test_embeds_scanned_only_when_deep() {
        let markup = r#"<iframe src="https://player.vimeo.com/video/1"></iframe>"#;
        let engine = DetectionEngine::default();

        let surface = ContentCandidate::for_url("https://example.com").with_content(markup);
        let deep = surface.clone().with_depth(Depth::Deep);
        let comprehensive = surface.clone().with_depth(Depth::Comprehensive);

        assert!(engine.detect(&surface).unwrap().embedded_content.is_empty());
        assert_eq!(engine.detect(&deep).unwrap().embedded_content.len(), 2);
        assert_eq!(engine.detect(&comprehensive).unwrap().embedded_content.len(), 2);
    }

    #[test]
    fn test_empty_candidate_is_rejected() {
        let err = DetectionEngine::default()
            .detect(&ContentCandidate::new())
            .unwrap_err();
        assert!(matches!(err, DetectionError::EmptyCandidate));
    }

    #[test]
    fn test_oversized_content_is_rejected() {
        let candidate = ContentCandidate::for_url("https://example.com").with_content("x".repeat(64));

        let err = DetectionEngine::new(32).detect(&candidate).unwrap_err();

        assert!(matches!(err, DetectionError::ContentTooLarge { len: 64, max: 32 }));
    }

    #[test]
    fn test_detection_is_deterministic() {
        let candidate = ContentCandidate::for_url("https://hypnotube.com/v/pink-bubble")
            .with_content("giggly ditzy doll")
            .with_description("conditioning");
        let engine = DetectionEngine::default();

        let first = engine.detect(&candidate).unwrap();
        let second = engine.detect(&candidate).unwrap();

        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.is_relevant, second.is_relevant);
        assert_eq!(first.pattern_matches, second.pattern_matches);
        assert_eq!(first.content_types, second.content_types);
    }
}
