use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

// ============================================================================
// ENUMS (type-safe vocabularies)
// ============================================================================

/// How far detection digs into a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    #[default]
    Surface,
    Deep,
    Comprehensive,
}

impl Depth {
    /// Whether embedded media references should be scanned.
    pub fn scans_embeds(self) -> bool {
        matches!(self, Depth::Deep | Depth::Comprehensive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Surface => "surface",
            Depth::Deep => "deep",
            Depth::Comprehensive => "comprehensive",
        }
    }
}

impl FromStr for Depth {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Depth::Surface),
            "deep" => Ok(Depth::Deep),
            "comprehensive" => Ok(Depth::Comprehensive),
            _ => Err(PipelineError::InvalidArgument {
                field: "depth",
                value: s.to_string(),
            }),
        }
    }
}

/// Content category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Script,
    Audio,
    Video,
    Image,
    Subliminal,
    Interactive,
    Social,
    Embedded,
    Unknown,
}

impl ContentCategory {
    /// The eight concrete categories (everything except `Unknown`).
    pub const CONCRETE: [ContentCategory; 8] = [
        ContentCategory::Script,
        ContentCategory::Audio,
        ContentCategory::Video,
        ContentCategory::Image,
        ContentCategory::Subliminal,
        ContentCategory::Interactive,
        ContentCategory::Social,
        ContentCategory::Embedded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::Script => "script",
            ContentCategory::Audio => "audio",
            ContentCategory::Video => "video",
            ContentCategory::Image => "image",
            ContentCategory::Subliminal => "subliminal",
            ContentCategory::Interactive => "interactive",
            ContentCategory::Social => "social",
            ContentCategory::Embedded => "embedded",
            ContentCategory::Unknown => "unknown",
        }
    }

    /// Map a MIME type onto a category.
    pub fn from_mime(mime_type: &str) -> ContentCategory {
        let mime = mime_type.to_ascii_lowercase();
        if mime.starts_with("audio/") {
            ContentCategory::Audio
        } else if mime.starts_with("video/") {
            ContentCategory::Video
        } else if mime.starts_with("image/") {
            ContentCategory::Image
        } else if mime.contains("pdf") || mime.starts_with("text/") {
            ContentCategory::Script
        } else {
            ContentCategory::Unknown
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = PipelineError;

    /// Accepts singular and plural spellings ("video", "videos").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        ContentCategory::CONCRETE
            .into_iter()
            .chain([ContentCategory::Unknown])
            .find(|c| c.as_str() == normalized || c.as_str() == singular)
            .ok_or_else(|| PipelineError::InvalidArgument {
                field: "content type",
                value: s.to_string(),
            })
    }
}

/// Originating site or service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Soundcloud,
    Patreon,
    Reddit,
    Discord,
    Twitter,
    Bambicloud,
    Hypnotube,
    Vimeo,
}

impl Platform {
    pub const ALL: [Platform; 9] = [
        Platform::Youtube,
        Platform::Soundcloud,
        Platform::Patreon,
        Platform::Reddit,
        Platform::Discord,
        Platform::Twitter,
        Platform::Bambicloud,
        Platform::Hypnotube,
        Platform::Vimeo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Soundcloud => "soundcloud",
            Platform::Patreon => "patreon",
            Platform::Reddit => "reddit",
            Platform::Discord => "discord",
            Platform::Twitter => "twitter",
            Platform::Bambicloud => "bambicloud",
            Platform::Hypnotube => "hypnotube",
            Platform::Vimeo => "vimeo",
        }
    }

    /// Platforms whose presence alone is a strong relevance signal.
    pub fn is_strong_signal(self) -> bool {
        matches!(self, Platform::Bambicloud | Platform::Hypnotube)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a format guess was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Signature,
    Extension,
}

/// Kind of nested media reference found in markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedKind {
    Iframe,
    VideoEmbed,
    AudioElement,
}

// ============================================================================
// INPUT
// ============================================================================

/// Raw content supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl CandidateContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            CandidateContent::Text(text) => text.as_bytes(),
            CandidateContent::Bytes(bytes) => bytes,
        }
    }

    /// Text view of the content; binary payloads are decoded lossily.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CandidateContent::Text(text) => Cow::Borrowed(text),
            CandidateContent::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for CandidateContent {
    fn from(text: String) -> Self {
        CandidateContent::Text(text)
    }
}

impl From<&str> for CandidateContent {
    fn from(text: &str) -> Self {
        CandidateContent::Text(text.to_string())
    }
}

impl From<Vec<u8>> for CandidateContent {
    fn from(bytes: Vec<u8>) -> Self {
        CandidateContent::Bytes(bytes)
    }
}

/// Caller-supplied descriptive metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub mime_type: Option<String>,
}

impl CandidateMetadata {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// The input unit to detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCandidate {
    pub url: Option<String>,
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub metadata: CandidateMetadata,
    #[serde(default)]
    pub depth: Depth,
}

impl ContentCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate identified only by its URL.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<CandidateContent>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.metadata.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_metadata(mut self, metadata: CandidateMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    /// Content as text, empty when absent.
    pub fn text(&self) -> Cow<'_, str> {
        self.content
            .as_ref()
            .map(CandidateContent::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// A guess at the real file format of some content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatGuess {
    pub mime_type: String,
    pub format: String,
    pub confidence: f32,
    pub detection_method: DetectionMethod,
}

impl FormatGuess {
    pub fn new(mime_type: &str, confidence: f32, detection_method: DetectionMethod) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            format: format_from_mime(mime_type).to_string(),
            confidence,
            detection_method,
        }
    }
}

/// Subtype half of a MIME type ("audio/mp3" -> "mp3").
pub fn format_from_mime(mime_type: &str) -> &str {
    mime_type
        .split_once('/')
        .map(|(_, sub)| sub)
        .filter(|sub| !sub.is_empty())
        .unwrap_or("unknown")
}

/// Kind of analysis run over the accumulated knowledge counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Trends,
    Relationships,
    Classification,
    Validation,
}

impl AnalysisType {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::Trends => "trends",
            AnalysisType::Relationships => "relationships",
            AnalysisType::Classification => "classification",
            AnalysisType::Validation => "validation",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trends" => Ok(AnalysisType::Trends),
            "relationships" => Ok(AnalysisType::Relationships),
            "classification" => Ok(AnalysisType::Classification),
            "validation" => Ok(AnalysisType::Validation),
            _ => Err(PipelineError::UnknownAnalysisType {
                value: s.to_string(),
            }),
        }
    }
}

/// A nested media reference found inside markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedRef {
    #[serde(rename = "type")]
    pub kind: EmbedKind,
    pub source: String,
    pub platform: Option<Platform>,
    pub embed_id: Option<String>,
    pub inferred_content_type: ContentCategory,
}

/// Full structured output of running every detector on one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub url: Option<String>,
    pub is_relevant: bool,
    pub confidence: u8,
    pub content_types: BTreeSet<ContentCategory>,
    pub platform: Option<Platform>,
    pub detected_formats: Vec<FormatGuess>,
    pub embedded_content: Vec<EmbeddedRef>,
    pub pattern_matches: Vec<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl DetectionResult {
    pub fn has_category(&self, category: ContentCategory) -> bool {
        self.content_types.contains(&category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parses_plural_forms() {
        assert_eq!("videos".parse::<ContentCategory>().unwrap(), ContentCategory::Video);
        assert_eq!("Audio".parse::<ContentCategory>().unwrap(), ContentCategory::Audio);
        assert_eq!(
            "subliminals".parse::<ContentCategory>().unwrap(),
            ContentCategory::Subliminal
        );
        assert!("podcasts".parse::<ContentCategory>().is_err());
    }

    #[test]
    fn test_category_from_mime() {
        assert_eq!(ContentCategory::from_mime("audio/mp3"), ContentCategory::Audio);
        assert_eq!(ContentCategory::from_mime("video/webm"), ContentCategory::Video);
        assert_eq!(ContentCategory::from_mime("application/pdf"), ContentCategory::Script);
        assert_eq!(ContentCategory::from_mime("text/plain"), ContentCategory::Script);
        assert_eq!(ContentCategory::from_mime("application/zip"), ContentCategory::Unknown);
    }

    #[test]
    fn test_format_from_mime() {
        assert_eq!(format_from_mime("audio/mp3"), "mp3");
        assert_eq!(format_from_mime("garbage"), "unknown");
        assert_eq!(format_from_mime("image/"), "unknown");
    }

    #[test]
    fn test_candidate_deserializes_from_camel_case() {
        let candidate: ContentCandidate = serde_json::from_value(serde_json::json!({
            "url": "https://example.com/a.mp3",
            "content": "some text",
            "metadata": { "title": "A", "mimeType": "audio/mp3" },
            "depth": "deep"
        }))
        .unwrap();

        assert_eq!(candidate.depth, Depth::Deep);
        assert_eq!(candidate.metadata.mime_type.as_deref(), Some("audio/mp3"));
        assert_eq!(candidate.text(), "some text");
    }
}
