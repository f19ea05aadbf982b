//! Additive lexicon scoring.
//!
//! Every signal adds a fixed number of points; the sum is clamped to 100 and
//! compared against the relevance threshold. The weights are part of the
//! external contract and must not drift.

use serde::{Deserialize, Serialize};

use crate::types::{CandidateMetadata, Platform};

/// Domain lexicon, matched case-insensitively as substrings.
pub const LEXICON: &[&str] = &[
    "bambi sleep",
    "bambisleep",
    "bambi",
    "bimbo",
    "feminization",
    "hypnosis",
    "sissy",
    "transformation",
    "subliminal",
    "conditioning",
    "princess",
    "doll",
    "pink",
    "giggly",
    "ditzy",
    "bubble",
    "hypno",
];

/// Minimum confidence for a candidate to count as relevant.
pub const RELEVANCE_THRESHOLD: u8 = 15;

const POINTS_PER_TERM: u32 = 10;
const URL_PRIMARY: (&str, u32) = ("bambi", 20);
const URL_SECONDARY: (&str, u32) = ("hypno", 15);
const URL_TERTIARY: (&str, u32) = ("sleep", 10);
const STRONG_PLATFORM_BONUS: u32 = 30;
const TITLE_BONUS: u32 = 25;
const DESCRIPTION_BONUS: u32 = 20;
const MAX_CONFIDENCE: u32 = 100;

/// Outcome of scoring one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceScore {
    pub is_relevant: bool,
    pub confidence: u8,
    /// Unclamped point total
    pub raw_score: u32,
    pub matches: Vec<String>,
}

/// Whether `text` contains any lexicon term.
pub fn contains_lexicon_term(text: &str) -> bool {
    let lower = text.to_lowercase();
    LEXICON.iter().any(|term| lower.contains(term))
}

/// Score a candidate against the domain lexicon.
pub fn score(
    content: &str,
    metadata: &CandidateMetadata,
    url: Option<&str>,
    platform: Option<Platform>,
) -> RelevanceScore {
    let haystack = [
        metadata.title(),
        metadata.description(),
        url.unwrap_or(""),
        content,
    ]
    .join(" ")
    .to_lowercase();

    let mut raw_score = 0;
    let mut matches = Vec::new();

    for term in LEXICON {
        if haystack.contains(term) {
            raw_score += POINTS_PER_TERM;
            matches.push((*term).to_string());
        }
    }

    if let Some(url) = url {
        let url_lower = url.to_lowercase();
        for (keyword, bonus) in [URL_PRIMARY, URL_SECONDARY, URL_TERTIARY] {
            if url_lower.contains(keyword) {
                raw_score += bonus;
            }
        }
    }

    if platform.is_some_and(Platform::is_strong_signal) {
        raw_score += STRONG_PLATFORM_BONUS;
    }

    if metadata.title.as_deref().is_some_and(contains_lexicon_term) {
        raw_score += TITLE_BONUS;
    }
    if metadata.description.as_deref().is_some_and(contains_lexicon_term) {
        raw_score += DESCRIPTION_BONUS;
    }

    let confidence = raw_score.min(MAX_CONFIDENCE) as u8;

    RelevanceScore {
        is_relevant: confidence >= RELEVANCE_THRESHOLD,
        confidence,
        raw_score,
        matches,
    }
}
