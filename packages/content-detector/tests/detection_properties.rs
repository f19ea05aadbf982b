//! Property tests for detection invariants.
//!
//! Whatever the candidate, confidence stays in 0..=100, relevance agrees with
//! the threshold, categories are never empty and detection is repeatable.

use content_detector::detector::{detect_platform, score};
use content_detector::{
    CandidateMetadata, ContentCandidate, ContentCategory, DetectionEngine, RELEVANCE_THRESHOLD,
};
use proptest::prelude::*;

fn vocabulary_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("bambi".to_string()),
            Just("sleep".to_string()),
            Just("hypnosis".to_string()),
            Just("pink".to_string()),
            Just("video".to_string()),
            Just("audio".to_string()),
            "[a-z]{1,8}",
        ],
        0..24,
    )
    .prop_map(|words| words.join(" "))
}

fn candidate() -> impl Strategy<Value = ContentCandidate> {
    (
        prop::option::of(prop_oneof![
            "https://[a-z]{1,10}\\.(com|org)/[a-z0-9-]{0,20}",
            Just("https://bambicloud.com/bambi/sleep/hypno".to_string()),
            Just("https://hypnotube.com/video/1".to_string()),
            ".{0,40}",
        ]),
        prop::option::of(vocabulary_text()),
        prop::option::of(vocabulary_text()),
        prop::option::of(vocabulary_text()),
    )
        .prop_filter_map("candidate must carry something", |(url, content, title, description)| {
            let candidate = ContentCandidate {
                url,
                content: content.map(Into::into),
                metadata: CandidateMetadata {
                    title,
                    description,
                    mime_type: None,
                },
                ..Default::default()
            };
            DetectionEngine::default().detect(&candidate).ok().map(|_| candidate)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn test_confidence_bounded_and_relevance_consistent(candidate in candidate()) {
        let result = DetectionEngine::default().detect(&candidate).unwrap();

        prop_assert!(result.confidence <= 100);
        prop_assert_eq!(result.is_relevant, result.confidence >= RELEVANCE_THRESHOLD);
    }

    #[test]
    fn test_categories_never_empty(candidate in candidate()) {
        let result = DetectionEngine::default().detect(&candidate).unwrap();

        prop_assert!(!result.content_types.is_empty());
        if result.content_types.contains(&ContentCategory::Unknown) {
            prop_assert_eq!(result.content_types.len(), 1);
        }
    }

    #[test]
    fn test_detection_is_repeatable(candidate in candidate()) {
        let engine = DetectionEngine::default();
        let first = engine.detect(&candidate).unwrap();
        let second = engine.detect(&candidate).unwrap();

        prop_assert_eq!(first.confidence, second.confidence);
        prop_assert_eq!(first.pattern_matches, second.pattern_matches);
        prop_assert_eq!(first.content_types, second.content_types);
        prop_assert_eq!(first.platform, second.platform);
    }

    #[test]
    fn test_raw_score_clamps_to_confidence(text in vocabulary_text(), title in vocabulary_text()) {
        let metadata = CandidateMetadata { title: Some(title), ..Default::default() };
        let result = score(&text, &metadata, None, None);

        prop_assert_eq!(u32::from(result.confidence), result.raw_score.min(100));
    }

    #[test]
    fn test_platform_detection_never_panics(input in ".{0,64}") {
        let _ = detect_platform(Some(input.as_str()));
    }
}

#[test]
fn test_platform_for_non_urls_is_none() {
    assert_eq!(detect_platform(None), None);
    assert_eq!(detect_platform(Some("")), None);
    assert_eq!(detect_platform(Some("not a url")), None);
    assert_eq!(detect_platform(Some("hello")), None);
}
