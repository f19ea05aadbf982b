//! Integration tests for the agent workflows.
//!
//! These tests drive the public API end to end:
//! 1. Single-item detection scenarios
//! 2. Discovery passes
//! 3. The three-step crawl loop against mock and in-memory stores

use content_detector::{
    pipeline::crawl::AnalyzedItem,
    stores::calculate_hash,
    testing::{MockKnowledgeStore, ScriptedDetector},
    types::DetectionMethod,
    Agent, AgentConfig, ContentCandidate, ContentCategory, CrawlRequest, Depth, DetectionEngine,
    PipelineError, Platform, ToolResponse,
};

fn urls(items: &[AnalyzedItem]) -> Vec<&str> {
    items.iter().map(|item| item.url.as_str()).collect()
}

// ============================================================================
// Detection scenarios
// ============================================================================

#[tokio::test]
async fn test_soundcloud_session_is_relevant_audio() {
    let agent = Agent::in_memory(AgentConfig::default());
    let candidate = ContentCandidate::for_url("https://soundcloud.com/bambi-sleep-audio")
        .with_content("bambi sleep hypnosis for relaxation")
        .with_title("Bambi Sleep - Deep Hypnosis");

    let result = agent.detect_content(&candidate).await.unwrap();

    assert!(result.is_relevant);
    assert_eq!(result.confidence, 95);
    assert_eq!(result.platform, Some(Platform::Soundcloud));
    assert!(result.has_category(ContentCategory::Audio));
}

#[tokio::test]
async fn test_cooking_video_is_not_relevant() {
    let agent = Agent::in_memory(AgentConfig::default());
    let candidate = ContentCandidate::for_url("https://youtube.com/cooking-video")
        .with_content("how to cook pasta tutorial");

    let result = agent.detect_content(&candidate).await.unwrap();

    assert!(!result.is_relevant);
    assert!(result.confidence < 15);
}

#[tokio::test]
async fn test_id3_bytes_yield_signature_guess() {
    let agent = Agent::in_memory(AgentConfig::default());
    let mut bytes = b"ID3\x04\x00\x00\x00\x00\x00\x21".to_vec();
    bytes.extend_from_slice(&[0u8; 128]);
    let candidate = ContentCandidate::for_url("https://example.com/track.mp3").with_content(bytes);

    let result = agent.detect_content(&candidate).await.unwrap();

    assert!(result
        .detected_formats
        .iter()
        .any(|f| f.detection_method == DetectionMethod::Signature && f.confidence == 0.9));
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test]
async fn test_discover_nothing_reports_zeros() {
    let mut agent = Agent::in_memory(AgentConfig::default());

    let report = agent.discover(&[], &[], Depth::Deep).await;
    let value = serde_json::to_value(ToolResponse::from_result(report)).unwrap();

    assert_eq!(value["success"], true);
    assert_eq!(value["processed"], 0);
    assert_eq!(value["discovered"], 0);
    assert_eq!(value["items"], serde_json::json!([]));
}

#[tokio::test]
async fn test_discover_persists_into_memory_store() {
    let mut agent = Agent::in_memory(AgentConfig::default());
    let sources = vec![
        "https://bambicloud.com/files/1".to_string(),
        "https://example.com/gardening".to_string(),
    ];

    let report = agent.discover(&sources, &[], Depth::Surface).await.unwrap();

    assert_eq!(report.discovered, 1);
    assert_eq!(agent.store().entry_count(), 1);
    assert!(agent.store().get("https://bambicloud.com/files/1").is_some());
}

// ============================================================================
// Crawl
// ============================================================================

#[tokio::test]
async fn test_crawl_survives_failing_target() {
    let detector = ScriptedDetector::new().fail_url("https://bambicloud.com/broken");
    let mut agent = Agent::new(detector, MockKnowledgeStore::new());
    let request = CrawlRequest::new([
        "https://bambicloud.com/a",
        "https://bambicloud.com/broken",
        "https://bambicloud.com/c",
    ]);

    let report = agent.crawl(request).await.unwrap();
    let step1 = &report.results.step1;

    assert_eq!(
        urls(step1),
        vec!["https://bambicloud.com/a", "https://bambicloud.com/broken", "https://bambicloud.com/c"]
    );
    assert!(step1[0].processed);
    assert!(!step1[1].processed);
    assert!(step1[1].error.as_deref().unwrap().contains("scripted failure"));
    assert!(step1[2].processed);

    assert_eq!(report.results.step2.new_content.len(), 2);
    assert_eq!(report.stats.urls_processed, 3);
    assert_eq!(report.stats.urls_succeeded, 2);
    assert!((report.stats.completion_rate - 200.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_enrichment_bounded_by_batch_size() {
    let targets: Vec<String> = (1..=5)
        .map(|i| format!("https://hypnotube.com/video/{i}"))
        .collect();
    let mut agent = Agent::new(ScriptedDetector::new(), MockKnowledgeStore::new());

    let report = agent
        .crawl(CrawlRequest::new(targets.clone()).with_batch_size(2))
        .await
        .unwrap();

    assert_eq!(report.results.step2.new_content.len(), 5);
    let enriched: Vec<&str> = report.results.step3.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(enriched, vec![targets[0].as_str(), targets[1].as_str()]);
    assert!(report.results.step3.iter().all(|e| e.processed));

    let enhanced = report.results.step3[0].enhanced.as_ref().unwrap();
    assert_eq!(enhanced.capabilities_used, 4);
    assert!(enhanced.capabilities.trending.is_some());
}

#[tokio::test]
async fn test_reconcile_partitions_in_order() {
    let fresh = DetectionEngine::default()
        .detect(&ContentCandidate::for_url("https://bambicloud.com/same").with_depth(Depth::Comprehensive))
        .unwrap();
    let store = MockKnowledgeStore::new()
        .with_existing("https://bambicloud.com/known")
        .with_stored_hash("https://bambicloud.com/changed", "stale-hash")
        .with_stored_hash("https://bambicloud.com/same", calculate_hash(&fresh).unwrap());
    let mut agent = Agent::new(ScriptedDetector::new(), store);

    let request = CrawlRequest::new([
        "https://bambicloud.com/new-1",
        "https://bambicloud.com/known",
        "https://example.com/unrelated",
        "https://bambicloud.com/changed",
        "https://bambicloud.com/same",
        "https://bambicloud.com/new-2",
    ]);
    let report = agent.crawl(request).await.unwrap();
    let step2 = &report.results.step2;

    assert_eq!(
        urls(&step2.new_content),
        vec!["https://bambicloud.com/new-1", "https://bambicloud.com/new-2"]
    );
    assert_eq!(
        urls(&step2.existing_content),
        vec!["https://bambicloud.com/known", "https://bambicloud.com/same"]
    );
    assert_eq!(urls(&step2.updated_content), vec!["https://bambicloud.com/changed"]);

    // New items and the changed one are saved; unchanged known items are not
    assert_eq!(
        agent.store().saved_urls(),
        vec![
            "https://bambicloud.com/new-1",
            "https://bambicloud.com/changed",
            "https://bambicloud.com/new-2",
        ]
    );
}

#[tokio::test]
async fn test_crawl_content_type_focus() {
    let mut agent = Agent::new(ScriptedDetector::new(), MockKnowledgeStore::new());
    let request = CrawlRequest::new(["https://soundcloud.com/bambi", "https://hypnotube.com/video/9"])
        .with_content_types(vec![ContentCategory::Video]);

    let report = agent.crawl(request).await.unwrap();

    assert_eq!(urls(&report.results.step2.new_content), vec!["https://hypnotube.com/video/9"]);
}

#[tokio::test]
async fn test_save_failure_fails_the_crawl() {
    let store = MockKnowledgeStore::new().failing_saves();
    let mut agent = Agent::new(ScriptedDetector::new(), store);

    let result = agent.crawl(CrawlRequest::new(["https://bambicloud.com/a"])).await;

    assert!(matches!(result, Err(PipelineError::Knowledge(_))));
    assert_eq!(agent.stats().crawler.failed_sessions(), 1);
    assert!(agent.sessions()[0].results.step2.new_content.is_empty());

    let value = serde_json::to_value(ToolResponse::from_result(result)).unwrap();
    assert_eq!(value["success"], false);
    assert!(value["error"].as_str().unwrap().contains("mock save failure"));
}

#[tokio::test]
async fn test_second_crawl_finds_content_already_known() {
    let mut agent = Agent::in_memory(AgentConfig::default());
    let targets = ["https://bambicloud.com/a", "https://hypnotube.com/video/b"];

    let first = agent.crawl(CrawlRequest::new(targets)).await.unwrap();
    let second = agent.crawl(CrawlRequest::new(targets)).await.unwrap();

    assert_eq!(first.results.step2.new_content.len(), 2);
    assert!(second.results.step2.new_content.is_empty());
    assert_eq!(second.results.step2.existing_content.len(), 2);
    assert!(second.results.step3.is_empty());
    assert_eq!(second.stats.sessions, 2);
    assert_eq!(second.stats.completion_rate, 100.0);
}
