//! Testing utilities including mock implementations.
//!
//! These are useful for exercising the agent without a real knowledge base
//! and for forcing detection failures on chosen URLs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::detector::DetectionEngine;
use crate::error::{DetectResult, DetectionError, KnowledgeError, KnowledgeResult};
use crate::traits::{ContentDetector, KnowledgeKind, KnowledgeStore};
use crate::types::{ContentCandidate, DetectionResult};

/// A mock knowledge store.
///
/// URLs can be marked as already known, optionally with a stored content
/// hash, and saves or lookups can be made to fail.
#[derive(Default)]
pub struct MockKnowledgeStore {
    /// URLs reported as existing
    existing: Arc<RwLock<HashSet<String>>>,

    /// Stored hashes by URL
    hashes: Arc<RwLock<HashMap<String, String>>>,

    /// Everything saved, in order
    saved: Arc<RwLock<Vec<(KnowledgeKind, DetectionResult)>>>,

    fail_saves: bool,
    fail_lookups: bool,

    /// URLs whose saves fail while other saves succeed
    fail_save_urls: Arc<RwLock<HashSet<String>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockStoreCall>>>,
}

/// Record of a call made to the mock store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockStoreCall {
    Exists { url: String },
    Save { kind: KnowledgeKind, url: Option<String> },
    StoredHash { url: String },
}

impl MockKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a URL as already known.
    pub fn with_existing(self, url: impl Into<String>) -> Self {
        self.existing.write().unwrap().insert(url.into());
        self
    }

    /// Report a URL as known with the given stored content hash.
    pub fn with_stored_hash(self, url: impl Into<String>, hash: impl Into<String>) -> Self {
        let url = url.into();
        self.existing.write().unwrap().insert(url.clone());
        self.hashes.write().unwrap().insert(url, hash.into());
        self
    }

    /// Make every save fail.
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Make saves of one URL fail.
    pub fn failing_save_for(self, url: impl Into<String>) -> Self {
        self.fail_save_urls.write().unwrap().insert(url.into());
        self
    }

    /// Make every existence lookup fail.
    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Everything saved so far.
    pub fn saved(&self) -> Vec<(KnowledgeKind, DetectionResult)> {
        self.saved.read().unwrap().clone()
    }

    /// URLs of everything saved so far, in order.
    pub fn saved_urls(&self) -> Vec<String> {
        self.saved
            .read()
            .unwrap()
            .iter()
            .filter_map(|(_, data)| data.url.clone())
            .collect()
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockStoreCall> {
        self.calls.read().unwrap().clone()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl KnowledgeStore for MockKnowledgeStore {
    async fn exists(&self, url: &str) -> KnowledgeResult<bool> {
        self.calls.write().unwrap().push(MockStoreCall::Exists {
            url: url.to_string(),
        });

        if self.fail_lookups {
            return Err(KnowledgeError::Unavailable {
                reason: "mock lookup failure".into(),
            });
        }

        Ok(self.existing.read().unwrap().contains(url))
    }

    async fn save(&self, kind: KnowledgeKind, data: &DetectionResult) -> KnowledgeResult<()> {
        self.calls.write().unwrap().push(MockStoreCall::Save {
            kind,
            url: data.url.clone(),
        });

        let url_fails = data
            .url
            .as_ref()
            .is_some_and(|url| self.fail_save_urls.read().unwrap().contains(url));
        if self.fail_saves || url_fails {
            return Err(KnowledgeError::Unavailable {
                reason: "mock save failure".into(),
            });
        }

        self.saved.write().unwrap().push((kind, data.clone()));
        Ok(())
    }

    async fn stored_hash(&self, url: &str) -> KnowledgeResult<Option<String>> {
        self.calls.write().unwrap().push(MockStoreCall::StoredHash {
            url: url.to_string(),
        });

        Ok(self.hashes.read().unwrap().get(url).cloned())
    }
}

/// A detector that runs the real engine but fails for chosen URLs.
pub struct ScriptedDetector {
    engine: DetectionEngine,

    /// URLs that should fail
    fail_urls: Arc<RwLock<Vec<String>>>,

    /// URLs that fail only on their nth detection (1-based)
    fail_on_call: Arc<RwLock<HashMap<String, usize>>>,

    /// URLs of every candidate seen, in order
    calls: Arc<RwLock<Vec<String>>>,
}

impl Default for ScriptedDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self {
            engine: DetectionEngine::default(),
            fail_urls: Arc::new(RwLock::new(Vec::new())),
            fail_on_call: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Mark a URL as failing.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().push(url.into());
        self
    }

    /// Fail a URL on its nth detection only, e.g. `2` to pass the crawl
    /// analysis step and fail enrichment.
    pub fn fail_url_on_call(self, url: impl Into<String>, nth: usize) -> Self {
        self.fail_on_call.write().unwrap().insert(url.into(), nth);
        self
    }

    /// URLs of every candidate seen so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ContentDetector for ScriptedDetector {
    async fn detect(&self, candidate: &ContentCandidate) -> DetectResult<DetectionResult> {
        let url = candidate.url().to_string();
        let seen = {
            let mut calls = self.calls.write().unwrap();
            calls.push(url.clone());
            calls.iter().filter(|called| **called == url).count()
        };

        let fails_now = self.fail_on_call.read().unwrap().get(&url) == Some(&seen);
        if fails_now || self.fail_urls.read().unwrap().contains(&url) {
            return Err(DetectionError::Unavailable {
                reason: format!("scripted failure for {url}"),
            });
        }

        self.engine.detect(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_detector_fails_on_nth_call() {
        let detector = ScriptedDetector::new().fail_url_on_call("https://bambicloud.com/a", 2);
        let candidate = ContentCandidate::for_url("https://bambicloud.com/a");

        assert!(detector.detect(&candidate).await.is_ok());
        assert!(detector.detect(&candidate).await.is_err());
        assert!(detector.detect(&candidate).await.is_ok());
        assert_eq!(detector.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_store_tracks_calls() {
        let store = MockKnowledgeStore::new().with_existing("https://a.com/known");

        assert!(store.exists("https://a.com/known").await.unwrap());
        assert!(!store.exists("https://a.com/new").await.unwrap());

        assert_eq!(
            store.calls(),
            vec![
                MockStoreCall::Exists { url: "https://a.com/known".into() },
                MockStoreCall::Exists { url: "https://a.com/new".into() },
            ]
        );

        store.clear_calls();
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scripted_detector_fail_url() {
        let detector = ScriptedDetector::new().fail_url("https://fail.com");

        let result = detector.detect(&ContentCandidate::for_url("https://fail.com")).await;
        assert!(matches!(result, Err(DetectionError::Unavailable { .. })));

        let ok = detector.detect(&ContentCandidate::for_url("https://ok.com")).await;
        assert!(ok.is_ok());
        assert_eq!(detector.calls().len(), 2);
    }
}
