use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DetectResult, KnowledgeResult};
use crate::types::{ContentCandidate, DetectionResult};

// ============================================================================
// DETECTOR: turns a candidate into a detection result
// ============================================================================

#[async_trait]
pub trait ContentDetector: Send + Sync {
    /// Run detection on a single candidate.
    async fn detect(&self, candidate: &ContentCandidate) -> DetectResult<DetectionResult>;
}

// ============================================================================
// KNOWLEDGE BASE: existence lookup + persistence sink
// ============================================================================

/// What a knowledge entry was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeKind {
    Discovery,
}

impl KnowledgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            KnowledgeKind::Discovery => "discovery",
        }
    }
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Whether content at `url` is already known.
    async fn exists(&self, url: &str) -> KnowledgeResult<bool>;

    /// Persist a detection result.
    async fn save(&self, kind: KnowledgeKind, data: &DetectionResult) -> KnowledgeResult<()>;

    /// Content hash of what is stored for `url`, if the store tracks one.
    ///
    /// Stores that only answer existence keep the default, which makes every
    /// known URL count as unchanged.
    async fn stored_hash(&self, _url: &str) -> KnowledgeResult<Option<String>> {
        Ok(None)
    }
}
