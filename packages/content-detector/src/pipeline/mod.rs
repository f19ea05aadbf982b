//! Agent operations built on the detection engine.
//!
//! - [`discover`] - single-pass relevance discovery across sources
//! - [`validate`] - moderation of a single item
//! - [`knowledge`] - analyses over the accumulated knowledge counters
//! - [`crawl`] - three-step analyze / reconcile / enrich loop
//! - [`analysis`] - capability-driven analysis of one item

pub mod analysis;
pub mod crawl;
pub mod discover;
pub mod knowledge;
pub mod validate;

use serde::Serialize;

use crate::config::AgentConfig;
use crate::detector::DetectionEngine;
use crate::error::Result;
use crate::moderation::ModerationEngine;
use crate::stats::{StatsAggregate, StatsSnapshot};
use crate::stores::MemoryKnowledgeStore;
use crate::traits::{ContentDetector, KnowledgeStore};
use crate::types::{ContentCandidate, ContentCategory, DetectionResult};

pub use analysis::{AnalysisDepth, Capability, UniversalAnalysis};
pub use crawl::{CrawlRequest, CrawlSession, CrawlSessionReport};
pub use discover::DiscoveryReport;
pub use knowledge::{AnalysisResult, KnowledgeDepth, KnowledgeReport};
pub use validate::ValidationReport;

/// A detection failure captured for one item of a batch.
///
/// Serializes in the same shape as a failed crawl item, with `processed`
/// always false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub url: String,
    pub error: String,
    pub processed: bool,
}

impl ItemFailure {
    pub fn new(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            error: error.to_string(),
            processed: false,
        }
    }
}

/// Snapshot of the agent's configuration and counters.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub capabilities: Vec<&'static str>,
    pub stats: StatsSnapshot,
    pub config: AgentConfig,
}

/// The content agent.
///
/// Owns its counters exclusively; every mutating operation takes `&mut self`
/// so one instance can never run two operations at once.
///
/// # Example
///
/// ```rust,ignore
/// let mut agent = Agent::in_memory(AgentConfig::default());
///
/// let report = agent.discover(&sources, &[], Depth::Deep).await?;
/// println!("Discovered {} of {}", report.discovered, report.processed);
/// ```
pub struct Agent<D: ContentDetector, K: KnowledgeStore> {
    detector: D,
    store: K,
    config: AgentConfig,
    moderation: ModerationEngine,
    stats: StatsAggregate,
    sessions: Vec<CrawlSession>,
}

impl Agent<DetectionEngine, MemoryKnowledgeStore> {
    /// Agent backed by the built-in engine and an empty in-memory store.
    pub fn in_memory(config: AgentConfig) -> Self {
        let engine = DetectionEngine::new(config.max_content_len);
        Self::with_config(engine, MemoryKnowledgeStore::new(), config)
    }
}

impl<D: ContentDetector, K: KnowledgeStore> Agent<D, K> {
    pub fn new(detector: D, store: K) -> Self {
        Self::with_config(detector, store, AgentConfig::default())
    }

    pub fn with_config(detector: D, store: K, config: AgentConfig) -> Self {
        let moderation = ModerationEngine::new(config.moderation, config.auto_moderation);
        Self {
            detector,
            store,
            config,
            moderation,
            stats: StatsAggregate::default(),
            sessions: Vec::new(),
        }
    }

    /// Start from previously accumulated counters.
    pub fn with_stats(mut self, stats: StatsAggregate) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn stats(&self) -> &StatsAggregate {
        &self.stats
    }

    /// Closed crawl sessions with their full step results, oldest first.
    pub fn sessions(&self) -> &[CrawlSession] {
        &self.sessions
    }

    /// Consume the agent, keeping its counters.
    pub fn into_stats(self) -> StatsAggregate {
        self.stats
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    /// Run detection on one candidate. Errors propagate to the caller.
    pub async fn detect_content(&self, candidate: &ContentCandidate) -> Result<DetectionResult> {
        Ok(self.detector.detect(candidate).await?)
    }

    pub fn status(&self) -> AgentStatus {
        AgentStatus {
            capabilities: self.config.enabled_capabilities(),
            stats: self.stats.snapshot(),
            config: self.config.clone(),
        }
    }
}

/// Whether a detection falls inside a content-type focus list.
///
/// An empty focus list means every category.
pub(crate) fn in_focus(detection: &DetectionResult, focus: &[ContentCategory]) -> bool {
    focus.is_empty() || focus.iter().any(|c| detection.has_category(*c))
}
