//! Multi-Signal Content Detection and Moderation
//!
//! Classifies candidate content (a URL, raw text or bytes, and optional
//! metadata) for relevance to a single topical domain, and drives discovery,
//! moderation and crawl workflows on top of that classification.
//!
//! # Design Philosophy
//!
//! - Every detector is a pure, deterministic function of its input
//! - No fetching: callers bring the content, the library only inspects it
//! - Per-item failures are data, collaborator failures are errors
//! - Counters have one owner; operations that mutate them take `&mut self`
//!
//! # Usage
//!
//! ```rust,ignore
//! use content_detector::{Agent, AgentConfig, ContentCandidate, ModerationLevel};
//!
//! let mut agent = Agent::in_memory(AgentConfig::default());
//!
//! let candidate = ContentCandidate::for_url("https://soundcloud.com/bambi-sleep-audio")
//!     .with_title("Bambi Sleep - Deep Hypnosis");
//! let report = agent.validate(&candidate, ModerationLevel::Moderate, true).await?;
//! println!("{}", report.validation.recommendation);
//! ```
//!
//! # Modules
//!
//! - [`detector`] - Detection engine and its sub-detectors
//! - [`moderation`] - Moderation decision table and auto actions
//! - [`pipeline`] - Agent operations (discover, validate, crawl, ...)
//! - [`stats`] - Running counters owned by the agent
//! - [`traits`] - Detector and knowledge-store abstractions
//! - [`stores`] - Knowledge store implementations
//! - [`testing`] - Mock implementations for testing

pub mod config;
pub mod detector;
pub mod error;
pub mod moderation;
pub mod pipeline;
pub mod response;
pub mod stats;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::{AgentConfig, ModerationRules};
pub use detector::{DetectionEngine, RELEVANCE_THRESHOLD};
pub use error::{DetectionError, KnowledgeError, PipelineError, Result};
pub use moderation::{
    ActionType, ModerationAction, ModerationDecision, ModerationEngine, ModerationLevel,
    Recommendation,
};
pub use pipeline::{
    Agent, AgentStatus, AnalysisDepth, AnalysisResult, Capability, CrawlRequest, CrawlSession,
    CrawlSessionReport, DiscoveryReport, ItemFailure, KnowledgeDepth, KnowledgeReport,
    UniversalAnalysis, ValidationReport,
};
pub use response::ToolResponse;
pub use stats::{StatsAggregate, StatsSnapshot};
pub use stores::MemoryKnowledgeStore;
pub use traits::{ContentDetector, KnowledgeKind, KnowledgeStore};
pub use types::{
    AnalysisType, CandidateContent, CandidateMetadata, ContentCandidate, ContentCategory, Depth,
    DetectionResult, Platform,
};
