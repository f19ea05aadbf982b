//! Running counters for discovery, moderation, knowledge analysis and crawls.
//!
//! A [`StatsAggregate`] is owned by exactly one agent and mutated in place
//! after every operation. Callers read it through [`StatsAggregate::snapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use uuid::Uuid;

use crate::moderation::{ActionType, ModerationAction};
use crate::types::{AnalysisType, ContentCategory, DetectionResult, Platform};

/// Platform label used for relationships when no platform was detected.
const UNKNOWN_PLATFORM: &str = "website";

// ============================================================================
// DISCOVERY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryStats {
    pub total_scanned: u64,
    pub found_count: u64,
    pub content_by_type: BTreeMap<ContentCategory, u64>,
    pub platforms: BTreeMap<Platform, u64>,
    pub confidence_history: Vec<u8>,
}

impl Default for DiscoveryStats {
    fn default() -> Self {
        Self {
            total_scanned: 0,
            found_count: 0,
            content_by_type: ContentCategory::CONCRETE.into_iter().map(|c| (c, 0)).collect(),
            platforms: BTreeMap::new(),
            confidence_history: Vec::new(),
        }
    }
}

impl DiscoveryStats {
    /// Count a scanned candidate, relevant or not.
    pub fn record_scan(&mut self, detection: &DetectionResult) {
        self.total_scanned += 1;
        self.confidence_history.push(detection.confidence);
    }

    /// Count a relevant find by category and platform.
    pub fn record_find(&mut self, detection: &DetectionResult) {
        self.found_count += 1;
        for category in &detection.content_types {
            if let Some(count) = self.content_by_type.get_mut(category) {
                *count += 1;
            }
        }
        if let Some(platform) = detection.platform {
            *self.platforms.entry(platform).or_default() += 1;
        }
    }

    /// Mean of every recorded confidence, 0 when nothing was scanned.
    pub fn average_confidence(&self) -> f64 {
        if self.confidence_history.is_empty() {
            return 0.0;
        }
        let total: u64 = self.confidence_history.iter().map(|&c| u64::from(c)).sum();
        total as f64 / self.confidence_history.len() as f64
    }
}

// ============================================================================
// FEED / MODERATION
// ============================================================================

/// One automatic moderation action, as logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub action: ActionType,
    /// URL or title of the moderated content
    pub content: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStats {
    pub total_processed: u64,
    pub verified_count: u64,
    pub removed_count: u64,
    pub action_log: Vec<ActionLogEntry>,
}

impl FeedStats {
    pub fn record_validation(&mut self, is_relevant: bool) {
        self.total_processed += 1;
        if is_relevant {
            self.verified_count += 1;
        }
    }

    pub fn record_action(&mut self, action: &ModerationAction, subject: &str) {
        if action.action_type == ActionType::Remove {
            self.removed_count += 1;
        }
        self.action_log.push(ActionLogEntry {
            action: action.action_type,
            content: subject.to_string(),
            reason: action.reason.clone(),
            timestamp: Utc::now(),
        });
    }
}

// ============================================================================
// KNOWLEDGE
// ============================================================================

/// A completed knowledge analysis, kept for later review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningRecord {
    pub analysis_type: AnalysisType,
    pub result: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStats {
    /// `platform->category` co-occurrence counts
    pub relationships: BTreeMap<String, u64>,
    /// Known vocabularies, keyed by vocabulary name
    pub categories: BTreeMap<String, Vec<String>>,
    /// Lexicon term frequencies across relevant finds
    pub trends: BTreeMap<String, u64>,
    pub learning_history: Vec<LearningRecord>,
}

impl Default for KnowledgeStats {
    fn default() -> Self {
        let content_types = ContentCategory::CONCRETE
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        let platforms = Platform::ALL
            .iter()
            .map(|p| p.as_str().to_string())
            .chain([UNKNOWN_PLATFORM.to_string()])
            .collect();

        Self {
            relationships: BTreeMap::new(),
            categories: BTreeMap::from([
                ("content_types".to_string(), content_types),
                ("platforms".to_string(), platforms),
            ]),
            trends: BTreeMap::new(),
            learning_history: Vec::new(),
        }
    }
}

impl KnowledgeStats {
    /// Learn from a relevant find: platform/category edges and term frequencies.
    pub fn learn_from(&mut self, detection: &DetectionResult) {
        let platform = detection
            .platform
            .map(Platform::as_str)
            .unwrap_or(UNKNOWN_PLATFORM);

        for category in &detection.content_types {
            if *category == ContentCategory::Unknown {
                continue;
            }
            *self
                .relationships
                .entry(relationship_key(platform, category.as_str()))
                .or_default() += 1;
        }

        for term in &detection.pattern_matches {
            *self.trends.entry(term.clone()).or_default() += 1;
        }
    }

    pub fn record_analysis(&mut self, analysis_type: AnalysisType, result: serde_json::Value) {
        self.learning_history.push(LearningRecord {
            analysis_type,
            result,
            timestamp: Utc::now(),
        });
    }
}

pub fn relationship_key(platform: &str, category: &str) -> String {
    format!("{platform}->{category}")
}

// ============================================================================
// CRAWLER
// ============================================================================

/// Counters kept for one closed crawl session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSessionRecord {
    pub id: Uuid,
    pub attempted: usize,
    pub succeeded: usize,
    pub new_content: usize,
    pub existing_content: usize,
    pub updated_content: usize,
    pub enriched: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Set when a knowledge store failure cut the session short
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerStats {
    pub sessions: Vec<CrawlSessionRecord>,
    pub urls_processed: u64,
    pub urls_succeeded: u64,
    pub last_crawl_time: Option<DateTime<Utc>>,
}

impl CrawlerStats {
    /// Close out a session, failed ones included.
    ///
    /// A session that failed during reconciliation still counts its analyzed
    /// targets, matching the knowledge learned before the failure.
    pub fn record_session(&mut self, record: CrawlSessionRecord) {
        self.urls_processed += record.attempted as u64;
        self.urls_succeeded += record.succeeded as u64;
        self.last_crawl_time = Some(record.end_time);
        self.sessions.push(record);
    }

    /// Sessions that ended with an error.
    pub fn failed_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.error.is_some()).count()
    }

    /// Successful items over attempted items, as a percentage.
    pub fn completion_rate(&self) -> f64 {
        if self.urls_processed == 0 {
            return 0.0;
        }
        self.urls_succeeded as f64 / self.urls_processed as f64 * 100.0
    }
}

// ============================================================================
// AGGREGATE + SNAPSHOTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsAggregate {
    pub discovery: DiscoveryStats,
    pub feed: FeedStats,
    pub knowledge: KnowledgeStats,
    pub crawler: CrawlerStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySnapshot {
    #[serde(flatten)]
    pub counters: DiscoveryStats,
    pub average_confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSnapshot {
    pub relationships: usize,
    pub categories: usize,
    pub trends: usize,
    pub learning_history: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerSnapshot {
    pub sessions: usize,
    pub failed_sessions: usize,
    pub urls_processed: u64,
    pub urls_succeeded: u64,
    pub last_crawl_time: Option<DateTime<Utc>>,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub discovery: DiscoverySnapshot,
    pub feed: FeedStats,
    pub knowledge: KnowledgeSnapshot,
    pub crawler: CrawlerSnapshot,
}

impl StatsAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discovery_snapshot(&self) -> DiscoverySnapshot {
        DiscoverySnapshot {
            counters: self.discovery.clone(),
            average_confidence: self.discovery.average_confidence(),
        }
    }

    pub fn knowledge_snapshot(&self) -> KnowledgeSnapshot {
        KnowledgeSnapshot {
            relationships: self.knowledge.relationships.len(),
            categories: self.knowledge.categories.len(),
            trends: self.knowledge.trends.len(),
            learning_history: self.knowledge.learning_history.len(),
        }
    }

    pub fn crawler_snapshot(&self) -> CrawlerSnapshot {
        CrawlerSnapshot {
            sessions: self.crawler.sessions.len(),
            failed_sessions: self.crawler.failed_sessions(),
            urls_processed: self.crawler.urls_processed,
            urls_succeeded: self.crawler.urls_succeeded,
            last_crawl_time: self.crawler.last_crawl_time,
            completion_rate: self.crawler.completion_rate(),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            discovery: self.discovery_snapshot(),
            feed: self.feed.clone(),
            knowledge: self.knowledge_snapshot(),
            crawler: self.crawler_snapshot(),
        }
    }
}
