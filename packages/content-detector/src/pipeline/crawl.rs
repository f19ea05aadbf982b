//! Three-step agentic crawl: analyze, reconcile against the knowledge base,
//! then enrich a bounded batch of new content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::analysis::{AnalysisDepth, Capability, UniversalAnalysis};
use super::{in_focus, Agent};
use crate::error::{PipelineError, Result};
use crate::stats::{CrawlSessionRecord, CrawlerSnapshot};
use crate::stores::calculate_hash;
use crate::traits::{ContentDetector, KnowledgeKind, KnowledgeStore};
use crate::types::{ContentCandidate, ContentCategory, Depth, DetectionResult};

/// Parameters for one crawl session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub targets: Vec<String>,
    /// Recorded with the session; no links are followed.
    pub crawl_depth: Option<u32>,
    /// Focus list for reconciliation; empty means every category.
    #[serde(default)]
    pub content_types: Vec<ContentCategory>,
    pub batch_size: Option<usize>,
}

impl CrawlRequest {
    pub fn new(targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            crawl_depth: None,
            content_types: Vec::new(),
            batch_size: None,
        }
    }

    pub fn with_crawl_depth(mut self, depth: u32) -> Self {
        self.crawl_depth = Some(depth);
        self
    }

    pub fn with_content_types(mut self, content_types: Vec<ContentCategory>) -> Self {
        self.content_types = content_types;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Effective parameters after defaults were applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlParameters {
    pub crawl_depth: u32,
    pub content_types: Vec<ContentCategory>,
    pub batch_size: usize,
}

/// Step 1 outcome for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedItem {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<DetectionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Step 2 partition of the relevant step 1 items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub new_content: Vec<AnalyzedItem>,
    pub existing_content: Vec<AnalyzedItem>,
    /// Known URLs whose detection no longer matches what is stored
    pub updated_content: Vec<AnalyzedItem>,
}

/// Step 3 outcome for one new item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedItem {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced: Option<UniversalAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlResults {
    pub step1: Vec<AnalyzedItem>,
    pub step2: Reconciliation,
    pub step3: Vec<EnrichedItem>,
}

/// A closed crawl session, as kept in the crawler history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSession {
    pub id: Uuid,
    pub targets: Vec<String>,
    pub parameters: CrawlParameters,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub results: CrawlResults,
    /// Knowledge store failure that ended the session early
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlSession {
    fn record(&self) -> CrawlSessionRecord {
        let results = &self.results;
        CrawlSessionRecord {
            id: self.id,
            attempted: results.step1.len(),
            succeeded: results.step1.iter().filter(|item| item.processed).count(),
            new_content: results.step2.new_content.len(),
            existing_content: results.step2.existing_content.len(),
            updated_content: results.step2.updated_content.len(),
            enriched: results.step3.len(),
            start_time: self.start_time,
            end_time: self.end_time.unwrap_or(self.start_time),
            error: self.error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSessionReport {
    pub session_id: Uuid,
    pub results: CrawlResults,
    pub stats: CrawlerSnapshot,
}

impl<D: ContentDetector, K: KnowledgeStore> Agent<D, K> {
    /// Run a full crawl session over `request.targets`.
    ///
    /// Per-target detection failures are captured in step 1 and step 3.
    /// Knowledge store failures abort the session. It is still closed and
    /// recorded, with its error, before the failure is returned.
    pub async fn crawl(&mut self, request: CrawlRequest) -> Result<CrawlSessionReport> {
        let parameters = CrawlParameters {
            crawl_depth: request.crawl_depth.unwrap_or(self.config.default_crawl_depth),
            content_types: request.content_types,
            batch_size: request.batch_size.unwrap_or(self.config.default_batch_size),
        };
        if parameters.batch_size == 0 {
            return Err(PipelineError::InvalidBatchSize);
        }

        let id = Uuid::now_v7();
        let start_time = Utc::now();

        tracing::info!(
            session_id = %id,
            targets = request.targets.len(),
            batch_size = parameters.batch_size,
            "Starting crawl session"
        );

        let step1 = self.analyze_targets(&request.targets).await;

        let mut step2 = Reconciliation::default();
        let reconciled = self
            .reconcile(&step1, &parameters.content_types, &mut step2)
            .await;
        let step3 = match reconciled {
            Ok(()) => self.enrich(&step2.new_content, parameters.batch_size).await,
            Err(_) => Vec::new(),
        };

        let session = CrawlSession {
            id,
            targets: request.targets,
            parameters,
            start_time,
            end_time: Some(Utc::now()),
            results: CrawlResults { step1, step2, step3 },
            error: reconciled.as_ref().err().map(ToString::to_string),
        };

        // Saves made before a store failure stay learned, so the session is
        // recorded either way.
        self.stats.crawler.record_session(session.record());
        if let Err(e) = reconciled {
            tracing::warn!(session_id = %id, error = %e, "Crawl session aborted");
            self.sessions.push(session);
            return Err(e);
        }

        let record = session.record();
        tracing::info!(
            session_id = %id,
            analyzed = record.succeeded,
            new = record.new_content,
            existing = record.existing_content,
            updated = record.updated_content,
            enriched = record.enriched,
            "Crawl session completed"
        );

        let results = session.results.clone();
        self.sessions.push(session);

        Ok(CrawlSessionReport {
            session_id: id,
            results,
            stats: self.stats.crawler_snapshot(),
        })
    }

    /// Step 1: comprehensive detection of every target, in order.
    async fn analyze_targets(&self, targets: &[String]) -> Vec<AnalyzedItem> {
        let mut items = Vec::with_capacity(targets.len());

        for target in targets {
            let candidate = ContentCandidate::for_url(target.as_str()).with_depth(Depth::Comprehensive);
            let item = match self.detector.detect(&candidate).await {
                Ok(analysis) => AnalyzedItem {
                    url: target.clone(),
                    analysis: Some(analysis),
                    error: None,
                    processed: true,
                    timestamp: Utc::now(),
                },
                Err(e) => {
                    tracing::warn!(url = %target, error = %e, "Crawl analysis failed");
                    AnalyzedItem {
                        url: target.clone(),
                        analysis: None,
                        error: Some(e.to_string()),
                        processed: false,
                        timestamp: Utc::now(),
                    }
                }
            };
            items.push(item);
        }

        items
    }

    /// Step 2: split relevant items into new, existing and updated.
    ///
    /// New and updated items are saved as soon as they are classified, so on
    /// a store failure `reconciliation` holds what was settled before it.
    async fn reconcile(
        &mut self,
        analyzed: &[AnalyzedItem],
        focus: &[ContentCategory],
        reconciliation: &mut Reconciliation,
    ) -> Result<()> {
        for item in analyzed {
            let Some(analysis) = item.analysis.as_ref() else {
                continue;
            };
            if !analysis.is_relevant || !in_focus(analysis, focus) {
                continue;
            }

            if !self.store.exists(&item.url).await? {
                self.store.save(KnowledgeKind::Discovery, analysis).await?;
                self.stats.knowledge.learn_from(analysis);
                reconciliation.new_content.push(item.clone());
                continue;
            }

            let changed = match self.store.stored_hash(&item.url).await? {
                Some(stored) => stored != calculate_hash(analysis)?,
                None => false,
            };
            if changed {
                tracing::debug!(url = %item.url, "Known content changed - saving update");
                self.store.save(KnowledgeKind::Discovery, analysis).await?;
                reconciliation.updated_content.push(item.clone());
            } else {
                reconciliation.existing_content.push(item.clone());
            }
        }

        Ok(())
    }

    /// Step 3: full-capability analysis of the first `batch_size` new items.
    async fn enrich(&self, new_content: &[AnalyzedItem], batch_size: usize) -> Vec<EnrichedItem> {
        let capabilities: BTreeSet<Capability> = Capability::ALL.into_iter().collect();
        let mut enriched = Vec::new();

        for item in new_content.iter().take(batch_size) {
            let candidate = ContentCandidate::for_url(item.url.as_str());
            let outcome = self
                .universal_analysis(candidate, AnalysisDepth::Comprehensive, &capabilities)
                .await;

            enriched.push(match outcome {
                Ok(analysis) => EnrichedItem {
                    url: item.url.clone(),
                    enhanced: Some(analysis),
                    error: None,
                    processed: true,
                },
                Err(e) => {
                    tracing::warn!(url = %item.url, error = %e, "Crawl enrichment failed");
                    EnrichedItem {
                        url: item.url.clone(),
                        enhanced: None,
                        error: Some(e.to_string()),
                        processed: false,
                    }
                }
            });
        }

        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::stats::KnowledgeStats;
    use crate::testing::{MockKnowledgeStore, MockStoreCall, ScriptedDetector};

    #[tokio::test]
    async fn test_zero_batch_size_is_rejected() {
        let mut agent = Agent::in_memory(AgentConfig::default());

        let err = agent
            .crawl(CrawlRequest::new(["https://bambicloud.com/f/1"]).with_batch_size(0))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidBatchSize));
        assert!(agent.stats().crawler.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_defaults_come_from_config() {
        let config = AgentConfig::default().with_batch_size(4).with_crawl_depth(7);
        let mut agent = Agent::with_config(ScriptedDetector::new(), MockKnowledgeStore::new(), config);

        agent.crawl(CrawlRequest::new(["https://a.com"])).await.unwrap();

        let session = &agent.sessions()[0];
        assert_eq!(session.parameters.batch_size, 4);
        assert_eq!(session.parameters.crawl_depth, 7);
        assert!(session.end_time.is_some());
    }

    #[tokio::test]
    async fn test_new_content_is_saved_before_enrichment() {
        let mut agent = Agent::new(ScriptedDetector::new(), MockKnowledgeStore::new());

        agent
            .crawl(CrawlRequest::new(["https://bambicloud.com/f/1"]))
            .await
            .unwrap();

        let calls = agent.store().calls();
        assert!(matches!(calls[0], MockStoreCall::Exists { .. }));
        assert!(matches!(calls[1], MockStoreCall::Save { kind: KnowledgeKind::Discovery, .. }));
        // Step 1 and step 3 each detect once
        assert_eq!(agent.detector().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_exists_failure_aborts_session() {
        let store = MockKnowledgeStore::new().failing_lookups();
        let mut agent = Agent::new(ScriptedDetector::new(), store);

        let result = agent.crawl(CrawlRequest::new(["https://bambicloud.com/f/1"])).await;

        assert!(matches!(result, Err(PipelineError::Knowledge(_))));
    }

    #[tokio::test]
    async fn test_enrichment_failure_is_captured_per_item() {
        // Passes step 1, fails on its second detection in step 3
        let detector = ScriptedDetector::new().fail_url_on_call("https://bambicloud.com/a", 2);
        let mut agent = Agent::new(detector, MockKnowledgeStore::new());

        let report = agent
            .crawl(CrawlRequest::new(["https://bambicloud.com/a", "https://bambicloud.com/b"]))
            .await
            .unwrap();
        let step3 = &report.results.step3;

        assert_eq!(report.results.step2.new_content.len(), 2);
        assert_eq!(step3.len(), 2);
        assert_eq!(step3[0].url, "https://bambicloud.com/a");
        assert!(!step3[0].processed);
        assert!(step3[0].enhanced.is_none());
        assert!(step3[0].error.as_deref().unwrap().contains("scripted failure"));
        assert_eq!(step3[1].url, "https://bambicloud.com/b");
        assert!(step3[1].processed);
        assert!(step3[1].enhanced.is_some());
        assert_eq!(report.stats.completion_rate, 100.0);
    }

    #[tokio::test]
    async fn test_store_failure_records_partial_session() {
        let store = MockKnowledgeStore::new().failing_save_for("https://bambicloud.com/b");
        let mut agent = Agent::new(ScriptedDetector::new(), store);

        let result = agent
            .crawl(CrawlRequest::new([
                "https://bambicloud.com/a",
                "https://bambicloud.com/b",
                "https://bambicloud.com/c",
            ]))
            .await;

        assert!(matches!(result, Err(PipelineError::Knowledge(_))));

        let session = &agent.sessions()[0];
        assert!(session.error.as_deref().unwrap().contains("mock save failure"));
        assert_eq!(session.results.step1.len(), 3);
        let new_urls: Vec<&str> = session
            .results
            .step2
            .new_content
            .iter()
            .map(|item| item.url.as_str())
            .collect();
        assert_eq!(new_urls, vec!["https://bambicloud.com/a"]);
        assert!(session.results.step3.is_empty());

        // Only the item saved before the failure was learned
        let mut expected = KnowledgeStats::default();
        expected.learn_from(session.results.step1[0].analysis.as_ref().unwrap());
        assert_eq!(agent.stats().knowledge.relationships, expected.relationships);

        let crawler = &agent.stats().crawler;
        assert_eq!(crawler.sessions.len(), 1);
        assert_eq!(crawler.failed_sessions(), 1);
        assert_eq!(crawler.urls_processed, 3);
        assert_eq!(crawler.sessions[0].new_content, 1);
    }
}
