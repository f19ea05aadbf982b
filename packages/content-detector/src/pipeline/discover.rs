use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{in_focus, Agent, ItemFailure};
use crate::error::Result;
use crate::stats::DiscoverySnapshot;
use crate::traits::{ContentDetector, KnowledgeKind, KnowledgeStore};
use crate::types::{ContentCandidate, ContentCategory, Depth, DetectionResult};

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    /// Sources analysed without error
    pub processed: usize,
    /// Relevant sources inside the content-type focus
    pub discovered: usize,
    pub items: Vec<DetectionResult>,
    pub failures: Vec<ItemFailure>,
    pub stats: DiscoverySnapshot,
    pub timestamp: DateTime<Utc>,
}

impl<D: ContentDetector, K: KnowledgeStore> Agent<D, K> {
    /// Detect relevance across `sources` and tally what was found.
    ///
    /// `content_types` narrows which relevant items count as discovered; an
    /// empty slice accepts every category. A source that fails detection is
    /// reported in `failures` and does not stop the others. Discoveries are
    /// saved to the knowledge store when auto-learn is on, and a failing save
    /// fails the whole pass.
    pub async fn discover(
        &mut self,
        sources: &[String],
        content_types: &[ContentCategory],
        depth: Depth,
    ) -> Result<DiscoveryReport> {
        tracing::info!(
            sources = sources.len(),
            depth = depth.as_str(),
            focus = content_types.len(),
            "Starting discovery"
        );

        let mut items = Vec::new();
        let mut failures = Vec::new();
        let mut processed = 0;

        for source in sources {
            let candidate = ContentCandidate::for_url(source.as_str()).with_depth(depth);
            let detection = match self.detector.detect(&candidate).await {
                Ok(detection) => detection,
                Err(e) => {
                    tracing::warn!(url = %source, error = %e, "Discovery detection failed");
                    failures.push(ItemFailure::new(source.as_str(), &e));
                    continue;
                }
            };

            processed += 1;
            self.stats.discovery.record_scan(&detection);

            if !detection.is_relevant || !in_focus(&detection, content_types) {
                continue;
            }

            self.stats.discovery.record_find(&detection);
            self.stats.knowledge.learn_from(&detection);

            if self.config.auto_learn {
                self.store.save(KnowledgeKind::Discovery, &detection).await?;
            }

            tracing::debug!(
                url = %source,
                confidence = detection.confidence,
                "Relevant content discovered"
            );
            items.push(detection);
        }

        tracing::info!(
            processed,
            discovered = items.len(),
            failed = failures.len(),
            "Discovery completed"
        );

        Ok(DiscoveryReport {
            processed,
            discovered: items.len(),
            items,
            failures,
            stats: self.stats.discovery_snapshot(),
            timestamp: Utc::now(),
        })
    }
}
