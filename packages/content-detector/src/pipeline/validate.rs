use serde::Serialize;

use super::Agent;
use crate::error::Result;
use crate::moderation::{ModerationAction, ModerationDecision, ModerationLevel};
use crate::stats::FeedStats;
use crate::traits::{ContentDetector, KnowledgeStore};
use crate::types::{ContentCandidate, DetectionResult};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub validation: ModerationDecision,
    pub analysis: DetectionResult,
    pub action: Option<ModerationAction>,
    pub stats: FeedStats,
}

impl<D: ContentDetector, K: KnowledgeStore> Agent<D, K> {
    /// Moderate a single item.
    ///
    /// The automatic action only runs when `auto_action` is set and the agent
    /// has auto-moderation enabled.
    pub async fn validate(
        &mut self,
        candidate: &ContentCandidate,
        level: ModerationLevel,
        auto_action: bool,
    ) -> Result<ValidationReport> {
        let analysis = self.detector.detect(candidate).await?;
        let validation = self.moderation.decide(&analysis, level);

        self.stats.feed.record_validation(analysis.is_relevant);

        let action = if auto_action {
            let subject = match candidate.url.as_deref().filter(|u| !u.is_empty()) {
                Some(url) => url,
                None => candidate.metadata.title(),
            };
            self.moderation
                .apply_auto_action(&validation, subject, &mut self.stats.feed)
        } else {
            None
        };

        tracing::info!(
            url = candidate.url(),
            score = validation.score,
            recommendation = %validation.recommendation,
            acted = action.is_some(),
            "Content validated"
        );

        Ok(ValidationReport {
            validation,
            analysis,
            action,
            stats: self.stats.feed.clone(),
        })
    }
}
