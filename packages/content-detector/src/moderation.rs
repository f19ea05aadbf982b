//! Moderation decisions derived from detection results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ModerationRules;
use crate::error::PipelineError;
use crate::stats::FeedStats;
use crate::types::DetectionResult;

/// How strictly content is moderated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationLevel {
    Strict,
    #[default]
    Moderate,
    Lenient,
}

impl FromStr for ModerationLevel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ModerationLevel::Strict),
            "moderate" => Ok(ModerationLevel::Moderate),
            "lenient" => Ok(ModerationLevel::Lenient),
            _ => Err(PipelineError::InvalidArgument {
                field: "moderation level",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Remove,
    Approve,
    Boost,
    FlagReview,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Remove => "remove",
            Recommendation::Approve => "approve",
            Recommendation::Boost => "boost",
            Recommendation::FlagReview => "flag_review",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationDecision {
    pub score: u8,
    pub is_relevant: bool,
    pub moderation_level: ModerationLevel,
    pub recommendation: Recommendation,
    pub reasons: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Remove,
    Boost,
    Flag,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Remove => "remove",
            ActionType::Boost => "boost",
            ActionType::Flag => "flag",
        }
    }
}

/// An automatic moderation action that was carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub reason: String,
}

/// Deterministic moderation table plus the auto-action executor.
#[derive(Debug, Clone, Default)]
pub struct ModerationEngine {
    rules: ModerationRules,
    auto_moderation: bool,
}

impl ModerationEngine {
    pub fn new(rules: ModerationRules, auto_moderation: bool) -> Self {
        Self {
            rules,
            auto_moderation,
        }
    }

    /// The decision table.
    ///
    /// | relevant | confidence            | recommendation |
    /// |----------|-----------------------|----------------|
    /// | no       | any                   | remove         |
    /// | yes      | >= boost threshold    | boost          |
    /// | yes      | >= minimum score      | approve        |
    /// | yes      | below minimum score   | flag_review    |
    pub fn recommend(&self, confidence: u8, is_relevant: bool) -> Recommendation {
        if !is_relevant {
            Recommendation::Remove
        } else if confidence >= self.rules.boost_threshold {
            Recommendation::Boost
        } else if confidence >= self.rules.minimum_relevance_score {
            Recommendation::Approve
        } else {
            Recommendation::FlagReview
        }
    }

    /// Derive a decision from a detection result. Pure.
    pub fn decide(&self, detection: &DetectionResult, level: ModerationLevel) -> ModerationDecision {
        ModerationDecision {
            score: detection.confidence,
            is_relevant: detection.is_relevant,
            moderation_level: level,
            recommendation: self.recommend(detection.confidence, detection.is_relevant),
            reasons: detection.pattern_matches.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Carry out the action a decision calls for and record it in `stats`.
    ///
    /// Returns `None` for approvals and when auto-moderation is switched off.
    /// `subject` identifies the content in the action log (URL or title).
    pub fn apply_auto_action(
        &self,
        decision: &ModerationDecision,
        subject: &str,
        stats: &mut FeedStats,
    ) -> Option<ModerationAction> {
        if !self.auto_moderation {
            return None;
        }

        let action = match decision.recommendation {
            Recommendation::Approve => return None,
            Recommendation::Remove => ModerationAction {
                action_type: ActionType::Remove,
                reason: "Not bambisleep content".to_string(),
            },
            Recommendation::Boost => ModerationAction {
                action_type: ActionType::Boost,
                reason: "High quality bambisleep content".to_string(),
            },
            Recommendation::FlagReview => ModerationAction {
                action_type: ActionType::Flag,
                reason: "Requires manual review".to_string(),
            },
        };

        stats.record_action(&action, subject);

        tracing::info!(
            action = action.action_type.as_str(),
            subject = subject,
            score = decision.score,
            "Auto-moderation action applied"
        );

        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectionEngine;
    use crate::types::ContentCandidate;

    fn engine() -> ModerationEngine {
        ModerationEngine::new(ModerationRules::default(), true)
    }

    #[test]
    fn test_decision_table_exact() {
        let engine = engine();

        assert_eq!(engine.recommend(0, false), Recommendation::Remove);
        assert_eq!(engine.recommend(100, false), Recommendation::Remove);
        assert_eq!(engine.recommend(70, true), Recommendation::Boost);
        assert_eq!(engine.recommend(100, true), Recommendation::Boost);
        assert_eq!(engine.recommend(69, true), Recommendation::Approve);
        assert_eq!(engine.recommend(15, true), Recommendation::Approve);
        assert_eq!(engine.recommend(14, true), Recommendation::FlagReview);
        assert_eq!(engine.recommend(0, true), Recommendation::FlagReview);
    }

    #[test]
    fn test_decide_carries_reasons_and_level() {
        let detection = DetectionEngine::default()
            .detect(&ContentCandidate::for_url("https://hypnotube.com/pink").with_content("bimbo doll"))
            .unwrap();

        let decision = engine().decide(&detection, ModerationLevel::Strict);

        assert_eq!(decision.moderation_level, ModerationLevel::Strict);
        assert_eq!(decision.score, detection.confidence);
        assert_eq!(decision.reasons, detection.pattern_matches);
        assert_eq!(decision.recommendation, Recommendation::Boost);
    }

    fn decision(recommendation: Recommendation) -> ModerationDecision {
        ModerationDecision {
            score: 0,
            is_relevant: recommendation != Recommendation::Remove,
            moderation_level: ModerationLevel::Moderate,
            recommendation,
            reasons: vec![],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_auto_action_updates_feed_stats() {
        let engine = engine();
        let mut stats = FeedStats::default();

        let removed = engine.apply_auto_action(&decision(Recommendation::Remove), "a", &mut stats);
        let boosted = engine.apply_auto_action(&decision(Recommendation::Boost), "b", &mut stats);
        let flagged = engine.apply_auto_action(&decision(Recommendation::FlagReview), "c", &mut stats);
        let approved = engine.apply_auto_action(&decision(Recommendation::Approve), "d", &mut stats);

        assert_eq!(removed.unwrap().action_type, ActionType::Remove);
        assert_eq!(boosted.unwrap().action_type, ActionType::Boost);
        assert_eq!(flagged.unwrap().action_type, ActionType::Flag);
        assert!(approved.is_none());

        assert_eq!(stats.removed_count, 1);
        assert_eq!(stats.action_log.len(), 3);
        assert_eq!(stats.action_log[2].content, "c");
    }

    #[test]
    fn test_auto_moderation_disabled() {
        let engine = ModerationEngine::new(ModerationRules::default(), false);
        let mut stats = FeedStats::default();

        assert!(engine
            .apply_auto_action(&decision(Recommendation::Remove), "a", &mut stats)
            .is_none());
        assert_eq!(stats.removed_count, 0);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("STRICT".parse::<ModerationLevel>().unwrap(), ModerationLevel::Strict);
        assert!("harsh".parse::<ModerationLevel>().is_err());
    }
}
