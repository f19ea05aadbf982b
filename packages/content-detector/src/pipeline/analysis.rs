//! Capability-driven analysis of a single item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use super::Agent;
use crate::error::{PipelineError, Result};
use crate::moderation::{ModerationDecision, ModerationLevel, Recommendation};
use crate::traits::{ContentDetector, KnowledgeStore};
use crate::types::{ContentCandidate, ContentCategory, Depth, DetectionResult, FormatGuess, Platform};

/// Confidence above which content is considered likely to trend.
const TRENDING_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    Basic,
    #[default]
    Standard,
    Comprehensive,
}

impl AnalysisDepth {
    /// Detection depth used for this analysis depth.
    pub fn detection_depth(self) -> Depth {
        match self {
            AnalysisDepth::Comprehensive => Depth::Comprehensive,
            AnalysisDepth::Basic | AnalysisDepth::Standard => Depth::Deep,
        }
    }
}

impl FromStr for AnalysisDepth {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AnalysisDepth::Basic),
            "standard" => Ok(AnalysisDepth::Standard),
            "comprehensive" => Ok(AnalysisDepth::Comprehensive),
            _ => Err(PipelineError::InvalidArgument {
                field: "analysis depth",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Discovery,
    Validation,
    Classification,
    Trending,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Discovery,
        Capability::Validation,
        Capability::Classification,
        Capability::Trending,
    ];

    /// Capabilities used when the caller names none.
    pub fn defaults() -> BTreeSet<Capability> {
        BTreeSet::from([
            Capability::Discovery,
            Capability::Validation,
            Capability::Classification,
        ])
    }
}

impl FromStr for Capability {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discovery" => Ok(Capability::Discovery),
            "validation" => Ok(Capability::Validation),
            "classification" => Ok(Capability::Classification),
            "trending" => Ok(Capability::Trending),
            _ => Err(PipelineError::UnknownCapability {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryFacet {
    pub is_relevant: bool,
    pub confidence: u8,
    pub content_types: BTreeSet<ContentCategory>,
    pub platform: Option<Platform>,
    pub pattern_matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub content_types: BTreeSet<ContentCategory>,
    pub platform: Option<Platform>,
    pub formats: Vec<FormatGuess>,
    pub confidence: u8,
    pub method: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendingPotential {
    pub trending: bool,
    pub factors: Vec<String>,
    pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapabilityResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery: Option<DiscoveryFacet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ModerationDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trending: Option<TrendingPotential>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub overall_score: f64,
    pub recommended_actions: Vec<String>,
    pub confidence: u8,
    pub content_types: BTreeSet<ContentCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalAnalysis {
    pub url: Option<String>,
    pub detection: DetectionResult,
    pub capabilities: CapabilityResults,
    pub summary: AnalysisSummary,
    pub capabilities_used: usize,
    pub timestamp: DateTime<Utc>,
}

impl<D: ContentDetector, K: KnowledgeStore> Agent<D, K> {
    /// Detect once, then run each requested capability over the result.
    ///
    /// The candidate's own depth is replaced by the one `depth` implies.
    pub async fn universal_analysis(
        &self,
        candidate: ContentCandidate,
        depth: AnalysisDepth,
        capabilities: &BTreeSet<Capability>,
    ) -> Result<UniversalAnalysis> {
        let candidate = candidate.with_depth(depth.detection_depth());
        let detection = self.detector.detect(&candidate).await?;

        let mut results = CapabilityResults::default();
        for capability in capabilities {
            match capability {
                Capability::Discovery => results.discovery = Some(discovery_facet(&detection)),
                Capability::Validation => {
                    results.validation =
                        Some(self.moderation.decide(&detection, ModerationLevel::Moderate))
                }
                Capability::Classification => results.classification = Some(classify(&detection)),
                Capability::Trending => results.trending = Some(trending_potential(&detection)),
            }
        }

        let summary = summarize(&detection, &results);

        tracing::debug!(
            url = candidate.url(),
            capabilities = capabilities.len(),
            overall_score = summary.overall_score,
            "Universal analysis completed"
        );

        Ok(UniversalAnalysis {
            url: candidate.url,
            detection,
            capabilities: results,
            summary,
            capabilities_used: capabilities.len(),
            timestamp: Utc::now(),
        })
    }
}

fn discovery_facet(detection: &DetectionResult) -> DiscoveryFacet {
    DiscoveryFacet {
        is_relevant: detection.is_relevant,
        confidence: detection.confidence,
        content_types: detection.content_types.clone(),
        platform: detection.platform,
        pattern_matches: detection.pattern_matches.clone(),
    }
}

fn classify(detection: &DetectionResult) -> Classification {
    Classification {
        content_types: detection.content_types.clone(),
        platform: detection.platform,
        formats: detection.detected_formats.clone(),
        confidence: detection.confidence,
        method: "universal_detection",
    }
}

fn trending_potential(detection: &DetectionResult) -> TrendingPotential {
    TrendingPotential {
        trending: detection.confidence > TRENDING_THRESHOLD,
        factors: detection.pattern_matches.clone(),
        score: detection.confidence,
    }
}

fn summarize(detection: &DetectionResult, results: &CapabilityResults) -> AnalysisSummary {
    let mut scores = vec![f64::from(detection.confidence)];
    if let Some(validation) = &results.validation {
        scores.push(f64::from(validation.score));
    }
    let overall_score = scores.iter().sum::<f64>() / scores.len() as f64;

    let mut recommended_actions = Vec::new();
    if detection.is_relevant {
        recommended_actions.push("Include in bambisleep content collection".to_string());
    }
    match results.validation.as_ref().map(|v| v.recommendation) {
        Some(Recommendation::Boost) => {
            recommended_actions.push("Promote as high-quality content".to_string())
        }
        Some(Recommendation::FlagReview) => {
            recommended_actions.push("Queue for manual review".to_string())
        }
        _ => {}
    }

    AnalysisSummary {
        overall_score,
        recommended_actions,
        confidence: detection.confidence,
        content_types: detection.content_types.clone(),
    }
}
