//! Analyses over the accumulated knowledge counters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::Agent;
use crate::error::{KnowledgeError, PipelineError, Result};
use crate::stats::{KnowledgeSnapshot, StatsAggregate};
use crate::traits::{ContentDetector, KnowledgeStore};
use crate::types::{AnalysisType, ContentCategory};

/// How much detail a knowledge analysis reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeDepth {
    Basic,
    #[default]
    Detailed,
    Comprehensive,
}

impl KnowledgeDepth {
    /// Number of ranked entries reported per list.
    fn top_n(self) -> usize {
        match self {
            KnowledgeDepth::Basic => 3,
            KnowledgeDepth::Detailed => 5,
            KnowledgeDepth::Comprehensive => usize::MAX,
        }
    }
}

impl FromStr for KnowledgeDepth {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(KnowledgeDepth::Basic),
            "detailed" => Ok(KnowledgeDepth::Detailed),
            "comprehensive" => Ok(KnowledgeDepth::Comprehensive),
            _ => Err(PipelineError::InvalidArgument {
                field: "analysis depth",
                value: s.to_string(),
            }),
        }
    }
}

/// A named count in a ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisResult {
    #[serde(rename_all = "camelCase")]
    Trends {
        top_categories: Vec<RankedEntry>,
        top_platforms: Vec<RankedEntry>,
        top_terms: Vec<RankedEntry>,
        average_confidence: f64,
        timeframe: String,
        depth: KnowledgeDepth,
    },
    #[serde(rename_all = "camelCase")]
    Relationships {
        relationships: usize,
        strongest: Vec<RankedEntry>,
        types: Vec<ContentCategory>,
        depth: KnowledgeDepth,
    },
    #[serde(rename_all = "camelCase")]
    Classification {
        categories: usize,
        category_counts: BTreeMap<ContentCategory, u64>,
        types: Vec<ContentCategory>,
        depth: KnowledgeDepth,
    },
    #[serde(rename_all = "camelCase")]
    Validation {
        validated: bool,
        issues: Vec<String>,
        types: Vec<ContentCategory>,
        depth: KnowledgeDepth,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeReport {
    pub analysis_type: AnalysisType,
    pub result: AnalysisResult,
    pub stats: KnowledgeSnapshot,
}

impl<D: ContentDetector, K: KnowledgeStore> Agent<D, K> {
    /// Run one knowledge analysis and append it to the learning history.
    ///
    /// `data_types` narrows category-based analyses; empty means all.
    /// `timeframe` is reported back as given.
    pub fn analyze_knowledge(
        &mut self,
        analysis_type: AnalysisType,
        data_types: &[ContentCategory],
        timeframe: &str,
        depth: KnowledgeDepth,
    ) -> Result<KnowledgeReport> {
        let types = data_types.to_vec();
        let result = match analysis_type {
            AnalysisType::Trends => trends(&self.stats, timeframe, depth),
            AnalysisType::Relationships => relationships(&self.stats, types, depth),
            AnalysisType::Classification => classification(&self.stats, types, depth),
            AnalysisType::Validation => validation(&self.stats, types, depth),
        };

        let recorded = serde_json::to_value(&result).map_err(KnowledgeError::from)?;
        self.stats.knowledge.record_analysis(analysis_type, recorded);

        tracing::info!(
            analysis_type = analysis_type.as_str(),
            history = self.stats.knowledge.learning_history.len(),
            "Knowledge analysis completed"
        );

        Ok(KnowledgeReport {
            analysis_type,
            result,
            stats: self.stats.knowledge_snapshot(),
        })
    }
}

fn ranked<I, N>(counts: I, limit: usize) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = (N, u64)>,
    N: ToString,
{
    let mut entries: Vec<RankedEntry> = counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| RankedEntry {
            name: name.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps name order among equal counts
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(limit);
    entries
}

fn in_types(category: ContentCategory, types: &[ContentCategory]) -> bool {
    types.is_empty() || types.contains(&category)
}

fn trends(stats: &StatsAggregate, timeframe: &str, depth: KnowledgeDepth) -> AnalysisResult {
    let discovery = &stats.discovery;
    AnalysisResult::Trends {
        top_categories: ranked(discovery.content_by_type.iter().map(|(c, n)| (c, *n)), depth.top_n()),
        top_platforms: ranked(discovery.platforms.iter().map(|(p, n)| (p, *n)), depth.top_n()),
        top_terms: ranked(stats.knowledge.trends.iter().map(|(t, n)| (t, *n)), depth.top_n()),
        average_confidence: discovery.average_confidence(),
        timeframe: timeframe.to_string(),
        depth,
    }
}

fn relationships(
    stats: &StatsAggregate,
    types: Vec<ContentCategory>,
    depth: KnowledgeDepth,
) -> AnalysisResult {
    let edges = &stats.knowledge.relationships;
    let selected = edges.iter().filter(|(key, _)| {
        types.is_empty()
            || types
                .iter()
                .any(|c| key.ends_with(&format!("->{}", c.as_str())))
    });

    AnalysisResult::Relationships {
        relationships: edges.len(),
        strongest: ranked(selected.map(|(k, n)| (k, *n)), depth.top_n()),
        types,
        depth,
    }
}

fn classification(
    stats: &StatsAggregate,
    types: Vec<ContentCategory>,
    depth: KnowledgeDepth,
) -> AnalysisResult {
    let category_counts = stats
        .discovery
        .content_by_type
        .iter()
        .filter(|(c, _)| in_types(**c, &types))
        .map(|(c, n)| (*c, *n))
        .collect();

    AnalysisResult::Classification {
        categories: stats.knowledge.categories.len(),
        category_counts,
        types,
        depth,
    }
}

/// Cross-check the counters against each other.
fn validation(
    stats: &StatsAggregate,
    types: Vec<ContentCategory>,
    depth: KnowledgeDepth,
) -> AnalysisResult {
    let mut issues = Vec::new();
    let discovery = &stats.discovery;
    let feed = &stats.feed;
    let crawler = &stats.crawler;

    if discovery.found_count > discovery.total_scanned {
        issues.push(format!(
            "found count {} exceeds total scanned {}",
            discovery.found_count, discovery.total_scanned
        ));
    }
    if discovery.confidence_history.len() as u64 != discovery.total_scanned {
        issues.push(format!(
            "confidence history has {} entries for {} scans",
            discovery.confidence_history.len(),
            discovery.total_scanned
        ));
    }
    let platform_total: u64 = discovery.platforms.values().sum();
    if platform_total > discovery.found_count {
        issues.push(format!(
            "platform counts total {} exceed found count {}",
            platform_total, discovery.found_count
        ));
    }
    for (category, count) in &discovery.content_by_type {
        if in_types(*category, &types) && *count > discovery.found_count {
            issues.push(format!(
                "{category} count {count} exceeds found count {}",
                discovery.found_count
            ));
        }
    }
    if feed.verified_count > feed.total_processed {
        issues.push(format!(
            "verified count {} exceeds total processed {}",
            feed.verified_count, feed.total_processed
        ));
    }
    if feed.removed_count > feed.total_processed {
        issues.push(format!(
            "removed count {} exceeds total processed {}",
            feed.removed_count, feed.total_processed
        ));
    }
    if crawler.urls_succeeded > crawler.urls_processed {
        issues.push(format!(
            "succeeded urls {} exceed processed urls {}",
            crawler.urls_succeeded, crawler.urls_processed
        ));
    }

    AnalysisResult::Validation {
        validated: issues.is_empty(),
        issues,
        types,
        depth,
    }
}
