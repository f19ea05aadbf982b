use serde::{Deserialize, Serialize};

/// Thresholds used by the moderation decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRules {
    /// Minimum confidence for relevant content to be approved.
    pub minimum_relevance_score: u8,
    /// Confidence at which relevant content is boosted.
    pub boost_threshold: u8,
}

impl Default for ModerationRules {
    fn default() -> Self {
        Self {
            minimum_relevance_score: 15,
            boost_threshold: 70,
        }
    }
}

/// Configuration for the universal agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Persist relevant discoveries to the knowledge base.
    pub auto_learn: bool,

    /// Allow validation to carry out automatic moderation actions.
    pub auto_moderation: bool,

    /// Items enriched per crawl when the caller gives no batch size.
    pub default_batch_size: usize,

    /// Crawl depth recorded when the caller gives none.
    pub default_crawl_depth: u32,

    /// Candidates with more content bytes than this are rejected.
    pub max_content_len: usize,

    pub moderation: ModerationRules,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            auto_learn: true,
            auto_moderation: true,
            default_batch_size: 10,
            default_crawl_depth: 3,
            max_content_len: 16 * 1024 * 1024,
            moderation: ModerationRules::default(),
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_learn(mut self, enabled: bool) -> Self {
        self.auto_learn = enabled;
        self
    }

    pub fn with_auto_moderation(mut self, enabled: bool) -> Self {
        self.auto_moderation = enabled;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.default_batch_size = batch_size;
        self
    }

    pub fn with_crawl_depth(mut self, depth: u32) -> Self {
        self.default_crawl_depth = depth;
        self
    }

    pub fn with_max_content_len(mut self, max: usize) -> Self {
        self.max_content_len = max;
        self
    }

    pub fn with_moderation_rules(mut self, rules: ModerationRules) -> Self {
        self.moderation = rules;
        self
    }

    /// Names of the capabilities currently switched on.
    pub fn enabled_capabilities(&self) -> Vec<&'static str> {
        let mut enabled = vec!["discovery", "classification", "trending", "crawling"];
        if self.auto_learn {
            enabled.push("auto_learn");
        }
        if self.auto_moderation {
            enabled.push("auto_moderation");
        }
        enabled
    }
}
