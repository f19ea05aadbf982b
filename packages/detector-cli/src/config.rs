use anyhow::{Context, Result};
use content_detector::AgentConfig;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub agent: AgentConfig,
    /// Newline-separated list of URLs the knowledge base already holds
    pub known_urls_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = AgentConfig::default();
        let mut agent = AgentConfig::new()
            .with_auto_learn(flag("DETECTOR_AUTO_LEARN", defaults.auto_learn)?)
            .with_auto_moderation(flag("DETECTOR_AUTO_MODERATION", defaults.auto_moderation)?);

        if let Ok(value) = env::var("DETECTOR_BATCH_SIZE") {
            agent = agent.with_batch_size(
                value
                    .parse()
                    .context("DETECTOR_BATCH_SIZE must be a valid number")?,
            );
        }
        if let Ok(value) = env::var("DETECTOR_CRAWL_DEPTH") {
            agent = agent.with_crawl_depth(
                value
                    .parse()
                    .context("DETECTOR_CRAWL_DEPTH must be a valid number")?,
            );
        }
        if let Ok(value) = env::var("DETECTOR_MAX_CONTENT_LEN") {
            agent = agent.with_max_content_len(
                value
                    .parse()
                    .context("DETECTOR_MAX_CONTENT_LEN must be a valid number")?,
            );
        }

        Ok(Self {
            agent,
            known_urls_path: env::var("DETECTOR_KNOWN_URLS").ok().map(PathBuf::from),
        })
    }

    /// Read the known-URL seed list, if one is configured.
    pub fn known_urls(&self) -> Result<Vec<String>> {
        let Some(path) = &self.known_urls_path else {
            return Ok(Vec::new());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read known URLs from {}", path.display()))?;
        Ok(parse_known_urls(&contents))
    }
}

fn flag(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(value) => parse_flag(&value).with_context(|| format!("{name} must be true or false")),
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// One URL per line; blank lines and `#` comments are skipped.
fn parse_known_urls(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_parse_known_urls() {
        let contents = "# seeded\nhttps://a.com/x\n\n  https://b.com/y  \n";

        assert_eq!(parse_known_urls(contents), vec!["https://a.com/x", "https://b.com/y"]);
    }
}
