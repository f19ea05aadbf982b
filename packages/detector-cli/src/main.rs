mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use content_detector::{
    Agent, AnalysisDepth, AnalysisType, CandidateContent, Capability, ContentCandidate,
    ContentCategory, CrawlRequest, Depth, DetectionEngine, KnowledgeDepth, MemoryKnowledgeStore,
    ModerationLevel, ToolResponse,
};

use crate::config::Config;

type CliAgent = Agent<DetectionEngine, MemoryKnowledgeStore>;

#[derive(Parser)]
#[command(name = "content-detector", version, about = "Multi-signal content detection and moderation")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pretty-print the JSON response
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run detection on one candidate
    Detect(CandidateArgs),

    /// Moderate one candidate
    Validate {
        #[command(flatten)]
        candidate: CandidateArgs,

        #[arg(long, default_value = "moderate")]
        level: ModerationLevel,

        /// Report the decision without carrying out its action
        #[arg(long)]
        no_auto_action: bool,
    },

    /// Detect relevance across a list of sources
    Discover {
        #[arg(required = true)]
        sources: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        content_types: Vec<ContentCategory>,

        #[arg(long, default_value = "deep")]
        depth: Depth,
    },

    /// Analyze, reconcile and enrich a list of targets
    Crawl {
        #[arg(required = true)]
        targets: Vec<String>,

        #[arg(long)]
        crawl_depth: Option<u32>,

        #[arg(long, value_delimiter = ',')]
        content_types: Vec<ContentCategory>,

        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Run the requested capabilities over one candidate
    Analyze {
        #[command(flatten)]
        candidate: CandidateArgs,

        #[arg(long = "analysis-depth", default_value = "standard")]
        analysis_depth: AnalysisDepth,

        #[arg(long, value_delimiter = ',')]
        capabilities: Vec<Capability>,
    },

    /// Analyze the accumulated knowledge counters
    Knowledge {
        /// trends, relationships, classification or validation
        analysis_type: String,

        #[arg(long, value_delimiter = ',')]
        data_types: Vec<ContentCategory>,

        #[arg(long, default_value = "all")]
        timeframe: String,

        #[arg(long, default_value = "detailed")]
        depth: KnowledgeDepth,
    },

    /// Show configuration and counters
    Status,
}

#[derive(Args)]
struct CandidateArgs {
    #[arg(long)]
    url: Option<String>,

    #[arg(long, conflicts_with = "content_file")]
    content: Option<String>,

    /// Read content from a file; non-UTF-8 files are inspected as bytes
    #[arg(long)]
    content_file: Option<PathBuf>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    mime_type: Option<String>,

    #[arg(long, default_value = "surface")]
    depth: Depth,
}

impl CandidateArgs {
    fn into_candidate(self) -> Result<ContentCandidate> {
        let content = match (self.content, self.content_file) {
            (Some(text), _) => Some(CandidateContent::Text(text)),
            (None, Some(path)) => {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Some(match String::from_utf8(bytes) {
                    Ok(text) => CandidateContent::Text(text),
                    Err(e) => CandidateContent::Bytes(e.into_bytes()),
                })
            }
            (None, None) => None,
        };

        let mut candidate = ContentCandidate::new().with_depth(self.depth);
        candidate.url = self.url;
        candidate.content = content;
        candidate.metadata.title = self.title;
        candidate.metadata.description = self.description;
        candidate.metadata.mime_type = self.mime_type;
        Ok(candidate)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,content_detector=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let store = MemoryKnowledgeStore::new().with_known_urls(config.known_urls()?);
    let engine = DetectionEngine::new(config.agent.max_content_len);
    let mut agent = Agent::with_config(engine, store, config.agent.clone());

    tracing::debug!(
        auto_learn = config.agent.auto_learn,
        auto_moderation = config.agent.auto_moderation,
        "Agent ready"
    );

    let success = run(&mut agent, cli.command, cli.pretty).await?;

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(agent: &mut CliAgent, command: Command, pretty: bool) -> Result<bool> {
    match command {
        Command::Detect(args) => {
            let candidate = args.into_candidate()?;
            respond(agent.detect_content(&candidate).await, pretty)
        }
        Command::Validate {
            candidate,
            level,
            no_auto_action,
        } => {
            let candidate = candidate.into_candidate()?;
            respond(agent.validate(&candidate, level, !no_auto_action).await, pretty)
        }
        Command::Discover {
            sources,
            content_types,
            depth,
        } => respond(agent.discover(&sources, &content_types, depth).await, pretty),
        Command::Crawl {
            targets,
            crawl_depth,
            content_types,
            batch_size,
        } => {
            let request = CrawlRequest {
                targets,
                crawl_depth,
                content_types,
                batch_size,
            };
            respond(agent.crawl(request).await, pretty)
        }
        Command::Analyze {
            candidate,
            analysis_depth,
            capabilities,
        } => {
            let capabilities: BTreeSet<Capability> = if capabilities.is_empty() {
                Capability::defaults()
            } else {
                capabilities.into_iter().collect()
            };
            let candidate = candidate.into_candidate()?;
            respond(
                agent
                    .universal_analysis(candidate, analysis_depth, &capabilities)
                    .await,
                pretty,
            )
        }
        Command::Knowledge {
            analysis_type,
            data_types,
            timeframe,
            depth,
        } => {
            let result = analysis_type.parse::<AnalysisType>().and_then(|analysis_type| {
                agent.analyze_knowledge(analysis_type, &data_types, &timeframe, depth)
            });
            respond(result, pretty)
        }
        Command::Status => respond(Ok(agent.status()), pretty),
    }
}

/// Print the response envelope on stdout and a one-line verdict on stderr.
fn respond<T: Serialize>(result: content_detector::Result<T>, pretty: bool) -> Result<bool> {
    let response = ToolResponse::from_result(result);

    let json = if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .context("Failed to serialize response")?;
    println!("{json}");

    match &response.error {
        None => eprintln!("{}", "✓ done".bright_green()),
        Some(error) => eprintln!("{} {}", "✗".bright_red(), error.red()),
    }

    Ok(response.success)
}
