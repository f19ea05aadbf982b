//! Typed errors for the content detector.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match on
//! what went wrong and decide whether it is a per-item or a top-level failure.

use thiserror::Error;

/// Errors raised while running detection on a single candidate.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Candidate carries neither a URL nor any content
    #[error("candidate has neither url nor content")]
    EmptyCandidate,

    /// Content exceeds the configured size limit
    #[error("content too large: {len} bytes (max {max})")]
    ContentTooLarge { len: usize, max: usize },

    /// Detector backend could not serve the request
    #[error("detector unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Errors raised by knowledge-base collaborators.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// Backing store could not be reached or refused the operation
    #[error("knowledge store unavailable: {reason}")]
    Unavailable { reason: String },

    /// Payload could not be serialized for persistence
    #[error("knowledge payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced at the pipeline operation boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Detection failed for a directly requested candidate
    #[error("detection failed: {0}")]
    Detection(#[from] DetectionError),

    /// Knowledge lookup or persistence failed
    #[error("knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    /// Caller asked for an analysis type that does not exist
    #[error("unknown analysis type: {value}")]
    UnknownAnalysisType { value: String },

    /// Caller asked for a capability that does not exist
    #[error("unknown capability: {value}")]
    UnknownCapability { value: String },

    /// Caller supplied an unparseable enum value (depth, level, ...)
    #[error("invalid {field}: {value}")]
    InvalidArgument { field: &'static str, value: String },

    /// Batch size must be at least one
    #[error("batch size must be greater than zero")]
    InvalidBatchSize,
}

/// Result type alias for detection operations.
pub type DetectResult<T> = std::result::Result<T, DetectionError>;

/// Result type alias for knowledge collaborators.
pub type KnowledgeResult<T> = std::result::Result<T, KnowledgeError>;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
