//! Error taxonomy for rankfuse.
//!
//! Three families of failure exist: missing inputs (`NotFound`, `Io`),
//! precondition violations (`InvalidWeights`, `InvalidParameter`,
//! `UnknownMethod`, `Config`), and batch-level aggregation
//! (`PartialBatch`). Degenerate inputs such as constant-score runs or empty
//! feedback sets are not errors and never surface here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankfuseError {
    #[error("{kind} not found: {}", path.display())]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown {kind} '{value}'")]
    UnknownMethod { kind: &'static str, value: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("retrieval failed for query {query_id}: {message}")]
    Retrieval { query_id: String, message: String },

    #[error("{failed} of {total} queries failed (first: {first})")]
    PartialBatch {
        failed: usize,
        total: usize,
        first: String,
    },
}

impl RankfuseError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code used in robot output.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Io { .. } => "io",
            Self::Config(_) => "config",
            Self::InvalidWeights(_) => "invalid_weights",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::UnknownMethod { .. } => "unknown_method",
            Self::Serialization(_) => "serialization",
            Self::Retrieval { .. } => "retrieval",
            Self::PartialBatch { .. } => "partial_batch",
        }
    }
}

pub type Result<T> = std::result::Result<T, RankfuseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_path() {
        let err = RankfuseError::NotFound {
            kind: "run file",
            path: PathBuf::from("/tmp/missing.run"),
        };
        assert_eq!(err.to_string(), "run file not found: /tmp/missing.run");
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn invalid_parameter_carries_value() {
        let err = RankfuseError::InvalidParameter {
            name: "alpha",
            value: "1.5".to_string(),
            reason: "must be within [0, 1]".to_string(),
        };
        assert!(err.to_string().contains("alpha = 1.5"));
    }
}
