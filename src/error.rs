//! Error types for the ideograph engine.
//!
//! Every fallible operation returns [`Result`]. Errors are local to a single
//! call: an operation that fails leaves the graph and the walker exactly as
//! they were before the call.

use crate::core::{ForkId, Pole};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IdeographError>;

/// Every failure the engine can report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdeographError {
    /// Malformed fork tree, cross-link, pattern or engine parameter.
    ///
    /// Raised at build time only; not recoverable for the offending input.
    #[error("configuration error: {0}")]
    Config(String),

    /// The fork's parent has not been answered yet (ancestor gating).
    #[error("fork {fork} is not reachable: ancestor {missing_ancestor} is unanswered")]
    UnreachableFork {
        /// Fork the caller tried to answer.
        fork: ForkId,
        /// Shallowest unanswered ancestor on the path from the root.
        missing_ancestor: ForkId,
    },

    /// The fork id is not part of the graph.
    #[error("unknown fork: {0}")]
    UnknownFork(ForkId),

    /// The fork was already answered with the other pole.
    ///
    /// The choice log is append-only; use `walker::supersede` to revise.
    #[error("fork {fork} already answered with pole {existing}; supersede to revise")]
    AnswerConflict {
        /// Fork being re-answered.
        fork: ForkId,
        /// Pole recorded earlier.
        existing: Pole,
    },

    /// The matcher was called with an empty pattern set.
    #[error("no pattern provided")]
    NoPatternProvided,

    /// A strict accessor was used on sparse data (no triads, no basin).
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// CBOR or JSON encoding/decoding failed.
    #[error("codec error: {0}")]
    Codec(String),
}

impl IdeographError {
    /// Shorthand for building a [`IdeographError::Config`].
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        IdeographError::Config(msg.into())
    }

    /// Whether the caller can recover by issuing different calls.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, IdeographError::Config(_))
    }
}

impl From<serde_cbor::Error> for IdeographError {
    fn from(err: serde_cbor::Error) -> Self {
        IdeographError::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for IdeographError {
    fn from(err: serde_json::Error) -> Self {
        IdeographError::Codec(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_fatal() {
        assert!(!IdeographError::config("cycle").is_recoverable());
        assert!(IdeographError::NoPatternProvided.is_recoverable());
        assert!(IdeographError::UnknownFork(ForkId::from("x")).is_recoverable());
    }

    #[test]
    fn unreachable_message_names_ancestor() {
        let err = IdeographError::UnreachableFork {
            fork: ForkId::from("trade"),
            missing_ancestor: ForkId::from("markets"),
        };
        let msg = err.to_string();
        assert!(msg.contains("trade"));
        assert!(msg.contains("markets"));
    }
}
