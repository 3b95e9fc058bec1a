//! Error type shared by the whole crate.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::NodeId;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Every failure a benchmark run can end with. None of them are retried.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Non-positive or nonsensical sizing, raised before touching the store.
    #[error("invalid size: {0}")]
    InvalidSize(String),
    /// A node with this id is already stored.
    #[error("node {0} already exists")]
    DuplicateId(NodeId),
    /// A relationship endpoint or traversal start that is not stored.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    /// The store has no reference node to start traversals from.
    #[error("store has no reference node")]
    StoreUninitialized,
    /// The graph violates the shape a traversal depends on.
    #[error("broken traversal at node {node}: {reason}")]
    BrokenTraversal {
        /// Node the walk was standing on.
        node: NodeId,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// Write attempted against a store opened read-only.
    #[error("store is opened read-only")]
    ReadOnly,
    /// Store files failed validation.
    #[error("corruption detected: {0}")]
    Corruption(String),
    /// Payload (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Command lookup or argument binding failed.
    #[error("{0}")]
    Command(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BenchError {
    pub(crate) fn invalid_size(what: impl Into<String>) -> Self {
        BenchError::InvalidSize(what.into())
    }
}
