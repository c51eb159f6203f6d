//! Shared error types for the engine

use crate::core::arena::NodeId;
use thiserror::Error;

/// Main error type for deadsweep operations
#[derive(Debug, Error)]
pub enum Error {
    /// A node handle that does not exist in the model
    #[error("unknown node handle {0:?}")]
    UnknownNode(NodeId),

    /// A node that has already been detached from the tree
    #[error("node {0:?} is already detached")]
    Detached(NodeId),

    /// A deletion shape the tree cannot express at this node
    #[error("structural inconsistency at {node:?}: {message}")]
    Structure { node: NodeId, message: String },

    /// Post-mutation normalizer failures (host collaborator)
    #[error("normalizer failed: {0}")]
    Normalize(#[source] anyhow::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML configuration parse errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a structural inconsistency error with node context
    pub fn structure(node: NodeId, message: impl Into<String>) -> Self {
        Self::Structure {
            node,
            message: message.into(),
        }
    }

    /// True when a sweep should skip this one candidate and keep going.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Structure { .. } | Self::Detached(_))
    }
}

/// Result type alias for deadsweep operations
pub type Result<T> = std::result::Result<T, Error>;
