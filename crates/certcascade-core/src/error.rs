//! Error types for the Certcascade Core.

use thiserror::Error;

use crate::outcome::NodeState;
use crate::types::NodeIndex;

/// Core errors raised by graph and state bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown node index {0}")]
    UnknownNode(NodeIndex),

    #[error("invalid transition for node {node}: {from:?} -> {to:?}")]
    InvalidTransition {
        node: NodeIndex,
        from: NodeState,
        to: NodeState,
    },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
