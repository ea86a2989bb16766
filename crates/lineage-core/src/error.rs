//! Error taxonomy for tree edits and file import

use thiserror::Error;

use crate::model::{Gender, NodeId, NodeKind};

/// Every failure is recoverable and leaves the graph untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("invalid parent {id}: a {kind} cannot {action}")]
    InvalidParent {
        id: NodeId,
        kind: NodeKind,
        action: &'static str,
    },

    #[error("invalid connection from {source_id} to {target_id}: {reason}")]
    InvalidConnection {
        source_id: NodeId,
        target_id: NodeId,
        reason: String,
    },

    #[error("invalid connection: a {gender} child cannot be connected to a {gender} spouse")]
    GenderConflict { gender: Gender },

    #[error("an edge already connects {0} and {1}")]
    DuplicateEdge(NodeId, NodeId),

    #[error("the family head {0} cannot be deleted")]
    ProtectedNode(NodeId),

    #[error("checksum mismatch: file says {expected}, contents hash to {actual}; the file was modified or corrupted")]
    ImportChecksumMismatch { expected: String, actual: String },

    #[error("cannot parse tree file: {0}")]
    ImportParseError(String),

    #[error("an import is in progress; structural edits are disabled")]
    Busy,
}

impl TreeError {
    pub(crate) fn connection(source: &NodeId, target: &NodeId, reason: impl Into<String>) -> Self {
        TreeError::InvalidConnection {
            source_id: source.clone(),
            target_id: target.clone(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        TreeError::ImportParseError(message.into())
    }
}

pub type Result<T> = std::result::Result<T, TreeError>;
