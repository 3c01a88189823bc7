//! Error types for document tree operations

use super::NodeId;
use thiserror::Error;

/// Errors that can occur while reading or mutating a [`Document`](super::Document)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Handle does not belong to this document
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    /// The node has no parent to operate on
    #[error("Node {0} is not attached to the tree")]
    Detached(NodeId),

    /// Children can only be attached to elements
    #[error("Node {0} is not an element and cannot hold children")]
    NotAContainer(NodeId),

    /// The node is already part of the tree
    #[error("Node {child} is already attached to {parent}")]
    AlreadyAttached {
        /// Node being attached
        child: NodeId,
        /// Its current parent
        parent: NodeId,
    },

    /// Attaching would make a node its own ancestor
    #[error("Attaching {child} under {parent} would create a cycle")]
    Cycle {
        /// Node being attached
        child: NodeId,
        /// Requested parent
        parent: NodeId,
    },
}
