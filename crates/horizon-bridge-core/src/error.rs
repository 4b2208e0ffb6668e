//! Error types for Horizon Bridge.

use crate::node::InstanceId;
use crate::queue::RenderId;

/// Result type alias for adaptor operations.
pub type Result<T> = std::result::Result<T, AdaptorError>;

/// Errors raised by the host adaptor.
///
/// These are contract violations by the caller (usually a test harness).
/// None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdaptorError {
    /// `run` was called on an adaptor that is already bound to a root.
    #[error("Adaptor is already bound to a root element")]
    InvalidRoot,

    /// The render id was never committed or has already been resolved.
    #[error("Unknown or already resolved render id '{0}'")]
    UnknownRenderId(RenderId),

    /// `resolve_update_callback(None)` was called with an empty queue.
    #[error("No pending update to resolve")]
    NoPendingUpdate,

    /// The renderer committed the same render id twice.
    #[error("Render id '{0}' has already been committed")]
    DuplicateRenderId(RenderId),

    /// A commit arrived before mount or after unmount.
    #[error("Adaptor instance is not mounted")]
    NotMounted,

    /// A mutation batch could not be applied to the host tree.
    #[error("Failed to apply mutations: {0}")]
    Tree(#[from] TreeError),
}

/// Errors raised while applying mutations to the host tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The mutation refers to a node that is not in the tree.
    #[error("Unknown host node {0}")]
    UnknownNode(InstanceId),

    /// An insert used an id that is already present.
    #[error("Host node {0} already exists")]
    DuplicateNode(InstanceId),

    /// A move would place a node inside its own subtree.
    #[error("Cannot move host node {0} into its own subtree")]
    CircularParentage(InstanceId),

    /// The container node cannot be updated, moved or removed.
    #[error("The container node cannot be mutated directly")]
    ContainerImmutable,

    /// An insert or move would nest nodes deeper than
    /// [`crate::node::MAX_DEPTH`] below the container.
    #[error("Host node {id} would sit at depth {depth}, deeper than the limit")]
    TooDeep {
        /// The inserted or moved node.
        id: InstanceId,
        /// Depth its deepest descendant would reach.
        depth: usize,
    },
}

/// Errors raised by the text query helpers on [`crate::testing::RenderResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The query has no defined matching semantics yet.
    #[error("Text query '{query}' is not implemented")]
    Unimplemented {
        /// Name of the query that was called.
        query: &'static str,
    },
}
