//! Errors raised while wiring or routing blocks.
//!
//! Three families share one enum so callers can propagate with `?` from any
//! graph operation:
//!
//! - **Configuration** errors ([`UnresolvedInsert`](RouteError::UnresolvedInsert),
//!   [`DuplicateNode`](RouteError::DuplicateNode),
//!   [`DuplicateOwnStage`](RouteError::DuplicateOwnStage),
//!   [`UnknownNode`](RouteError::UnknownNode)) abort graph construction.
//! - [`ShapeMismatch`](RouteError::ShapeMismatch) is raised before any sample
//!   is written.
//! - [`RoutingInvariant`](RouteError::RoutingInvariant) means the final write
//!   of a route did not land in the caller's buffer. It is an internal bug and
//!   must be treated as fatal.

use alloc::string::String;

use crate::block::BlockShape;
use crate::graph::StageId;

/// Errors that can occur while building a routing graph or routing a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A pre/post insert names a node that is not registered (yet).
    UnresolvedInsert {
        /// Node whose insert list holds the reference.
        node: StageId,
        /// The identifier that could not be resolved.
        reference: StageId,
    },
    /// Two nodes were registered under the same identifier.
    DuplicateNode(StageId),
    /// A node already has its own stage installed.
    DuplicateOwnStage(StageId),
    /// The identifier does not name a node in this graph.
    UnknownNode(String),
    /// Two blocks that must share a shape do not.
    ShapeMismatch {
        /// Shape required by the operation (usually the output's).
        expected: BlockShape,
        /// Shape actually supplied.
        found: BlockShape,
    },
    /// A block was built from channels of unequal length.
    RaggedChannels {
        /// Length of the first channel.
        expected: usize,
        /// Index of the first channel whose length differs.
        channel: usize,
        /// Length of that channel.
        found: usize,
    },
    /// The routed result did not end up in the caller-supplied output block.
    RoutingInvariant(StageId),
}

impl RouteError {
    /// Returns true for errors that can only come from graph construction.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedInsert { .. }
                | Self::DuplicateNode(_)
                | Self::DuplicateOwnStage(_)
                | Self::UnknownNode(_)
        )
    }

    /// Returns true for errors that indicate an internal routing bug.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RoutingInvariant(_))
    }
}

impl core::fmt::Display for RouteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnresolvedInsert { node, reference } => write!(
                f,
                "node '{node}' inserts '{reference}', which is not registered before it"
            ),
            Self::DuplicateNode(id) => write!(f, "node '{id}' is declared more than once"),
            Self::DuplicateOwnStage(id) => {
                write!(f, "node '{id}' already has its own stage installed")
            }
            Self::UnknownNode(id) => write!(f, "no node named '{id}'"),
            Self::ShapeMismatch { expected, found } => {
                write!(f, "block shape mismatch: expected {expected}, found {found}")
            }
            Self::RaggedChannels {
                expected,
                channel,
                found,
            } => write!(
                f,
                "channel {channel} has {found} samples, expected {expected}"
            ),
            Self::RoutingInvariant(id) => write!(
                f,
                "routing invariant violated in node '{id}': result not in output buffer"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RouteError {}
