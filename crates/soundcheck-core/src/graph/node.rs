//! Graph node types: identifiers, insert specs and the node itself.

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;

use crate::block::{BlockShape, SampleBlock};
use crate::stage::Stage;

/// Stable identifier of a node, unique within one graph.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageId(String);

impl StageId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StageId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for StageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&StageId> for StageId {
    fn from(id: &StageId) -> Self {
        id.clone()
    }
}

impl core::fmt::Display for StageId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declared pre- and post-chain of a node, by identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsertSpec {
    /// Nodes run before the own stage, in order.
    pub pre: Vec<StageId>,
    /// Nodes run after the own stage, in order.
    pub post: Vec<StageId>,
}

impl InsertSpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends identifiers to the pre-chain.
    pub fn with_pre<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StageId>,
    {
        self.pre.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Appends identifiers to the post-chain.
    pub fn with_post<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StageId>,
    {
        self.post.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Returns true if neither chain has members.
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }
}

/// A vertex of the routing graph.
///
/// Chain members are stored as arena indices of nodes registered earlier.
/// The scratch block is private to the node and only ever written by the
/// node's own routes.
pub struct InsertNode {
    pub(crate) id: StageId,
    pub(crate) pre: Vec<usize>,
    pub(crate) post: Vec<usize>,
    pub(crate) own: Option<Box<dyn Stage + Send>>,
    pub(crate) scratch: SampleBlock,
    pub(crate) substitutions: u64,
}

impl InsertNode {
    pub(crate) fn new(id: StageId, shape: Option<BlockShape>) -> Self {
        Self {
            id,
            pre: Vec::new(),
            post: Vec::new(),
            own: None,
            scratch: shape.map(SampleBlock::new).unwrap_or_default(),
            substitutions: 0,
        }
    }

    /// The node's identifier.
    pub fn id(&self) -> &StageId {
        &self.id
    }

    /// Number of routing steps: pre-chain, own stage, post-chain.
    #[inline]
    pub fn stage_count(&self) -> usize {
        self.pre.len() + usize::from(self.own.is_some()) + self.post.len()
    }

    /// Number of pre-chain members.
    pub fn pre_len(&self) -> usize {
        self.pre.len()
    }

    /// Number of post-chain members.
    pub fn post_len(&self) -> usize {
        self.post.len()
    }

    /// Returns true once an own stage is installed.
    pub fn has_own_stage(&self) -> bool {
        self.own.is_some()
    }

    /// Name of the installed own stage.
    pub fn own_stage_name(&self) -> Option<&'static str> {
        self.own.as_ref().map(|stage| stage.name())
    }

    /// Shape the scratch block is currently sized for.
    pub fn scratch_shape(&self) -> BlockShape {
        self.scratch.shape()
    }

    /// Count of non-finite samples replaced after the own stage.
    pub fn substitutions(&self) -> u64 {
        self.substitutions
    }
}

impl core::fmt::Debug for InsertNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InsertNode")
            .field("id", &self.id)
            .field("pre", &self.pre)
            .field("own", &self.own_stage_name())
            .field("post", &self.post)
            .field("scratch", &self.scratch.shape())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;

    #[test]
    fn stage_id_looks_up_by_str() {
        let mut index = BTreeMap::new();
        index.insert(StageId::from("fft"), 3usize);
        assert_eq!(index.get("fft"), Some(&3));
        assert_eq!(StageId::new(String::from("fft")).as_str(), "fft");
    }

    #[test]
    fn insert_spec_builders_append() {
        let spec = InsertSpec::new().with_pre(["a"]).with_pre(["b"]).with_post(["c"]);
        assert_eq!(spec.pre, [StageId::from("a"), StageId::from("b")]);
        assert_eq!(spec.post, [StageId::from("c")]);
        assert!(!spec.is_empty());
        assert!(InsertSpec::default().is_empty());
    }

    #[test]
    fn fresh_node_has_no_steps() {
        let node = InsertNode::new(StageId::from("input"), Some(BlockShape::new(2, 16)));
        assert_eq!(node.stage_count(), 0);
        assert_eq!(node.scratch_shape(), BlockShape::new(2, 16));
        assert_eq!(node.own_stage_name(), None);
    }
}
