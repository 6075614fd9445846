//! Graph construction, chain resolution and block routing.
//!
//! [`GraphBuilder`] registers nodes in declaration order and resolves their
//! chains eagerly. [`RoutingGraph`] owns the resolved arena and routes blocks
//! through it with two buffers per node.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::mem;

use crate::block::{BlockShape, SampleBlock};
use crate::error::RouteError;
use crate::stage::Stage;

use super::node::{InsertNode, InsertSpec, StageId};

/// Incrementally assembles a [`RoutingGraph`].
///
/// # Usage
///
/// 1. Create a builder with [`new()`](Self::new), optionally pre-sizing
///    scratch blocks with [`with_block_shape()`](Self::with_block_shape)
/// 2. Register nodes with [`add_node()`](Self::add_node); chain members
///    must already be registered
/// 3. Install own stages with [`set_own_stage()`](Self::set_own_stage)
/// 4. Finish with [`build()`](Self::build)
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<InsertNode>,
    index: BTreeMap<StageId, usize>,
    shape: Option<BlockShape>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sizes every node's scratch block to `shape`.
    ///
    /// Routing a block of a different shape still works; the scratch block is
    /// resized on that route.
    pub fn with_block_shape(mut self, shape: BlockShape) -> Self {
        self.shape = Some(shape);
        for node in &mut self.nodes {
            node.scratch.conform_to(shape);
        }
        self
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if a node is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Registers a node and resolves its chains.
    ///
    /// Every identifier in `spec` must name a node registered earlier. A
    /// node cannot name itself. On error the builder is left unchanged.
    pub fn add_node(
        &mut self,
        id: impl Into<StageId>,
        spec: &InsertSpec,
    ) -> Result<(), RouteError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(RouteError::DuplicateNode(id));
        }
        let limit = self.nodes.len();
        let pre = self.resolve(&id, &spec.pre, limit)?;
        let post = self.resolve(&id, &spec.post, limit)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            node = %id,
            pre = pre.len(),
            post = post.len(),
            "graph_add: insert node"
        );

        let mut node = InsertNode::new(id.clone(), self.shape);
        node.pre = pre;
        node.post = post;
        self.index.insert(id, limit);
        self.nodes.push(node);
        Ok(())
    }

    /// Appends more members to an existing node's chains.
    ///
    /// Members must be registered before the node itself, which keeps the
    /// graph acyclic. On error neither chain is modified.
    pub fn add_inserts(&mut self, id: &str, spec: &InsertSpec) -> Result<(), RouteError> {
        let slot = self.slot(id)?;
        let owner = self.nodes[slot].id.clone();
        let pre = self.resolve(&owner, &spec.pre, slot)?;
        let post = self.resolve(&owner, &spec.post, slot)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            node = %owner,
            pre = pre.len(),
            post = post.len(),
            "graph_inserts: appended"
        );

        let node = &mut self.nodes[slot];
        node.pre.extend(pre);
        node.post.extend(post);
        Ok(())
    }

    /// Installs the own stage of a node.
    pub fn set_own_stage(
        &mut self,
        id: &str,
        stage: Box<dyn Stage + Send>,
    ) -> Result<(), RouteError> {
        let slot = self.slot(id)?;
        install(&mut self.nodes[slot], stage)
    }

    /// Finishes construction.
    pub fn build(self) -> RoutingGraph {
        #[cfg(feature = "tracing")]
        tracing::debug!(nodes = self.nodes.len(), "graph_build: wiring frozen");

        RoutingGraph {
            nodes: self.nodes,
            index: self.index,
        }
    }

    fn slot(&self, id: &str) -> Result<usize, RouteError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| RouteError::UnknownNode(id.to_string()))
    }

    /// Maps identifiers to arena slots strictly below `limit`.
    fn resolve(
        &self,
        owner: &StageId,
        refs: &[StageId],
        limit: usize,
    ) -> Result<Vec<usize>, RouteError> {
        refs.iter()
            .map(|reference| match self.index.get(reference) {
                Some(&slot) if slot < limit => Ok(slot),
                _ => Err(RouteError::UnresolvedInsert {
                    node: owner.clone(),
                    reference: reference.clone(),
                }),
            })
            .collect()
    }
}

fn install(node: &mut InsertNode, stage: Box<dyn Stage + Send>) -> Result<(), RouteError> {
    if node.own.is_some() {
        return Err(RouteError::DuplicateOwnStage(node.id.clone()));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(node = %node.id, stage = stage.name(), "graph_install: own stage");

    node.own = Some(stage);
    Ok(())
}

/// Resolved identifier-to-node wiring.
///
/// Chains are fixed once the graph is built. The graph itself does no work
/// per tick; the host calls [`route()`](Self::route) on the entry node.
#[derive(Debug)]
pub struct RoutingGraph {
    nodes: Vec<InsertNode>,
    index: BTreeMap<StageId, usize>,
}

impl RoutingGraph {
    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if a node is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Iterates over node identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &StageId> {
        self.nodes.iter().map(|node| &node.id)
    }

    /// Returns a node by identifier.
    pub fn node(&self, id: &str) -> Option<&InsertNode> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    /// Returns the resolved chains of a node as identifiers.
    pub fn inserts(&self, id: &str) -> Option<InsertSpec> {
        let node = self.node(id)?;
        let names = |slots: &[usize]| -> Vec<StageId> {
            slots.iter().map(|&slot| self.nodes[slot].id.clone()).collect()
        };
        Some(InsertSpec {
            pre: names(&node.pre),
            post: names(&node.post),
        })
    }

    /// Returns the entry points of one node.
    pub fn port(&mut self, id: &str) -> Result<InsertPort<'_>, RouteError> {
        let slot = self.slot(id)?;
        Ok(InsertPort { graph: self, slot })
    }

    /// Installs a node's own stage. Fails if one is already installed.
    pub fn set_own_stage(
        &mut self,
        id: &str,
        stage: Box<dyn Stage + Send>,
    ) -> Result<(), RouteError> {
        let slot = self.slot(id)?;
        install(&mut self.nodes[slot], stage)
    }

    /// Copies `input` into `output` sample for sample.
    ///
    /// Fails with [`RouteError::ShapeMismatch`] and leaves `output` untouched
    /// if the shapes differ.
    pub fn passthrough(
        &self,
        id: &str,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        self.slot(id)?;
        output.copy_from(input)
    }

    /// Routes `input` through a node's pre-chain, own stage and post-chain.
    ///
    /// The result is written into `output`. `input` is only read.
    pub fn route(
        &mut self,
        id: &str,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        let slot = self.slot(id)?;
        route_node(&mut self.nodes, slot, output, input)
    }

    /// Clears the state of every own stage.
    pub fn reset(&mut self) {
        for stage in self.nodes.iter_mut().filter_map(|node| node.own.as_mut()) {
            stage.reset();
        }
    }

    fn slot(&self, id: &str) -> Result<usize, RouteError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| RouteError::UnknownNode(id.to_string()))
    }
}

/// Entry points of a single node: external input, stage install and
/// passthrough.
pub struct InsertPort<'a> {
    graph: &'a mut RoutingGraph,
    slot: usize,
}

impl InsertPort<'_> {
    /// Identifier of the node behind this port.
    pub fn id(&self) -> &StageId {
        &self.graph.nodes[self.slot].id
    }

    /// Routes a block through the node.
    pub fn feed(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        route_node(&mut self.graph.nodes, self.slot, output, input)
    }

    /// Installs the node's own stage.
    pub fn install(&mut self, stage: Box<dyn Stage + Send>) -> Result<(), RouteError> {
        install(&mut self.graph.nodes[self.slot], stage)
    }

    /// Copies `input` into `output`, bypassing every stage of the node.
    pub fn passthrough(
        &self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        output.copy_from(input)
    }
}

/// One step of a node's route.
#[derive(Clone, Copy)]
enum Step {
    Member(usize),
    Own,
}

/// Routes through the node at `slot`.
///
/// The node's chains, own stage and scratch are moved out for the duration
/// of the route and put back afterwards, also on error. Chain members always
/// sit at lower slots, so the recursion never revisits a node that is
/// currently moved out.
fn route_node(
    nodes: &mut [InsertNode],
    slot: usize,
    output: &mut SampleBlock,
    input: &SampleBlock,
) -> Result<(), RouteError> {
    let shape = output.shape();
    if input.shape() != shape {
        return Err(RouteError::ShapeMismatch {
            expected: shape,
            found: input.shape(),
        });
    }

    let node = &mut nodes[slot];
    let steps = node.stage_count();
    if steps == 0 {
        return output.copy_from(input);
    }

    let pre = mem::take(&mut node.pre);
    let post = mem::take(&mut node.post);
    let mut own = node.own.take();
    let mut scratch = mem::take(&mut node.scratch);
    scratch.conform_to(shape);

    let result = run_steps(
        nodes,
        &pre,
        own.as_mut(),
        &post,
        steps % 2 == 0,
        &mut scratch,
        output,
        input,
    );

    let node = &mut nodes[slot];
    node.pre = pre;
    node.post = post;
    node.own = own;
    node.scratch = scratch;
    match result {
        Ok(Some(replaced)) => {
            node.substitutions += replaced as u64;
            Ok(())
        }
        Ok(None) => Err(RouteError::RoutingInvariant(node.id.clone())),
        Err(err) => Err(err),
    }
}

/// Ping-pongs between `scratch` and `output` over every step.
///
/// Returns the number of non-finite samples replaced after the own stage,
/// or `None` if the last write did not land in `output`.
#[allow(clippy::too_many_arguments)]
fn run_steps(
    nodes: &mut [InsertNode],
    pre: &[usize],
    mut own: Option<&mut Box<dyn Stage + Send>>,
    post: &[usize],
    first_to_scratch: bool,
    scratch: &mut SampleBlock,
    output: &mut SampleBlock,
    input: &SampleBlock,
) -> Result<Option<usize>, RouteError> {
    let output_addr = core::ptr::from_ref::<SampleBlock>(output);
    let (mut target, mut other) = if first_to_scratch {
        (scratch, output)
    } else {
        (output, scratch)
    };

    let steps = pre
        .iter()
        .map(|&slot| Step::Member(slot))
        .chain(own.is_some().then_some(Step::Own))
        .chain(post.iter().map(|&slot| Step::Member(slot)));

    let mut replaced = 0;
    for (k, step) in steps.enumerate() {
        let source: &SampleBlock = if k == 0 { input } else { &*other };
        match step {
            Step::Member(slot) => route_node(nodes, slot, target, source)?,
            Step::Own => {
                if let Some(stage) = own.as_mut() {
                    stage.process(target, source)?;
                    replaced += target.sanitize();
                }
            }
        }
        mem::swap(&mut target, &mut other);
    }

    Ok(core::ptr::eq(&*other, output_addr).then_some(replaced))
}
