//! Insert-node routing for the soundcheck pipeline.
//!
//! A routing graph maps stable stage identifiers to [`InsertNode`]s. Each
//! node owns an ordered pre-chain, an optional own stage and an ordered
//! post-chain; chain members are other nodes of the same graph. Routing a
//! block through a node runs pre, own and post in order, each step reading
//! the previous step's output.
//!
//! # Architecture
//!
//! The system uses a **two-object split**:
//!
//! - [`GraphBuilder`] accepts nodes in declaration order and resolves every
//!   chain reference against nodes registered before it. An unknown or
//!   forward reference fails immediately, so the finished graph is acyclic.
//! - [`RoutingGraph`] holds the resolved arena. Chains are read-only from
//!   here on; only a node's own stage may still be installed, once.
//!
//! # Buffer Ownership
//!
//! Routing one node touches exactly two blocks: the caller's output and the
//! node's private scratch. The first write goes to scratch when the number
//! of steps is even and to the output when it is odd, so the last write
//! always lands in the caller's block without a final copy. The route checks
//! this after the last step and reports
//! [`RouteError::RoutingInvariant`](crate::RouteError::RoutingInvariant)
//! otherwise.
//!
//! # Example
//!
//! ```rust
//! use soundcheck_core::{BlockShape, Gain, GraphBuilder, InsertSpec, SampleBlock};
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_node("half", &InsertSpec::default())?;
//! builder.set_own_stage("half", Box::new(Gain::new(0.5)))?;
//! builder.add_node("input", &InsertSpec::new().with_pre(["half"]).with_post(["half"]))?;
//! let mut graph = builder.build();
//!
//! let input = SampleBlock::from_channels(vec![vec![4.0, 8.0]])?;
//! let mut output = SampleBlock::new(BlockShape::new(1, 2));
//! graph.port("input")?.feed(&mut output, &input)?;
//! assert_eq!(output.channel(0), &[1.0, 2.0]);
//! # Ok::<(), soundcheck_core::RouteError>(())
//! ```

mod node;
mod processing;

pub use node::{InsertNode, InsertSpec, StageId};
pub use processing::{GraphBuilder, InsertPort, RoutingGraph};
