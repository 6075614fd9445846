//! Soundcheck Core - block routing for streaming audio
//!
//! This crate provides the pieces that move fixed-size blocks of samples
//! through a configurable set of processing stages, with zero allocation in
//! the steady-state audio path.
//!
//! # Core Abstractions
//!
//! ## Buffers
//!
//! - [`SampleBlock`] - Per-channel `f64` storage with a fixed [`BlockShape`]
//!
//! ## Stages
//!
//! - [`Stage`] - Object-safe trait for anything that maps one block to another
//! - [`FnStage`] - Adapter turning a closure into a [`Stage`]
//! - [`DelayLine`] - Unit-gain FIR stage with per-channel history
//! - [`Gain`] - Constant gain stage
//!
//! ## Routing
//!
//! - [`InsertNode`] - Graph vertex with a pre-chain, an own stage and a post-chain
//! - [`GraphBuilder`] / [`RoutingGraph`] - Identifier-to-node wiring, resolved eagerly
//! - [`InsertPort`] - Per-node entry points (feed, install, passthrough)
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (with `alloc`). Disable the default `std`
//! feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! soundcheck-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use soundcheck_core::{BlockShape, DelayLine, FirKernel, GraphBuilder, InsertSpec, SampleBlock};
//!
//! let mut builder = GraphBuilder::new().with_block_shape(BlockShape::new(1, 4));
//! builder.add_node("fir", &InsertSpec::default())?;
//! builder.set_own_stage("fir", Box::new(DelayLine::new(FirKernel::Average3, 1)))?;
//! builder.add_node("input", &InsertSpec::new().with_pre(["fir"]))?;
//! let mut graph = builder.build();
//!
//! let input = SampleBlock::from_channels(vec![vec![3.0, 0.0, 0.0, 0.0]])?;
//! let mut output = SampleBlock::new(BlockShape::new(1, 4));
//! graph.route("input", &mut output, &input)?;
//! assert_eq!(output.channel(0), &[1.0, 1.0, 1.0, 0.0]);
//! # Ok::<(), soundcheck_core::RouteError>(())
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: scratch and history buffers are sized at construction
//! - **Eager wiring**: every chain reference is resolved when the graph is built
//! - **Explicit ownership**: exactly two buffers per node take part in a route

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod block;
pub mod error;
pub mod fir;
pub mod gain;
pub mod graph;
pub mod stage;

pub use block::{BlockShape, Sample, SampleBlock};
pub use error::RouteError;
pub use fir::{DelayLine, FirKernel};
pub use gain::Gain;
pub use graph::{GraphBuilder, InsertNode, InsertPort, InsertSpec, RoutingGraph, StageId};
pub use stage::{FnStage, Passthrough, Stage};
