//! Declarative graph configuration for soundcheck.
//!
//! Graphs are described in TOML as an ordered list of stages, each with a
//! kind, optional pre/post inserts and string parameters. This crate loads
//! and saves those files, validates them, and builds a
//! [`soundcheck_core::RoutingGraph`] from them.
//!
//! # Features
//!
//! - **Graph files**: load and save [`GraphConfig`] as TOML
//! - **Validation**: report every problem in a file at once
//! - **Building**: instantiate stages and wire inserts
//! - **Factory layouts**: bundled graphs that need no files
//!
//! # Example
//!
//! ```rust
//! use soundcheck_config::{build_graph, BuildOptions, GateMode, GraphConfig, StageEntry};
//! use soundcheck_core::SampleBlock;
//!
//! let config = GraphConfig::new("demo")
//!     .with_block_size(256)
//!     .with_stage(StageEntry::new("fft", "spectrum").with_param("size", "1024"))
//!     .with_stage(StageEntry::new("input", "input").with_post(["fft"]));
//!
//! let mut built = build_graph(&config, BuildOptions::new().with_gate(GateMode::EveryTick))?;
//! let input = SampleBlock::new(built.shape);
//! let mut output = SampleBlock::new(built.shape);
//! built.tick(&mut output, &input)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod build;
mod error;
mod graph_config;
mod kind;
mod stage_entry;

/// Graph file validation.
pub mod validation;

/// Factory layouts bundled with the library.
pub mod layouts;

pub use build::{BuildOptions, BuiltGraph, GateMode, build_graph, spectrum_config, spectrum_stage_ids};
pub use error::{ConfigError, FileAction};
pub use graph_config::{DEFAULT_BLOCK_SIZE, DEFAULT_ENTRY, DEFAULT_SAMPLE_RATE, GraphConfig};
pub use kind::StageKind;
pub use layouts::{FACTORY_LAYOUT_NAMES, factory_layouts, get_factory_layout, is_factory_layout};
pub use stage_entry::{InsertsConfig, StageEntry, parse_param_value};
pub use validation::{ValidationError, ValidationResult, validate_graph, validate_stage};
