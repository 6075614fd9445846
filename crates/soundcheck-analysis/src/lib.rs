//! Soundcheck Analysis - streaming spectrum estimation
//!
//! This crate turns an unbounded stream of sample blocks into a smoothed,
//! log-frequency spectrum chart:
//!
//! - [`fft`] - Planned forward transform and analysis windows
//! - [`accumulator`] - Circular transform window fed block by block
//! - [`estimator`] - Forward transform plus per-bin exponential smoothing
//! - [`chart`] - Log-frequency bucketing into a sparse chart
//! - [`gate`] - Render-rate throttling (wall clock, tick count) and clocks
//! - [`render`] - Renderer seam and a shared-snapshot renderer
//! - [`stage`] - [`SpectrumStage`], the passthrough routing stage tying it together
//!
//! ## Pipeline
//!
//! Every tick: accept block → transform → update smoothed bins. Only when
//! the [`RenderGate`] allows: rebuild chart → hand to [`SpectrumRenderer`].
//!
//! ```rust
//! use soundcheck_analysis::{AlwaysRender, SnapshotRenderer, SpectrumConfig, SpectrumStage};
//! use soundcheck_core::{BlockShape, SampleBlock, Stage};
//!
//! let renderer = SnapshotRenderer::new();
//! let snapshot = renderer.handle();
//! let mut stage = SpectrumStage::new(SpectrumConfig::default())?
//!     .with_gate(Box::new(AlwaysRender))
//!     .with_renderer(Box::new(renderer));
//!
//! let input = SampleBlock::new(BlockShape::new(2, 1024));
//! let mut output = SampleBlock::new(input.shape());
//! stage.process(&mut output, &input)?;
//! assert_eq!(snapshot.lock().unwrap().frame, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod accumulator;
pub mod chart;
pub mod error;
pub mod estimator;
pub mod fft;
pub mod gate;
pub mod render;
pub mod stage;

pub use accumulator::SpectralAccumulator;
pub use chart::{Chart, ChartAxes, ChartPoint};
pub use error::AnalysisError;
pub use estimator::{EstimatorConfig, SpectralEstimator};
pub use fft::{Fft, Window};
pub use gate::{AlwaysRender, Clock, FrameRateGate, ManualClock, RenderGate, SystemClock, TickDivider};
pub use render::{ChartSnapshot, NullRenderer, SharedSnapshot, SnapshotRenderer, SpectrumRenderer};
pub use stage::{SpectrumConfig, SpectrumStage};
