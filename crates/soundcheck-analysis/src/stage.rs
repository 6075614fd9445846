//! Spectrum analyser as a routing stage.
//!
//! [`SpectrumStage`] is installed as the own stage of a graph node. Every
//! block it sees is passed through unchanged, folded into the estimator and
//! transformed; the chart is rebuilt and rendered only when the render gate
//! allows it.

use soundcheck_core::{RouteError, SampleBlock, Stage};

use crate::chart::{
    Chart, ChartAxes, DEFAULT_HEIGHT, DEFAULT_POINTS_PER_PIXEL, DEFAULT_WIDTH,
};
use crate::error::AnalysisError;
use crate::estimator::{EstimatorConfig, SpectralEstimator};
use crate::gate::{DEFAULT_FPS, FrameRateGate, RenderGate, SystemClock};
use crate::render::{NullRenderer, SpectrumRenderer};

/// Settings for a [`SpectrumStage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumConfig {
    /// Transform and smoothing settings.
    pub estimator: EstimatorConfig,
    /// Chart width in pixels.
    pub width: usize,
    /// Chart height in pixels.
    pub height: usize,
    /// Chart slots per pixel column.
    pub points_per_pixel: usize,
    /// Maximum chart rebuilds per second for the default gate. Must be
    /// positive and finite; use a tick-based gate to render every tick.
    pub fps: f64,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            points_per_pixel: DEFAULT_POINTS_PER_PIXEL,
            fps: DEFAULT_FPS,
        }
    }
}

impl SpectrumConfig {
    /// Axis metadata for charts built with these settings.
    pub fn axes(&self) -> ChartAxes {
        ChartAxes {
            low_hz: self.estimator.low_hz,
            high_hz: self.estimator.high_hz,
            width: self.width,
            height: self.height,
            transform_size: self.estimator.size,
        }
    }

    /// Checks every setting without building anything.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.estimator.bin_range()?;
        if self.width == 0 || self.height == 0 || self.points_per_pixel == 0 {
            return Err(AnalysisError::InvalidChart {
                width: self.width,
                height: self.height,
                points_per_pixel: self.points_per_pixel,
            });
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(AnalysisError::InvalidRate {
                what: "frame rate",
                value: self.fps,
            });
        }
        Ok(())
    }
}

/// Passthrough stage that feeds a throttled spectrum display.
///
/// # Example
///
/// ```rust
/// use soundcheck_analysis::{AlwaysRender, SpectrumConfig, SpectrumStage};
/// use soundcheck_core::{BlockShape, SampleBlock, Stage};
///
/// let mut stage = SpectrumStage::new(SpectrumConfig::default())?
///     .with_gate(Box::new(AlwaysRender));
/// let input = SampleBlock::new(BlockShape::new(1, 1024));
/// let mut output = SampleBlock::new(input.shape());
/// stage.process(&mut output, &input)?;
/// assert_eq!(stage.rebuilds(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SpectrumStage {
    config: SpectrumConfig,
    estimator: SpectralEstimator,
    chart: Chart,
    gate: Box<dyn RenderGate>,
    renderer: Box<dyn SpectrumRenderer>,
    ticks: u64,
    rebuilds: u64,
}

impl SpectrumStage {
    /// Creates a stage gated by the wall clock at `config.fps` that renders
    /// to nothing.
    pub fn new(config: SpectrumConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let estimator = SpectralEstimator::new(config.estimator)?;
        Ok(Self {
            chart: Chart::new(config.axes(), config.points_per_pixel),
            gate: Box::new(FrameRateGate::with_fps(SystemClock::new(), config.fps)),
            renderer: Box::new(NullRenderer),
            config,
            estimator,
            ticks: 0,
            rebuilds: 0,
        })
    }

    /// Replaces the render gate.
    pub fn with_gate(mut self, gate: Box<dyn RenderGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Replaces the renderer.
    pub fn with_renderer(mut self, renderer: Box<dyn SpectrumRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Settings in use.
    pub fn config(&self) -> &SpectrumConfig {
        &self.config
    }

    /// The estimator behind this stage.
    pub fn estimator(&self) -> &SpectralEstimator {
        &self.estimator
    }

    /// The chart as of the last rebuild.
    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    /// Blocks processed.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Chart rebuilds performed.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Passes `input` through and updates the estimate; rebuilds the chart
    /// if the gate allows.
    pub fn on_insert(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        output.copy_from(input)?;
        self.estimator.process_block(input);
        self.ticks += 1;
        if self.gate.ready() {
            self.rebuild_chart();
        }
        Ok(())
    }

    /// Rebuilds the chart from the smoothed bins and renders it.
    pub fn rebuild_chart(&mut self) {
        self.chart
            .rebuild(self.estimator.magnitudes(), self.estimator.phases());
        self.renderer.render(self.chart.axes(), self.chart.slots());
        self.rebuilds += 1;
    }
}

impl Stage for SpectrumStage {
    fn process(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        self.on_insert(output, input)
    }

    fn reset(&mut self) {
        self.estimator.reset();
        self.chart.clear();
        self.gate.reset();
    }

    fn name(&self) -> &'static str {
        "spectrum"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{ManualClock, TickDivider};
    use soundcheck_core::BlockShape;
    use std::time::Duration;

    fn small() -> SpectrumConfig {
        SpectrumConfig {
            estimator: EstimatorConfig {
                size: 64,
                sample_rate: 8000.0,
                low_hz: 10.0,
                high_hz: 4000.0,
                ..EstimatorConfig::default()
            },
            width: 16,
            height: 8,
            ..SpectrumConfig::default()
        }
    }

    #[test]
    fn passes_input_through() {
        let mut stage = SpectrumStage::new(small()).unwrap();
        let input = SampleBlock::from_channels(vec![vec![0.1, -0.2, 0.3]]).unwrap();
        let mut output = SampleBlock::new(input.shape());
        stage.process(&mut output, &input).unwrap();
        assert_eq!(output, input);
        assert_eq!(stage.ticks(), 1);
    }

    #[test]
    fn mismatched_output_is_rejected_before_analysis() {
        let mut stage = SpectrumStage::new(small()).unwrap();
        let input = SampleBlock::new(BlockShape::new(1, 4));
        let mut output = SampleBlock::new(BlockShape::new(2, 4));
        assert!(stage.process(&mut output, &input).is_err());
        assert_eq!(stage.ticks(), 0);
    }

    #[test]
    fn fast_ticks_rebuild_once() {
        let clock = ManualClock::new();
        let mut stage = SpectrumStage::new(small())
            .unwrap()
            .with_gate(Box::new(FrameRateGate::with_fps(clock.clone(), 60.0)));
        let input = SampleBlock::new(BlockShape::new(1, 16));
        let mut output = SampleBlock::new(input.shape());

        stage.process(&mut output, &input).unwrap();
        clock.advance(Duration::from_millis(4));
        stage.process(&mut output, &input).unwrap();
        assert_eq!(stage.ticks(), 2);
        assert_eq!(stage.rebuilds(), 1);

        clock.advance(Duration::from_millis(20));
        stage.process(&mut output, &input).unwrap();
        clock.advance(Duration::from_millis(20));
        stage.process(&mut output, &input).unwrap();
        assert_eq!(stage.rebuilds(), 3);
    }

    #[test]
    fn tick_divider_swaps_in_without_touching_smoothing() {
        let mut stage = SpectrumStage::new(small())
            .unwrap()
            .with_gate(Box::new(TickDivider::new(4)));
        let input = SampleBlock::from_channels(vec![vec![1.0; 64]]).unwrap();
        let mut output = SampleBlock::new(input.shape());
        for _ in 0..8 {
            stage.process(&mut output, &input).unwrap();
        }
        assert_eq!(stage.rebuilds(), 2);
        // DC of 1.0 over 64 points converges towards 64 at bin 0.
        let expected = 64.0 * (1.0 - 0.6f64.powi(8));
        assert!((stage.estimator().magnitudes()[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn invalid_chart_rejected() {
        let cfg = SpectrumConfig {
            width: 0,
            ..small()
        };
        assert!(matches!(
            SpectrumStage::new(cfg),
            Err(AnalysisError::InvalidChart { .. })
        ));
    }

    #[test]
    fn frame_rate_must_be_positive_and_finite() {
        for fps in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let cfg = SpectrumConfig { fps, ..small() };
            assert!(
                matches!(
                    cfg.validate(),
                    Err(AnalysisError::InvalidRate { what: "frame rate", .. })
                ),
                "fps {fps} accepted"
            );
        }
        let cfg = SpectrumConfig { fps: 0.5, ..small() };
        assert!(cfg.validate().is_ok());
    }
}
