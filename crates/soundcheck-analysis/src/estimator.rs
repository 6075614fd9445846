//! Smoothed per-bin spectrum estimate.
//!
//! [`SpectralEstimator`] owns a [`SpectralAccumulator`], runs the forward
//! transform over its window and keeps an exponentially smoothed magnitude
//! and phase for every retained bin:
//!
//! ```text
//! smoothed = smoothed * (1 - alpha) + instantaneous * alpha
//! ```
//!
//! Smoothing runs on every block. Turning the smoothed state into a chart is
//! a separate, throttled step (see [`crate::chart`] and [`crate::gate`]).

use rustfft::num_complex::Complex;
use soundcheck_core::SampleBlock;

use crate::accumulator::SpectralAccumulator;
use crate::error::AnalysisError;
use crate::fft::{Fft, Window};

/// Default transform size in points.
pub const DEFAULT_SIZE: usize = 4096;
/// Default low cutoff in Hz.
pub const DEFAULT_LOW_HZ: f64 = 10.0;
/// Default high cutoff in Hz.
pub const DEFAULT_HIGH_HZ: f64 = 20_000.0;
/// Default smoothing factor.
pub const DEFAULT_SMOOTHING: f64 = 0.4;

/// Settings for a [`SpectralEstimator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    /// Transform size in points.
    pub size: usize,
    /// Sample rate of the analysed stream, in Hz.
    pub sample_rate: f64,
    /// Lowest retained frequency, in Hz.
    pub low_hz: f64,
    /// Highest retained frequency, in Hz.
    pub high_hz: f64,
    /// Weight of the newest measurement, in `(0, 1]`.
    pub smoothing: f64,
    /// Window applied to a copy of the accumulator before each transform.
    pub window: Window,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            sample_rate: 44_100.0,
            low_hz: DEFAULT_LOW_HZ,
            high_hz: DEFAULT_HIGH_HZ,
            smoothing: DEFAULT_SMOOTHING,
            window: Window::Rectangular,
        }
    }
}

impl EstimatorConfig {
    /// Checks the settings and returns the retained bin range.
    ///
    /// `bin_low = floor(low / sr * N)` and `bin_high = ceil(high / sr * N)`,
    /// with `bin_high` clamped to `N / 2`.
    pub fn bin_range(&self) -> Result<(usize, usize), AnalysisError> {
        if self.size < 2 {
            return Err(AnalysisError::InvalidSize(self.size));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(AnalysisError::InvalidRate {
                what: "sample rate",
                value: self.sample_rate,
            });
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(AnalysisError::InvalidSmoothing(self.smoothing));
        }
        let band_error = || AnalysisError::InvalidBand {
            low: self.low_hz,
            high: self.high_hz,
            sample_rate: self.sample_rate,
        };
        if !(self.low_hz.is_finite() && self.high_hz.is_finite())
            || self.low_hz <= 0.0
            || self.high_hz <= self.low_hz
        {
            return Err(band_error());
        }

        let n = self.size as f64;
        let bin_low = (self.low_hz / self.sample_rate * n).floor() as usize;
        let bin_high = ((self.high_hz / self.sample_rate * n).ceil() as usize).min(self.size / 2);
        if bin_high <= bin_low {
            return Err(band_error());
        }
        Ok((bin_low, bin_high))
    }
}

/// Streaming spectrum estimate with per-bin exponential smoothing.
#[derive(Debug)]
pub struct SpectralEstimator {
    config: EstimatorConfig,
    accumulator: SpectralAccumulator,
    fft: Fft,
    coefficients: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    bin_low: usize,
    bin_high: usize,
    magnitude: Vec<f64>,
    phase: Vec<f64>,
}

impl SpectralEstimator {
    /// Creates an estimator. All buffers are sized here.
    pub fn new(config: EstimatorConfig) -> Result<Self, AnalysisError> {
        let (bin_low, bin_high) = config.bin_range()?;
        let bins = bin_high - bin_low;
        Ok(Self {
            config,
            accumulator: SpectralAccumulator::new(config.size),
            fft: Fft::new(config.size),
            coefficients: config.window.coefficients(config.size),
            spectrum: vec![Complex::new(0.0, 0.0); config.size],
            bin_low,
            bin_high,
            magnitude: vec![0.0; bins],
            phase: vec![0.0; bins],
        })
    }

    /// The settings this estimator was built with.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Retained bins as `[bin_low, bin_high)`.
    pub fn bin_range(&self) -> (usize, usize) {
        (self.bin_low, self.bin_high)
    }

    /// Number of retained bins.
    pub fn bin_count(&self) -> usize {
        self.bin_high - self.bin_low
    }

    /// Centre frequency of absolute bin `bin`, in Hz.
    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.config.sample_rate / self.config.size as f64
    }

    /// The accumulator feeding the transform.
    pub fn accumulator(&self) -> &SpectralAccumulator {
        &self.accumulator
    }

    /// Output of the most recent transform, all `size` points.
    pub fn spectrum(&self) -> &[Complex<f64>] {
        &self.spectrum
    }

    /// Smoothed magnitudes, one per retained bin.
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitude
    }

    /// Smoothed phases in radians, one per retained bin.
    pub fn phases(&self) -> &[f64] {
        &self.phase
    }

    /// Feeds one block into the accumulator.
    pub fn accept(&mut self, block: &SampleBlock) {
        self.accumulator.accept(block);
    }

    /// Runs the forward transform over a windowed copy of the accumulator.
    pub fn transform(&mut self) {
        for ((dst, pair), w) in self
            .spectrum
            .iter_mut()
            .zip(self.accumulator.interleaved().chunks_exact(2))
            .zip(&self.coefficients)
        {
            *dst = Complex::new(pair[0] * w, pair[1] * w);
        }
        self.fft.forward_complex(&mut self.spectrum);
    }

    /// Folds the latest transform into the smoothed magnitude and phase.
    ///
    /// A non-finite instantaneous value is taken as `0.0`.
    pub fn update_bins(&mut self) {
        let alpha = self.config.smoothing;
        let bins = &self.spectrum[self.bin_low..self.bin_high];
        for ((c, mag), phase) in bins
            .iter()
            .zip(self.magnitude.iter_mut())
            .zip(self.phase.iter_mut())
        {
            let m = finite_or_zero(c.norm());
            let p = finite_or_zero(c.im.atan2(c.re));
            *mag = *mag * (1.0 - alpha) + m * alpha;
            *phase = *phase * (1.0 - alpha) + p * alpha;
        }
    }

    /// Accepts a block, transforms and updates the smoothed bins.
    pub fn process_block(&mut self, block: &SampleBlock) {
        self.accept(block);
        self.transform();
        self.update_bins();
    }

    /// Sets the smoothed state to the latest instantaneous values.
    pub fn snap_to_instantaneous(&mut self) {
        let bins = &self.spectrum[self.bin_low..self.bin_high];
        for ((c, mag), phase) in bins
            .iter()
            .zip(self.magnitude.iter_mut())
            .zip(self.phase.iter_mut())
        {
            *mag = finite_or_zero(c.norm());
            *phase = finite_or_zero(c.im.atan2(c.re));
        }
    }

    /// Clears the accumulator and the smoothed state.
    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.spectrum.fill(Complex::new(0.0, 0.0));
        self.magnitude.fill(0.0);
        self.phase.fill(0.0);
    }
}

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize) -> EstimatorConfig {
        EstimatorConfig {
            size,
            sample_rate: 8000.0,
            low_hz: 1.0,
            high_hz: 4000.0,
            ..EstimatorConfig::default()
        }
    }

    fn dc(level: f64, len: usize) -> SampleBlock {
        SampleBlock::from_channels(vec![vec![level; len]]).unwrap()
    }

    #[test]
    fn default_bins_for_44k() {
        let est = SpectralEstimator::new(EstimatorConfig::default()).unwrap();
        // floor(10 / 44100 * 4096) = 0, ceil(20000 / 44100 * 4096) = 1858
        assert_eq!(est.bin_range(), (0, 1858));
        assert_eq!(est.magnitudes().len(), 1858);
    }

    #[test]
    fn high_bin_clamped_to_nyquist() {
        let cfg = EstimatorConfig {
            sample_rate: 22050.0,
            ..EstimatorConfig::default()
        };
        assert_eq!(cfg.bin_range().unwrap(), (1, 2048));
    }

    #[test]
    fn invalid_settings_rejected() {
        let bad = [
            EstimatorConfig { size: 1, ..config(8) },
            EstimatorConfig { sample_rate: 0.0, ..config(8) },
            EstimatorConfig { smoothing: 0.0, ..config(8) },
            EstimatorConfig { smoothing: 1.5, ..config(8) },
            EstimatorConfig { low_hz: 0.0, ..config(8) },
            EstimatorConfig { high_hz: 0.5, ..config(8) },
        ];
        for cfg in bad {
            assert!(SpectralEstimator::new(cfg).is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn smoothing_first_step_from_zero() {
        let mut est = SpectralEstimator::new(config(8)).unwrap();
        est.process_block(&dc(1.0, 8));
        // DC of 1.0 over 8 points: bin 0 magnitude 8.
        assert!((est.magnitudes()[0] - 8.0 * 0.4).abs() < 1e-9);
    }

    #[test]
    fn smoothing_two_step_formula() {
        let mut est = SpectralEstimator::new(config(8)).unwrap();
        est.accept(&dc(1.0, 8));
        est.transform();
        est.snap_to_instantaneous();
        let m0 = est.magnitudes()[0];
        assert!((m0 - 8.0).abs() < 1e-9);

        est.process_block(&dc(2.0, 8));
        let m1 = 16.0;
        let expected = m0 * (1.0 - 0.4) + m1 * 0.4;
        assert!((est.magnitudes()[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn window_applies_to_copy_only() {
        let cfg = EstimatorConfig {
            window: Window::Hann,
            ..config(8)
        };
        let mut est = SpectralEstimator::new(cfg).unwrap();
        est.process_block(&dc(1.0, 8));
        assert!(est.accumulator().interleaved().chunks(2).all(|p| p[0] == 1.0));
        assert!(est.spectrum()[0].norm() < 8.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut est = SpectralEstimator::new(config(8)).unwrap();
        est.process_block(&dc(1.0, 8));
        est.reset();
        assert!(est.magnitudes().iter().all(|&m| m == 0.0));
        assert_eq!(est.accumulator().cursor(), 0);
    }
}
