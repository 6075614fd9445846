//! Log-frequency chart built from smoothed bins.
//!
//! Retained bins are spread linearly between the low and high cutoff, then
//! placed on a logarithmic x axis:
//!
//! ```text
//! freq = i / len * (high - low) + low
//! x    = log10(freq / low) / log10(high / low) * width
//! ```
//!
//! Adjacent bins are averaged until `x` has advanced by at least
//! `1 / points_per_pixel`; the mean is written to slot
//! `floor(x * points_per_pixel)`. Slots not reached in a rebuild keep their
//! previous point.

use std::f64::consts::PI;

/// Default chart width in pixels.
pub const DEFAULT_WIDTH: usize = 640;
/// Default chart height in pixels.
pub const DEFAULT_HEIGHT: usize = 240;
/// Default number of chart slots per pixel column.
pub const DEFAULT_POINTS_PER_PIXEL: usize = 2;

/// Fixed axis metadata handed to renderers with every chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartAxes {
    /// Frequency at the left edge, in Hz.
    pub low_hz: f64,
    /// Frequency at the right edge, in Hz.
    pub high_hz: f64,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Transform size the magnitudes come from.
    pub transform_size: usize,
}

impl ChartAxes {
    /// Vertical position of a magnitude, 0 at the top.
    ///
    /// `y = (1 - log10(mag) / log10(N / 8)) * height`. Magnitudes at or below
    /// zero map to `+inf`; renderers clip.
    pub fn magnitude_y(&self, magnitude: f64) -> f64 {
        let full_scale = (self.transform_size as f64 / 8.0).log10();
        (1.0 - magnitude.log10() / full_scale) * self.height as f64
    }

    /// Vertical position of a phase in radians, wrapping every `2π`.
    pub fn phase_y(&self, phase: f64) -> f64 {
        ((phase + PI) / (2.0 * PI)).rem_euclid(1.0) * self.height as f64
    }

    /// Frequency at pixel column `x` on the log axis.
    pub fn frequency_at(&self, x: f64) -> f64 {
        self.low_hz * (self.high_hz / self.low_hz).powf(x / self.width as f64)
    }
}

/// One aggregated chart value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    /// Mean smoothed magnitude of the bins folded into this slot.
    pub magnitude: f64,
    /// Mean smoothed phase in radians.
    pub phase: f64,
}

/// Sparse chart of `width * points_per_pixel` slots.
#[derive(Debug, Clone)]
pub struct Chart {
    axes: ChartAxes,
    points_per_pixel: usize,
    slots: Vec<Option<ChartPoint>>,
}

impl Chart {
    /// Creates a chart with every slot empty.
    pub fn new(axes: ChartAxes, points_per_pixel: usize) -> Self {
        let points_per_pixel = points_per_pixel.max(1);
        Self {
            axes,
            points_per_pixel,
            slots: vec![None; axes.width * points_per_pixel],
        }
    }

    /// Axis metadata.
    pub fn axes(&self) -> &ChartAxes {
        &self.axes
    }

    /// Slots per pixel column.
    pub fn points_per_pixel(&self) -> usize {
        self.points_per_pixel
    }

    /// All slots, left to right.
    pub fn slots(&self) -> &[Option<ChartPoint>] {
        &self.slots
    }

    /// Pixel x of slot `index`.
    pub fn slot_x(&self, index: usize) -> f64 {
        index as f64 / self.points_per_pixel as f64
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Buckets smoothed bins into slots. Returns the number of slots written.
    ///
    /// `magnitudes` and `phases` hold one value per retained bin.
    pub fn rebuild(&mut self, magnitudes: &[f64], phases: &[f64]) -> usize {
        let len = magnitudes.len().min(phases.len());
        if len == 0 {
            return 0;
        }
        let ChartAxes {
            low_hz,
            high_hz,
            width,
            ..
        } = self.axes;
        let span = (high_hz / low_hz).log10();
        let step = 1.0 / self.points_per_pixel as f64;

        let mut last_x = -1.0;
        let mut acc_mag = 0.0;
        let mut acc_phase = 0.0;
        let mut count = 0usize;
        let mut written = 0;

        for (i, (&mag, &phase)) in magnitudes.iter().zip(phases).take(len).enumerate() {
            acc_mag += mag;
            acc_phase += phase;
            count += 1;

            let freq = (i as f64 / len as f64) * (high_hz - low_hz) + low_hz;
            let x = ((freq / low_hz).log10() / span * width as f64).max(0.0);
            if x - last_x < step {
                continue;
            }

            let point = ChartPoint {
                magnitude: acc_mag / count as f64,
                phase: acc_phase / count as f64,
            };
            acc_mag = 0.0;
            acc_phase = 0.0;
            count = 0;
            last_x = x;

            let slot = (x * self.points_per_pixel as f64) as usize;
            if let Some(target) = self.slots.get_mut(slot) {
                *target = Some(point);
                written += 1;
            }
        }
        written
    }
}
