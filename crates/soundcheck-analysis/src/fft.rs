//! Planned forward transform and analysis windows.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Taper applied to the transform input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Window {
    /// Every weight is 1.
    #[default]
    Rectangular,
    /// Raised cosine.
    Hann,
    /// Raised cosine on a pedestal.
    Hamming,
    /// Three-term Blackman.
    Blackman,
    /// Four-term Blackman-Harris.
    BlackmanHarris,
}

impl Window {
    /// Weight at phase `x = 2πi/n`.
    fn weight(self, x: f64) -> f64 {
        match self {
            Self::Rectangular => 1.0,
            Self::Hann => 0.5 - 0.5 * x.cos(),
            Self::Hamming => 0.54 - 0.46 * x.cos(),
            Self::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
            Self::BlackmanHarris => {
                0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                    - 0.01168 * (3.0 * x).cos()
            }
        }
    }

    /// Multiplies `samples` by the window in place.
    pub fn apply(self, samples: &mut [f64]) {
        if self == Self::Rectangular {
            return;
        }
        let n = samples.len() as f64;
        for (i, s) in samples.iter_mut().enumerate() {
            *s *= self.weight(TAU * i as f64 / n);
        }
    }

    /// Window weights for a frame of `len` samples.
    pub fn coefficients(self, len: usize) -> Vec<f64> {
        let mut weights = vec![1.0; len];
        self.apply(&mut weights);
        weights
    }

    /// Looks a window up by the name used in graph files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rectangular" | "rect" | "none" => Some(Self::Rectangular),
            "hann" | "hanning" => Some(Self::Hann),
            "hamming" => Some(Self::Hamming),
            "blackman" => Some(Self::Blackman),
            "blackman-harris" | "blackmanharris" => Some(Self::BlackmanHarris),
            _ => None,
        }
    }
}

/// Forward transform of a fixed length with its own scratch space.
///
/// The plan and scratch are created once, so [`Fft::forward_complex`] does
/// not allocate.
pub struct Fft {
    plan: Arc<dyn rustfft::Fft<f64>>,
    scratch: Vec<Complex<f64>>,
    len: usize,
}

impl Fft {
    /// Plans a forward transform of `len` points.
    pub fn new(len: usize) -> Self {
        let plan = FftPlanner::new().plan_fft_forward(len);
        let scratch = vec![Complex::default(); plan.get_inplace_scratch_len()];
        Self { plan, scratch, len }
    }

    /// Number of points per transform.
    pub fn size(&self) -> usize {
        self.len
    }

    /// Transforms `buffer` in place. `buffer.len()` must equal [`Fft::size`].
    pub fn forward_complex(&mut self, buffer: &mut [Complex<f64>]) {
        self.plan.process_with_scratch(buffer, &mut self.scratch);
    }
}

impl fmt::Debug for Fft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(len: usize, input: impl Fn(usize) -> f64) -> Vec<Complex<f64>> {
        let mut fft = Fft::new(len);
        let mut buf: Vec<_> = (0..len).map(|i| Complex::new(input(i), 0.0)).collect();
        fft.forward_complex(&mut buf);
        buf
    }

    #[test]
    fn hann_tapers_to_zero_at_start() {
        let w = Window::Hann.coefficients(64);
        assert!(w[0].abs() < 1e-12);
        assert!((w[32] - 1.0).abs() < 1e-12);
        assert!(w.iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn rectangular_leaves_samples_alone() {
        let mut samples = [0.25, -1.0, 3.0];
        Window::Rectangular.apply(&mut samples);
        assert_eq!(samples, [0.25, -1.0, 3.0]);
        assert_eq!(Window::from_name("Hann"), Some(Window::Hann));
        assert_eq!(Window::from_name("kaiser"), None);
    }

    #[test]
    fn constant_input_lands_in_bin_zero() {
        let spectrum = transform(32, |_| 1.0);
        assert!((spectrum[0].re - 32.0).abs() < 1e-9);
        assert!(spectrum[1..].iter().all(|c| c.norm() < 1e-9));
    }

    #[test]
    fn cosine_peaks_at_its_bin() {
        let spectrum = transform(64, |i| (TAU * 5.0 * i as f64 / 64.0).cos());
        let peak = spectrum[..32]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(5));
        assert!((spectrum[5].norm() - 32.0).abs() < 1e-9);
    }
}
