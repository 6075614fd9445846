//! Circular transform window fed from an unbounded block stream.
//!
//! The window is stored interleaved, `[re0, im0, re1, im1, ...]`, so it can
//! be handed to a complex transform with no reshaping. Each accepted sample
//! position is the mean of all channels at that position; the imaginary
//! slot is always zero.

use soundcheck_core::SampleBlock;

/// Folds blocks of any length into a fixed-size transform window.
///
/// There is no "window full" event. The newest `size()` samples are always
/// present; older ones are overwritten as the cursor wraps.
#[derive(Debug, Clone)]
pub struct SpectralAccumulator {
    window: Vec<f64>,
    cursor: usize,
}

impl SpectralAccumulator {
    /// Creates an accumulator for a transform of `size` points.
    ///
    /// The interleaved storage holds `2 * size` values and is never resized.
    pub fn new(size: usize) -> Self {
        Self {
            window: vec![0.0; 2 * size.max(1)],
            cursor: 0,
        }
    }

    /// Number of complex points in the window.
    pub fn size(&self) -> usize {
        self.window.len() / 2
    }

    /// Current write position in the interleaved storage, in `[0, 2 * size)`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The interleaved real/imaginary window.
    pub fn interleaved(&self) -> &[f64] {
        &self.window
    }

    /// Real part of point `index`.
    pub fn real(&self, index: usize) -> f64 {
        self.window[2 * index]
    }

    /// Writes the channel mean of every sample position of `block`.
    ///
    /// Blocks shorter than the window, longer than it, or with no channels
    /// are all accepted. A non-finite mean is stored as `0.0`.
    pub fn accept(&mut self, block: &SampleBlock) {
        let channels = block.channel_count();
        if channels == 0 {
            return;
        }
        let scale = 1.0 / channels as f64;
        for frame in 0..block.frames() {
            let sum: f64 = block.channels().map(|ch| ch[frame]).sum();
            let mean = sum * scale;
            self.window[self.cursor] = if mean.is_finite() { mean } else { 0.0 };
            self.window[self.cursor + 1] = 0.0;
            self.cursor = (self.cursor + 2) % self.window.len();
        }
    }

    /// Zeros the window and rewinds the cursor.
    pub fn reset(&mut self) {
        self.window.fill(0.0);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: usize, len: usize) -> SampleBlock {
        SampleBlock::from_channels(vec![(start..start + len).map(|v| v as f64).collect()])
            .unwrap()
    }

    #[test]
    fn exactly_one_window_fills_without_wrap_artifacts() {
        let mut acc = SpectralAccumulator::new(8);
        acc.accept(&ramp(1, 8));
        assert_eq!(acc.cursor(), 0);
        for i in 0..8 {
            assert_eq!(acc.real(i), (i + 1) as f64);
            assert_eq!(acc.interleaved()[2 * i + 1], 0.0);
        }
    }

    #[test]
    fn one_and_a_half_windows_overwrite_the_head() {
        let mut acc = SpectralAccumulator::new(8);
        acc.accept(&ramp(1, 12));
        assert_eq!(acc.cursor(), 8);
        let reals: Vec<f64> = (0..8).map(|i| acc.real(i)).collect();
        assert_eq!(reals, [9.0, 10.0, 11.0, 12.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn partial_blocks_continue_where_they_left_off() {
        let mut acc = SpectralAccumulator::new(4);
        acc.accept(&ramp(1, 3));
        acc.accept(&ramp(4, 3));
        let reals: Vec<f64> = (0..4).map(|i| acc.real(i)).collect();
        assert_eq!(reals, [5.0, 6.0, 3.0, 4.0]);
        assert_eq!(acc.cursor(), 4);
    }

    #[test]
    fn channels_are_averaged() {
        let mut acc = SpectralAccumulator::new(4);
        let block =
            SampleBlock::from_channels(vec![vec![1.0, 2.0], vec![3.0, -2.0], vec![5.0, 3.0]])
                .unwrap();
        acc.accept(&block);
        assert_eq!(acc.real(0), 3.0);
        assert_eq!(acc.real(1), 1.0);
    }

    #[test]
    fn non_finite_mean_stored_as_zero() {
        let mut acc = SpectralAccumulator::new(2);
        let block = SampleBlock::from_channels(vec![vec![f64::INFINITY, 1.0]]).unwrap();
        acc.accept(&block);
        assert_eq!(acc.real(0), 0.0);
        assert_eq!(acc.real(1), 1.0);
    }

    #[test]
    fn reset_rewinds() {
        let mut acc = SpectralAccumulator::new(4);
        acc.accept(&ramp(1, 3));
        acc.reset();
        assert_eq!(acc.cursor(), 0);
        assert!(acc.interleaved().iter().all(|&v| v == 0.0));
    }
}
