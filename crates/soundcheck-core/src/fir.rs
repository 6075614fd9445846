//! Unit-gain FIR delay-line stage.
//!
//! [`DelayLine`] keeps the last three input samples of every channel and maps
//! each new sample to a fixed linear combination of the current sample and
//! that history. History is updated once per sample, in input order, and
//! carries across block boundaries.
//!
//! State is kept per channel index. A stereo block never mixes the left
//! history into the right channel.

use alloc::vec;
use alloc::vec::Vec;

use crate::block::{Sample, SampleBlock};
use crate::error::RouteError;
use crate::stage::Stage;

/// Number of past samples kept per channel.
pub const HISTORY_LEN: usize = 3;

/// Fixed coefficient sets for [`DelayLine`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FirKernel {
    /// `(x[n] + x[n-1] + x[n-2]) / 3`, a three-tap moving average.
    #[default]
    Average3,
    /// `(x[n] + x[n-3]) / 2`, a feed-forward comb with a three-sample delay.
    Comb3,
}

impl FirKernel {
    /// Coefficients for `[x[n], x[n-1], x[n-2], x[n-3]]`.
    pub const fn taps(self) -> [Sample; HISTORY_LEN + 1] {
        match self {
            Self::Average3 => [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.0],
            Self::Comb3 => [0.5, 0.0, 0.0, 0.5],
        }
    }

    /// Parses a kernel name (`average3`, `comb3`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "average3" | "average" | "lowpass" => Some(Self::Average3),
            "comb3" | "comb" => Some(Self::Comb3),
            _ => None,
        }
    }

    /// Canonical name of the kernel.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Average3 => "average3",
            Self::Comb3 => "comb3",
        }
    }
}

/// FIR stage with independent per-channel history.
///
/// # Example
///
/// ```rust
/// use soundcheck_core::{BlockShape, DelayLine, FirKernel, SampleBlock, Stage};
///
/// let mut fir = DelayLine::new(FirKernel::Average3, 1);
/// let input = SampleBlock::from_channels(vec![vec![3.0, 0.0, 0.0, 0.0]]).unwrap();
/// let mut output = SampleBlock::new(BlockShape::new(1, 4));
/// fir.process(&mut output, &input).unwrap();
/// assert_eq!(output.channel(0), &[1.0, 1.0, 1.0, 0.0]);
/// ```
#[derive(Clone, Debug)]
pub struct DelayLine {
    kernel: FirKernel,
    taps: [Sample; HISTORY_LEN + 1],
    /// `history[ch][k]` holds `x[n-1-k]` for channel `ch`.
    history: Vec<[Sample; HISTORY_LEN]>,
}

impl DelayLine {
    /// Creates a delay line sized for `channels` channels.
    pub fn new(kernel: FirKernel, channels: usize) -> Self {
        Self {
            kernel,
            taps: kernel.taps(),
            history: vec![[0.0; HISTORY_LEN]; channels],
        }
    }

    /// Returns the kernel in use.
    pub fn kernel(&self) -> FirKernel {
        self.kernel
    }

    /// Number of channels the history is sized for.
    pub fn channels(&self) -> usize {
        self.history.len()
    }

    /// Returns the stored history of one channel, most recent first.
    pub fn history(&self, channel: usize) -> Option<&[Sample; HISTORY_LEN]> {
        self.history.get(channel)
    }

    /// Processes one sample of one channel, updating that channel's history.
    #[inline]
    fn tick(taps: &[Sample; HISTORY_LEN + 1], h: &mut [Sample; HISTORY_LEN], x: Sample) -> Sample {
        let x = if x.is_finite() { x } else { 0.0 };
        let y = taps[0] * x + taps[1] * h[0] + taps[2] * h[1] + taps[3] * h[2];
        h[2] = h[1];
        h[1] = h[0];
        h[0] = x;
        y
    }
}

impl Stage for DelayLine {
    fn process(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        output.ensure_shape(input.shape())?;
        if self.history.len() != input.channel_count() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                from = self.history.len(),
                to = input.channel_count(),
                "fir: channel count changed, resizing history"
            );
            self.history
                .resize(input.channel_count(), [0.0; HISTORY_LEN]);
        }

        let taps = self.taps;
        for ((dst, src), h) in output
            .channels_mut()
            .zip(input.channels())
            .zip(self.history.iter_mut())
        {
            for (d, &x) in dst.iter_mut().zip(src) {
                *d = Self::tick(&taps, h, x);
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        for h in &mut self.history {
            *h = [0.0; HISTORY_LEN];
        }
    }

    fn name(&self) -> &'static str {
        self.kernel.name()
    }
}
