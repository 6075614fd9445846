//! Block sources: where ticks get their input.

use std::f64::consts::TAU;
use std::path::Path;

use soundcheck_core::{BlockShape, Sample, SampleBlock};

use crate::wav::{WavSpec, read_wav};
use crate::{Error, Result};

/// Produces one fixed-shape block per tick.
pub trait AudioSource {
    /// Shape of every block this source produces.
    fn shape(&self) -> BlockShape;

    /// Sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Fills `block` with the next block of audio.
    ///
    /// Returns `Ok(false)` once the source is exhausted; `block` is then left
    /// zeroed. Fails if `block` does not have [`AudioSource::shape`].
    fn next_block(&mut self, block: &mut SampleBlock) -> Result<bool>;

    /// Rewinds to the first block.
    fn reset(&mut self) {}
}

/// Waveform of a [`TestSignal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalKind {
    /// Sine tone.
    Sine {
        /// Frequency in Hz.
        frequency: f64,
        /// Peak amplitude.
        amplitude: f64,
    },
    /// Uniform white noise from a fixed seed.
    Noise {
        /// Peak amplitude.
        amplitude: f64,
        /// PRNG seed; equal seeds give equal streams.
        seed: u32,
    },
    /// One sample of `amplitude` every `period` frames, zero otherwise.
    Impulse {
        /// Frames between impulses; zero means a single impulse at the start.
        period: usize,
        /// Impulse height.
        amplitude: f64,
    },
    /// All zeros.
    Silence,
}

impl SignalKind {
    /// Half-scale sine at `frequency` Hz.
    pub fn sine(frequency: f64) -> Self {
        Self::Sine {
            frequency,
            amplitude: 0.5,
        }
    }

    /// Half-scale white noise with the default seed.
    pub fn noise() -> Self {
        Self::Noise {
            amplitude: 0.5,
            seed: 0x5EED,
        }
    }

    /// Full-scale impulse train.
    pub fn impulse(period: usize) -> Self {
        Self::Impulse {
            period,
            amplitude: 1.0,
        }
    }

    /// Parses `sine`, `sine:440`, `noise`, `impulse`, `impulse:4410` or `silence`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_ascii_lowercase();
        let (name, arg) = match text.split_once(':') {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (text.as_str(), None),
        };
        match name {
            "sine" | "tone" => {
                let frequency = arg.map_or(Some(440.0), |a| {
                    a.trim_end_matches("hz").parse::<f64>().ok()
                })?;
                (frequency.is_finite() && frequency >= 0.0).then_some(Self::sine(frequency))
            }
            "noise" | "white" => Some(Self::noise()),
            "impulse" | "click" => {
                let period = arg.map_or(Some(0), |a| a.parse::<usize>().ok())?;
                Some(Self::impulse(period))
            }
            "silence" | "zero" => arg.is_none().then_some(Self::Silence),
            _ => None,
        }
    }
}

/// Deterministic generator for demos and tests.
///
/// Every channel of a block carries the same signal.
#[derive(Debug, Clone)]
pub struct TestSignal {
    kind: SignalKind,
    shape: BlockShape,
    sample_rate: u32,
    limit: Option<u64>,
    emitted: u64,
    phase: f64,
    rng_state: u32,
    frame: u64,
}

impl TestSignal {
    /// Creates an endless source.
    pub fn new(kind: SignalKind, shape: BlockShape, sample_rate: u32) -> Self {
        Self {
            kind,
            shape,
            sample_rate,
            limit: None,
            emitted: 0,
            phase: 0.0,
            rng_state: Self::seed(kind),
            frame: 0,
        }
    }

    /// Stops after `blocks` blocks.
    pub fn with_blocks(mut self, blocks: u64) -> Self {
        self.limit = Some(blocks);
        self
    }

    /// The waveform.
    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Blocks produced so far.
    pub fn blocks_emitted(&self) -> u64 {
        self.emitted
    }

    fn seed(kind: SignalKind) -> u32 {
        match kind {
            SignalKind::Noise { seed, .. } => seed,
            _ => 0,
        }
    }

    /// Advance the LCG and return a value in [-1.0, 1.0).
    #[inline]
    fn next_random(&mut self) -> Sample {
        self.rng_state = self
            .rng_state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        let upper = (self.rng_state >> 16) as u16;
        Sample::from(upper) / 32_768.0 - 1.0
    }

    #[inline]
    fn next_sample(&mut self) -> Sample {
        let value = match self.kind {
            SignalKind::Sine {
                frequency,
                amplitude,
            } => {
                let value = amplitude * self.phase.sin();
                self.phase += TAU * frequency / f64::from(self.sample_rate.max(1));
                if self.phase >= TAU {
                    self.phase -= TAU;
                }
                value
            }
            SignalKind::Noise { amplitude, .. } => amplitude * self.next_random(),
            SignalKind::Impulse { period, amplitude } => {
                let hit = if period == 0 {
                    self.frame == 0
                } else {
                    self.frame % period as u64 == 0
                };
                if hit { amplitude } else { 0.0 }
            }
            SignalKind::Silence => 0.0,
        };
        self.frame += 1;
        value
    }
}

impl AudioSource for TestSignal {
    fn shape(&self) -> BlockShape {
        self.shape
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_block(&mut self, block: &mut SampleBlock) -> Result<bool> {
        block.ensure_shape(self.shape)?;
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            block.clear();
            return Ok(false);
        }
        for i in 0..self.shape.frames {
            let value = self.next_sample();
            for ch in block.channels_mut() {
                ch[i] = value;
            }
        }
        self.emitted += 1;
        Ok(true)
    }

    fn reset(&mut self) {
        self.emitted = 0;
        self.phase = 0.0;
        self.rng_state = Self::seed(self.kind);
        self.frame = 0;
    }
}

/// Blocks read from a WAV file held in memory.
///
/// The last block is zero-padded when the file length is not a multiple of
/// the block length.
#[derive(Debug, Clone)]
pub struct WavSource {
    samples: Vec<f32>,
    spec: WavSpec,
    shape: BlockShape,
    cursor: usize,
}

impl WavSource {
    /// Loads `path` and cuts it into blocks of `frames` frames.
    pub fn open(path: impl AsRef<Path>, frames: usize) -> Result<Self> {
        let (samples, spec) = read_wav(path)?;
        Self::from_interleaved(samples, spec, frames)
    }

    /// Wraps interleaved samples already in memory.
    pub fn from_interleaved(samples: Vec<f32>, spec: WavSpec, frames: usize) -> Result<Self> {
        if spec.channels == 0 || frames == 0 {
            return Err(Error::UnsupportedFormat(format!(
                "{} channels in blocks of {frames} frames",
                spec.channels
            )));
        }
        Ok(Self {
            samples,
            spec,
            shape: BlockShape::new(usize::from(spec.channels), frames),
            cursor: 0,
        })
    }

    /// Format of the underlying audio.
    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Frames in the file.
    pub fn total_frames(&self) -> usize {
        self.samples.len() / self.shape.channels
    }

    /// Number of blocks the file yields, counting the padded tail.
    pub fn total_blocks(&self) -> usize {
        self.total_frames().div_ceil(self.shape.frames)
    }

    /// Frames already handed out.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl AudioSource for WavSource {
    fn shape(&self) -> BlockShape {
        self.shape
    }

    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn next_block(&mut self, block: &mut SampleBlock) -> Result<bool> {
        block.ensure_shape(self.shape)?;
        block.clear();
        let total = self.total_frames();
        if self.cursor >= total {
            return Ok(false);
        }
        let channels = self.shape.channels;
        let take = self.shape.frames.min(total - self.cursor);
        let start = self.cursor * channels;
        for (i, frame) in self.samples[start..start + take * channels]
            .chunks_exact(channels)
            .enumerate()
        {
            for (ch, &s) in frame.iter().enumerate() {
                block.channel_mut(ch)[i] = Sample::from(s);
            }
        }
        self.cursor += take;
        Ok(true)
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(source: &mut dyn AudioSource) -> Vec<Vec<Sample>> {
        let mut block = SampleBlock::new(source.shape());
        let mut blocks = Vec::new();
        while source.next_block(&mut block).unwrap() {
            blocks.push(block.channel(0).to_vec());
        }
        blocks
    }

    #[test]
    fn sine_starts_at_zero_and_stays_bounded() {
        let mut sig = TestSignal::new(SignalKind::sine(1000.0), BlockShape::new(2, 64), 48_000)
            .with_blocks(4);
        let blocks = collect(&mut sig);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0][0], 0.0);
        assert!(blocks.iter().flatten().all(|s| s.abs() <= 0.5));
    }

    #[test]
    fn channels_carry_same_signal() {
        let mut sig = TestSignal::new(SignalKind::noise(), BlockShape::new(2, 32), 44_100);
        let mut block = SampleBlock::new(sig.shape());
        assert!(sig.next_block(&mut block).unwrap());
        assert_eq!(block.channel(0), block.channel(1));
    }

    #[test]
    fn noise_is_repeatable_after_reset() {
        let mut sig =
            TestSignal::new(SignalKind::noise(), BlockShape::new(1, 128), 44_100).with_blocks(2);
        let first = collect(&mut sig);
        sig.reset();
        let second = collect(&mut sig);
        assert_eq!(first, second);
        assert!(first.iter().flatten().all(|s| (-0.5..0.5).contains(s)));
    }

    #[test]
    fn impulse_train_spans_blocks() {
        let mut sig =
            TestSignal::new(SignalKind::impulse(6), BlockShape::new(1, 4), 44_100).with_blocks(3);
        let flat: Vec<Sample> = collect(&mut sig).into_iter().flatten().collect();
        let hits: Vec<usize> = flat
            .iter()
            .enumerate()
            .filter(|(_, s)| **s != 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(hits, vec![0, 6]);
    }

    #[test]
    fn exhausted_source_clears_block() {
        let mut sig =
            TestSignal::new(SignalKind::sine(100.0), BlockShape::new(1, 8), 44_100).with_blocks(0);
        let mut block = SampleBlock::from_channels(vec![vec![1.0; 8]]).unwrap();
        assert!(!sig.next_block(&mut block).unwrap());
        assert!(block.channel(0).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn wrong_block_shape_rejected() {
        let mut sig = TestSignal::new(SignalKind::Silence, BlockShape::new(1, 8), 44_100);
        let mut block = SampleBlock::new(BlockShape::new(1, 4));
        assert!(matches!(sig.next_block(&mut block), Err(Error::Block(_))));
    }

    #[test]
    fn parse_signal_names() {
        assert_eq!(SignalKind::parse("sine"), Some(SignalKind::sine(440.0)));
        assert_eq!(SignalKind::parse("Sine:1000Hz"), Some(SignalKind::sine(1000.0)));
        assert_eq!(SignalKind::parse("impulse:4410"), Some(SignalKind::impulse(4410)));
        assert_eq!(SignalKind::parse("silence"), Some(SignalKind::Silence));
        assert_eq!(SignalKind::parse("noise"), Some(SignalKind::noise()));
        assert_eq!(SignalKind::parse("sine:fast"), None);
        assert_eq!(SignalKind::parse("saw"), None);
    }

    #[test]
    fn wav_source_pads_tail() {
        let spec = WavSpec {
            channels: 2,
            ..WavSpec::default()
        };
        let samples = vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let mut src = WavSource::from_interleaved(samples, spec, 2).unwrap();
        assert_eq!(src.total_frames(), 3);
        assert_eq!(src.total_blocks(), 2);

        let mut block = SampleBlock::new(src.shape());
        assert!(src.next_block(&mut block).unwrap());
        assert_eq!(block.channel(0), &[1.0, 2.0]);
        assert_eq!(block.channel(1), &[-1.0, -2.0]);
        assert!(src.next_block(&mut block).unwrap());
        assert_eq!(block.channel(0), &[3.0, 0.0]);
        assert_eq!(block.channel(1), &[-3.0, 0.0]);
        assert!(!src.next_block(&mut block).unwrap());

        src.reset();
        assert_eq!(src.position(), 0);
    }

    #[test]
    fn wav_source_rejects_zero_frames() {
        assert!(WavSource::from_interleaved(vec![], WavSpec::default(), 0).is_err());
    }
}
