//! Per-channel sample storage for one tick.
//!
//! A [`SampleBlock`] holds `channels × frames` samples as one `Vec` per
//! channel. Every channel has the same length for the lifetime of the block;
//! the only way to change that is [`SampleBlock::conform_to`], which is the
//! explicit reconfiguration point used by insert nodes for their scratch
//! buffers.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::RouteError;

/// Sample type used throughout the routing core.
pub type Sample = f64;

/// Channel count and per-channel length of a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockShape {
    /// Number of channels.
    pub channels: usize,
    /// Samples per channel.
    pub frames: usize,
}

impl BlockShape {
    /// Creates a shape with the given channel count and frames per channel.
    pub const fn new(channels: usize, frames: usize) -> Self {
        Self { channels, frames }
    }

    /// Total number of samples across all channels.
    pub const fn len(&self) -> usize {
        self.channels * self.frames
    }

    /// Returns true if the shape holds no samples.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Display for BlockShape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}x{}", self.channels, self.frames)
    }
}

/// A block of audio: one equally sized `Vec<f64>` per channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBlock {
    channels: Vec<Vec<Sample>>,
    frames: usize,
}

impl SampleBlock {
    /// Creates a zeroed block with the given shape.
    pub fn new(shape: BlockShape) -> Self {
        Self {
            channels: vec![vec![0.0; shape.frames]; shape.channels],
            frames: shape.frames,
        }
    }

    /// Builds a block from owned channels.
    ///
    /// Fails with [`RouteError::RaggedChannels`] if the channels differ in length.
    pub fn from_channels(channels: Vec<Vec<Sample>>) -> Result<Self, RouteError> {
        let frames = channels.first().map_or(0, Vec::len);
        if let Some((channel, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != frames)
        {
            return Err(RouteError::RaggedChannels {
                expected: frames,
                channel,
                found: ch.len(),
            });
        }
        Ok(Self { channels, frames })
    }

    /// Returns the block's shape.
    #[inline]
    pub fn shape(&self) -> BlockShape {
        BlockShape::new(self.channels.len(), self.frames)
    }

    /// Number of channels.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Returns true if the block holds no samples.
    pub fn is_empty(&self) -> bool {
        self.shape().is_empty()
    }

    /// Returns one channel's samples.
    ///
    /// # Panics
    ///
    /// Panics if `index >= channel_count()`.
    #[inline]
    pub fn channel(&self, index: usize) -> &[Sample] {
        &self.channels[index]
    }

    /// Returns one channel's samples mutably.
    ///
    /// # Panics
    ///
    /// Panics if `index >= channel_count()`.
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [Sample] {
        &mut self.channels[index]
    }

    /// Iterates over channels.
    pub fn channels(&self) -> impl ExactSizeIterator<Item = &[Sample]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Iterates over channels mutably.
    pub fn channels_mut(&mut self) -> impl ExactSizeIterator<Item = &mut [Sample]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }

    /// Fills every channel with zeros.
    pub fn clear(&mut self) {
        for ch in &mut self.channels {
            ch.fill(0.0);
        }
    }

    /// Resizes the block to `shape` if it differs from the current one.
    ///
    /// Returns true when storage was reshaped. Existing samples that survive
    /// the reshape keep their values; new samples are zero. This is the only
    /// place a block may allocate after construction.
    pub fn conform_to(&mut self, shape: BlockShape) -> bool {
        if self.shape() == shape {
            return false;
        }
        self.channels.resize_with(shape.channels, Vec::new);
        for ch in &mut self.channels {
            ch.resize(shape.frames, 0.0);
        }
        self.frames = shape.frames;
        true
    }

    /// Copies `source` into this block sample for sample.
    ///
    /// Fails with [`RouteError::ShapeMismatch`] without touching `self` if the
    /// channel counts or lengths differ.
    pub fn copy_from(&mut self, source: &SampleBlock) -> Result<(), RouteError> {
        self.ensure_shape(source.shape())?;
        for (dst, src) in self.channels.iter_mut().zip(source.channels.iter()) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    /// Checks that `other` matches this block's shape.
    pub fn ensure_shape(&self, other: BlockShape) -> Result<(), RouteError> {
        let expected = self.shape();
        if expected == other {
            Ok(())
        } else {
            Err(RouteError::ShapeMismatch {
                expected,
                found: other,
            })
        }
    }

    /// Replaces every non-finite sample with `0.0`.
    ///
    /// Returns the number of samples replaced.
    pub fn sanitize(&mut self) -> usize {
        let mut replaced = 0;
        for ch in &mut self.channels {
            for s in ch.iter_mut() {
                if !s.is_finite() {
                    *s = 0.0;
                    replaced += 1;
                }
            }
        }
        replaced
    }

    /// Overwrites the block from interleaved `f32` frames.
    ///
    /// `interleaved` must hold exactly `channels × frames` samples laid out as
    /// `[c0f0, c1f0, c0f1, c1f1, ...]`.
    pub fn read_interleaved(&mut self, interleaved: &[f32]) -> Result<(), RouteError> {
        let shape = self.shape();
        if interleaved.len() != shape.len() {
            return Err(RouteError::ShapeMismatch {
                expected: shape,
                found: BlockShape::new(shape.channels, interleaved.len() / shape.channels.max(1)),
            });
        }
        for (frame_idx, frame) in interleaved.chunks_exact(shape.channels.max(1)).enumerate() {
            for (ch, &s) in self.channels.iter_mut().zip(frame) {
                ch[frame_idx] = Sample::from(s);
            }
        }
        Ok(())
    }

    /// Writes the block out as interleaved `f32` frames.
    pub fn write_interleaved(&self, interleaved: &mut [f32]) -> Result<(), RouteError> {
        let shape = self.shape();
        if interleaved.len() != shape.len() {
            return Err(RouteError::ShapeMismatch {
                expected: shape,
                found: BlockShape::new(shape.channels, interleaved.len() / shape.channels.max(1)),
            });
        }
        for (frame_idx, frame) in interleaved
            .chunks_exact_mut(shape.channels.max(1))
            .enumerate()
        {
            for (out, ch) in frame.iter_mut().zip(&self.channels) {
                *out = ch[frame_idx] as f32;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_is_zeroed() {
        let block = SampleBlock::new(BlockShape::new(2, 8));
        assert_eq!(block.shape(), BlockShape::new(2, 8));
        assert!(block.channels().all(|ch| ch.iter().all(|&s| s == 0.0)));
    }

    #[test]
    fn ragged_channels_rejected() {
        let err = SampleBlock::from_channels(vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert_eq!(
            err,
            RouteError::RaggedChannels {
                expected: 4,
                channel: 1,
                found: 3
            }
        );
    }

    #[test]
    fn copy_from_mismatch_leaves_destination() {
        let mut dst = SampleBlock::from_channels(vec![vec![7.0; 4]]).unwrap();
        let src = SampleBlock::new(BlockShape::new(1, 5));
        assert!(dst.copy_from(&src).is_err());
        assert_eq!(dst.channel(0), &[7.0; 4]);
    }

    #[test]
    fn conform_to_only_reshapes_on_change() {
        let mut block = SampleBlock::new(BlockShape::new(1, 4));
        assert!(!block.conform_to(BlockShape::new(1, 4)));
        assert!(block.conform_to(BlockShape::new(2, 6)));
        assert_eq!(block.shape(), BlockShape::new(2, 6));
        assert_eq!(block.channel(1).len(), 6);
    }

    #[test]
    fn sanitize_counts_replacements() {
        let mut block =
            SampleBlock::from_channels(vec![vec![1.0, f64::NAN, f64::INFINITY, -2.0]]).unwrap();
        assert_eq!(block.sanitize(), 2);
        assert_eq!(block.channel(0), &[1.0, 0.0, 0.0, -2.0]);
    }

    #[test]
    fn interleaved_layout() {
        let mut block = SampleBlock::new(BlockShape::new(2, 3));
        block
            .read_interleaved(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0])
            .unwrap();
        assert_eq!(block.channel(0), &[1.0, 2.0, 3.0]);
        assert_eq!(block.channel(1), &[-1.0, -2.0, -3.0]);

        let mut out = [0.0f32; 6];
        block.write_interleaved(&mut out).unwrap();
        assert_eq!(out, [1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
    }

    #[test]
    fn interleaved_length_checked() {
        let mut block = SampleBlock::new(BlockShape::new(2, 3));
        assert!(block.read_interleaved(&[0.0; 5]).is_err());
        let mut out = [0.0f32; 4];
        assert!(block.write_interleaved(&mut out).is_err());
    }
}
