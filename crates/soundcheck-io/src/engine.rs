//! Block-tick engine for callback-driven audio.
//!
//! Audio callbacks hand out interleaved buffers of whatever length the
//! device picks. [`TickEngine`] collects those frames into fixed-shape
//! blocks, runs one tick per full block and plays the results back out,
//! adding one block of latency.
//!
//! Both queues have a fixed capacity. Input never holds more than one
//! block, and output holds at most [`QUEUED_BLOCKS`] blocks. When capture
//! runs ahead of playback the oldest queued output is dropped and counted
//! as an overrun, so latency stays bounded under device clock drift.
//!
//! Device and graph channel counts may differ. Graph channel `c` reads
//! device channel `c % device_channels` and device channel `d` plays graph
//! channel `d % graph_channels`, so mono graphs feed every speaker and
//! stereo devices feed mono graphs from the left input.

use std::collections::VecDeque;

use soundcheck_core::{BlockShape, RouteError, SampleBlock};

use crate::source::AudioSource;
use crate::Error;

/// Output capacity of a [`TickEngine`], in blocks.
pub const QUEUED_BLOCKS: usize = 4;

/// Runs a block-sized tick function over interleaved audio.
///
/// # Example
///
/// ```rust
/// use soundcheck_core::{BlockShape, SampleBlock};
/// use soundcheck_io::TickEngine;
///
/// let mut engine = TickEngine::new(BlockShape::new(1, 4), |out: &mut SampleBlock, inp: &SampleBlock| {
///     out.copy_from(inp)
/// });
/// let mut out = [9.0f32; 4];
/// engine.process_interleaved(&[1.0, 2.0, 3.0, 4.0], 1, &mut out, 1);
/// assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
/// ```
pub struct TickEngine<T> {
    tick: T,
    shape: BlockShape,
    input: SampleBlock,
    output: SampleBlock,
    scratch: Vec<f32>,
    pending_in: VecDeque<f32>,
    pending_out: VecDeque<f32>,
    capacity: usize,
    blocks: u64,
    underruns: u64,
    overruns: u64,
    error: Option<Error>,
}

impl<T> TickEngine<T>
where
    T: FnMut(&mut SampleBlock, &SampleBlock) -> Result<(), RouteError>,
{
    /// Creates an engine for blocks of `shape`.
    pub fn new(shape: BlockShape, tick: T) -> Self {
        let capacity = shape.len() * QUEUED_BLOCKS;
        Self {
            tick,
            shape,
            input: SampleBlock::new(shape),
            output: SampleBlock::new(shape),
            scratch: vec![0.0; shape.len()],
            pending_in: VecDeque::with_capacity(shape.len()),
            pending_out: VecDeque::with_capacity(capacity),
            capacity,
            blocks: 0,
            underruns: 0,
            overruns: 0,
            error: None,
        }
    }

    /// Block shape.
    pub fn shape(&self) -> BlockShape {
        self.shape
    }

    /// Ticks run so far.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Output requests that could not be filled completely.
    pub fn underruns(&self) -> u64 {
        self.underruns
    }

    /// Processed blocks whose output was partly dropped because playback
    /// fell behind.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Processed frames waiting to be played.
    pub fn queued_frames(&self) -> usize {
        self.pending_out.len() / self.shape.channels.max(1)
    }

    /// Upper bound of [`TickEngine::queued_frames`].
    pub fn capacity_frames(&self) -> usize {
        self.shape.frames * QUEUED_BLOCKS
    }

    /// Frames between a sample entering and leaving the engine.
    pub fn latency_frames(&self) -> usize {
        self.shape.frames
    }

    /// Returns and clears the first error raised by a tick or source.
    ///
    /// While an error is pending, failed ticks produce silence.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Returns true if an error is waiting in [`TickEngine::take_error`].
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Runs one tick on a whole block and returns the result.
    pub fn process_block(&mut self, input: &SampleBlock) -> Result<&SampleBlock, RouteError> {
        (self.tick)(&mut self.output, input)?;
        self.blocks += 1;
        Ok(&self.output)
    }

    /// Queues interleaved input frames and writes processed frames to `output`.
    pub fn process_interleaved(
        &mut self,
        input: &[f32],
        input_channels: usize,
        output: &mut [f32],
        output_channels: usize,
    ) {
        self.push_interleaved(input, input_channels);
        self.pull_interleaved(output, output_channels);
    }

    /// Queues interleaved input frames, ticking once per full block.
    pub fn push_interleaved(&mut self, input: &[f32], channels: usize) {
        let channels = channels.max(1);
        let graph_channels = self.shape.channels;
        for frame in input.chunks_exact(channels) {
            for c in 0..graph_channels {
                self.pending_in.push_back(frame[c % channels]);
            }
            if self.pending_in.len() < self.shape.len() {
                continue;
            }
            for (dst, src) in self.scratch.iter_mut().zip(self.pending_in.drain(..)) {
                *dst = src;
            }
            match self.input.read_interleaved(&self.scratch) {
                Ok(()) => self.run_tick(),
                Err(e) => self.fail(e.into()),
            }
        }
    }

    /// Fills `output` with processed frames, generating blocks from `source`
    /// as needed.
    ///
    /// Returns false once the source is exhausted or fails; the unfilled part
    /// of `output` is silent.
    pub fn render_from(
        &mut self,
        source: &mut dyn AudioSource,
        output: &mut [f32],
        output_channels: usize,
    ) -> bool {
        let channels = output_channels.max(1);
        let mut live = true;
        let mut short = false;
        // One block per chunk keeps generation within the output capacity.
        for chunk in output.chunks_mut(self.shape.frames.max(1) * channels) {
            let needed = chunk.len() / channels * self.shape.channels;
            while live && self.pending_out.len() < needed {
                match source.next_block(&mut self.input) {
                    Ok(true) => self.run_tick(),
                    Ok(false) => live = false,
                    Err(e) => {
                        self.fail(e);
                        live = false;
                    }
                }
            }
            short |= self.drain_into(chunk, channels);
        }
        if short {
            self.underruns += 1;
        }
        live
    }

    /// Writes queued frames to `output`, padding with silence.
    pub fn pull_interleaved(&mut self, output: &mut [f32], channels: usize) {
        if self.drain_into(output, channels.max(1)) {
            self.underruns += 1;
        }
    }

    /// Returns true if `output` had to be padded.
    fn drain_into(&mut self, output: &mut [f32], channels: usize) -> bool {
        let graph_channels = self.shape.channels.max(1);
        let mut short = false;
        for frame in output.chunks_exact_mut(channels) {
            if self.pending_out.len() < graph_channels {
                frame.fill(0.0);
                short = true;
                continue;
            }
            for (d, out) in frame.iter_mut().enumerate() {
                *out = self.pending_out[d % graph_channels];
            }
            self.pending_out.drain(..graph_channels);
        }
        short
    }

    fn run_tick(&mut self) {
        if let Err(e) = (self.tick)(&mut self.output, &self.input) {
            self.fail(e.into());
            self.output.clear();
        }
        self.blocks += 1;
        // Shapes are fixed at construction, so this cannot fail.
        if self.output.write_interleaved(&mut self.scratch).is_err() {
            return;
        }
        let excess = (self.pending_out.len() + self.scratch.len()).saturating_sub(self.capacity);
        if excess > 0 {
            self.pending_out.drain(..excess);
            self.overruns += 1;
        }
        self.pending_out.extend(self.scratch.iter().copied());
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            tracing::warn!(%error, "tick failed, output muted");
            self.error = Some(error);
        }
    }
}

impl<T> std::fmt::Debug for TickEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickEngine")
            .field("shape", &self.shape)
            .field("blocks", &self.blocks)
            .field("underruns", &self.underruns)
            .field("overruns", &self.overruns)
            .field("queued_in", &self.pending_in.len())
            .field("queued_out", &self.pending_out.len())
            .finish_non_exhaustive()
    }
}
