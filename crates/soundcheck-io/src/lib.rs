//! Audio I/O layer for soundcheck.
//!
//! This crate provides the edges around a routing graph:
//!
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for interleaved audio files
//! - **Sources**: the [`AudioSource`] trait, with [`TestSignal`] and [`WavSource`]
//! - **Timing**: [`TickTimer`] paces ticks at the block rate
//! - **Adapters**: [`TickEngine`] runs block-sized ticks over arbitrarily sized
//!   interleaved callback buffers
//! - **Real-time streaming**: [`AudioStream`] for live cpal input/output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use soundcheck_core::{BlockShape, SampleBlock};
//! use soundcheck_io::{AudioSource, SignalKind, TestSignal, WavSpec, write_wav};
//!
//! let shape = BlockShape::new(1, 1024);
//! let mut source = TestSignal::new(SignalKind::sine(440.0), shape, 44_100).with_blocks(43);
//! let mut block = SampleBlock::new(shape);
//! let mut samples = Vec::new();
//! let mut frame = vec![0.0f32; shape.len()];
//! while source.next_block(&mut block)? {
//!     block.write_interleaved(&mut frame)?;
//!     samples.extend_from_slice(&frame);
//! }
//! write_wav("tone.wav", &samples, WavSpec { sample_rate: 44_100, ..Default::default() })?;
//! # Ok::<(), soundcheck_io::Error>(())
//! ```

mod engine;
mod source;
mod stream;
mod timer;
mod wav;

pub use engine::{QUEUED_BLOCKS, TickEngine};
pub use source::{AudioSource, SignalKind, TestSignal, WavSource};
pub use stream::{
    AudioDevice, AudioStream, Direction, StreamConfig, default_device, find_device, list_devices,
};
pub use timer::TickTimer;
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

use soundcheck_core::RouteError;

/// Failures at the edges of the graph: files, devices and streams.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Read or write failure reported by `hound`.
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),

    /// The host refused to build, start or enumerate a stream.
    #[error("stream: {0}")]
    Stream(String),

    /// The host has no default device for the requested direction.
    #[error("no default audio device")]
    NoDevice,

    /// Bit depth or sample format outside what soundcheck reads and writes.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No device matched an index or name query.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A block did not have the shape the source or engine was built for.
    #[error("block: {0}")]
    Block(#[from] RouteError),

    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
