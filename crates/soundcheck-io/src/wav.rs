//! WAV file reading and writing.
//!
//! Samples cross this boundary as interleaved `f32` frames. Integer files are
//! scaled to `[-1, 1)` on read and clamped on write. 32-bit files are always
//! float.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::{Error, Result};

/// Sample encoding of a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Integer PCM.
    Pcm,
    /// IEEE float.
    IeeeFloat,
}

/// Channel count, rate and bit depth of a WAV stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Interleaved channels per frame.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// Bits per sample: 16, 24 or 32.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
        }
    }
}

impl WavSpec {
    /// Encoding used when writing with this spec.
    pub fn format(&self) -> WavFormat {
        if self.bits_per_sample == 32 {
            WavFormat::IeeeFloat
        } else {
            WavFormat::Pcm
        }
    }

    fn to_hound(self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: match self.format() {
                WavFormat::IeeeFloat => SampleFormat::Float,
                WavFormat::Pcm => SampleFormat::Int,
            },
        }
    }

    fn from_hound(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

/// Header summary of a WAV file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    /// Stream layout.
    pub spec: WavSpec,
    /// Frames (samples per channel).
    pub frames: u64,
    /// Encoding found in the header.
    pub format: WavFormat,
}

impl WavInfo {
    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames as f64 / f64::from(self.spec.sample_rate.max(1))
    }
}

/// Reads only the header of a WAV file.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let header = reader.spec();
    Ok(WavInfo {
        spec: WavSpec::from_hound(header),
        frames: u64::from(reader.len()) / u64::from(header.channels.max(1)),
        format: match header.sample_format {
            SampleFormat::Float => WavFormat::IeeeFloat,
            SampleFormat::Int => WavFormat::Pcm,
        },
    })
}

/// Integer full scale for a bit depth, rejecting depths hound cannot hold.
fn full_scale(bits: u16) -> Result<f32> {
    if (1..=32).contains(&bits) {
        Ok((1i64 << (bits - 1)) as f32)
    } else {
        Err(Error::UnsupportedFormat(format!("{bits}-bit PCM")))
    }
}

/// Reads a whole WAV file as interleaved `f32` samples.
///
/// All channels are kept, so `samples.len()` is `frames * spec.channels`.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let header = reader.spec();
    let spec = WavSpec::from_hound(header);

    let samples = if header.sample_format == SampleFormat::Float {
        reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        let scale = full_scale(spec.bits_per_sample)?;
        reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / scale))
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    tracing::debug!(
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        samples = samples.len(),
        "wav loaded"
    );
    Ok((samples, spec))
}

/// Writes interleaved samples to a WAV file.
///
/// The bit depth is checked before the file is created.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let scale = full_scale(spec.bits_per_sample)?;
    let mut writer = WavWriter::create(path, spec.to_hound())?;

    match spec.format() {
        WavFormat::IeeeFloat => {
            for &s in samples {
                writer.write_sample(s)?;
            }
        }
        WavFormat::Pcm => {
            for &s in samples {
                writer.write_sample((s * scale).clamp(-scale, scale - 1.0) as i32)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_two_bit_is_float() {
        assert_eq!(WavSpec::default().format(), WavFormat::IeeeFloat);
        let spec = WavSpec {
            bits_per_sample: 24,
            ..WavSpec::default()
        };
        assert_eq!(spec.format(), WavFormat::Pcm);
        assert_eq!(spec.to_hound().sample_format, SampleFormat::Int);
    }

    #[test]
    fn full_scale_bounds() {
        assert_eq!(full_scale(16).unwrap(), 32_768.0);
        assert!(full_scale(0).is_err());
        assert!(full_scale(33).is_err());
    }
}
