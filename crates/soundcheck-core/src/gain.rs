//! Constant gain stage.

use crate::block::{Sample, SampleBlock};
use crate::error::RouteError;
use crate::stage::Stage;

/// Multiplies every sample by a fixed linear factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gain {
    factor: Sample,
}

impl Gain {
    /// Creates a gain stage from a linear factor.
    pub const fn new(factor: Sample) -> Self {
        Self { factor }
    }

    /// Creates a gain stage from decibels.
    #[cfg(feature = "std")]
    pub fn from_db(db: Sample) -> Self {
        Self::new(10f64.powf(db / 20.0))
    }

    /// Returns the linear factor.
    pub fn factor(&self) -> Sample {
        self.factor
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Stage for Gain {
    fn process(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        output.ensure_shape(input.shape())?;
        let factor = self.factor;
        for (dst, src) in output.channels_mut().zip(input.channels()) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s * factor;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockShape;
    use alloc::vec;

    #[test]
    fn scales_every_channel() {
        let mut gain = Gain::new(0.5);
        let input = SampleBlock::from_channels(vec![vec![2.0, -4.0], vec![1.0, 0.0]]).unwrap();
        let mut output = SampleBlock::new(BlockShape::new(2, 2));
        gain.process(&mut output, &input).unwrap();
        assert_eq!(output.channel(0), &[1.0, -2.0]);
        assert_eq!(output.channel(1), &[0.5, 0.0]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn decibels_to_linear() {
        assert!((Gain::from_db(-6.0).factor() - 0.501_187).abs() < 1e-5);
        assert!((Gain::from_db(0.0).factor() - 1.0).abs() < 1e-12);
    }
}
