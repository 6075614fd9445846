//! The [`Stage`] trait: one block in, one block out.
//!
//! Every unit of per-block work in a routing graph implements this trait,
//! whether it is a node's own stage or something installed by a component at
//! runtime.
//!
//! ## Contract
//!
//! - `input` and `output` are always distinct blocks of identical shape. The
//!   router checks this before calling a stage.
//! - A stage must not assume anything about the prior contents of `output`
//!   and must write every sample of every channel.
//! - `process` runs on the audio tick. Implementations must not allocate or
//!   block in steady state.

use crate::block::SampleBlock;
use crate::error::RouteError;

/// Core trait for block processing stages.
///
/// # Example
///
/// ```rust
/// use soundcheck_core::{RouteError, SampleBlock, Stage};
///
/// struct Invert;
///
/// impl Stage for Invert {
///     fn process(&mut self, output: &mut SampleBlock, input: &SampleBlock) -> Result<(), RouteError> {
///         for (dst, src) in output.channels_mut().zip(input.channels()) {
///             for (d, s) in dst.iter_mut().zip(src) {
///                 *d = -*s;
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Stage {
    /// Writes the processed form of `input` into `output`.
    fn process(&mut self, output: &mut SampleBlock, input: &SampleBlock)
    -> Result<(), RouteError>;

    /// Clears internal state (history, accumulators) without touching settings.
    fn reset(&mut self) {}

    /// Short human-readable name used in logs and graph listings.
    fn name(&self) -> &'static str {
        "stage"
    }
}

impl<S: Stage + ?Sized> Stage for alloc::boxed::Box<S> {
    fn process(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        (**self).process(output, input)
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Wraps a closure so it can be installed as a stage.
///
/// ```rust
/// use soundcheck_core::{FnStage, SampleBlock, Stage};
///
/// let copy = FnStage::new("copy", |out: &mut SampleBlock, inp: &SampleBlock| out.copy_from(inp));
/// # let _ = copy.name();
/// ```
pub struct FnStage<F> {
    name: &'static str,
    f: F,
}

impl<F> FnStage<F>
where
    F: FnMut(&mut SampleBlock, &SampleBlock) -> Result<(), RouteError>,
{
    /// Creates a named closure stage.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> Stage for FnStage<F>
where
    F: FnMut(&mut SampleBlock, &SampleBlock) -> Result<(), RouteError>,
{
    fn process(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        (self.f)(output, input)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Stage that copies its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Stage for Passthrough {
    fn process(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        output.copy_from(input)
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockShape;
    use alloc::boxed::Box;
    use alloc::vec;

    #[test]
    fn fn_stage_runs_closure() {
        let mut calls = 0;
        let mut stage = FnStage::new("count", |out: &mut SampleBlock, inp: &SampleBlock| {
            calls += 1;
            out.copy_from(inp)
        });
        let input = SampleBlock::from_channels(vec![vec![1.0, 2.0]]).unwrap();
        let mut output = SampleBlock::new(BlockShape::new(1, 2));
        stage.process(&mut output, &input).unwrap();
        assert_eq!(stage.name(), "count");
        drop(stage);
        assert_eq!(calls, 1);
        assert_eq!(output.channel(0), &[1.0, 2.0]);
    }

    #[test]
    fn boxed_stage_delegates() {
        let mut stage: Box<dyn Stage> = Box::new(Passthrough);
        let input = SampleBlock::from_channels(vec![vec![0.5; 3]]).unwrap();
        let mut output = SampleBlock::new(BlockShape::new(1, 3));
        stage.process(&mut output, &input).unwrap();
        assert_eq!(stage.name(), "passthrough");
        assert_eq!(output, input);
    }
}
