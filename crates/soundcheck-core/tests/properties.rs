//! Property-based tests for soundcheck-core routing and FIR stages.
//!
//! Uses proptest to check that routing through arbitrary chain layouts equals
//! applying the same stages in sequence, and that the FIR stage is linear.

use proptest::prelude::*;
use soundcheck_core::{
    DelayLine, FirKernel, Gain, GraphBuilder, InsertSpec, SampleBlock, Stage,
};

fn mono(samples: &[f64]) -> SampleBlock {
    SampleBlock::from_channels(vec![samples.to_vec()]).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Routing through pre gains, an own gain and post gains equals the
    /// product of every factor applied to the input.
    #[test]
    fn routed_gains_multiply(
        pre in prop::collection::vec(0.25f64..4.0, 0..3),
        own in prop::option::of(0.25f64..4.0),
        post in prop::collection::vec(0.25f64..4.0, 0..3),
        samples in prop::collection::vec(-1.0f64..=1.0, 1..64),
    ) {
        let mut builder = GraphBuilder::new();
        let mut pre_ids = Vec::new();
        let mut post_ids = Vec::new();
        for (i, g) in pre.iter().enumerate() {
            let id = format!("pre{i}");
            builder.add_node(id.as_str(), &InsertSpec::default()).unwrap();
            builder.set_own_stage(&id, Box::new(Gain::new(*g))).unwrap();
            pre_ids.push(id);
        }
        for (i, g) in post.iter().enumerate() {
            let id = format!("post{i}");
            builder.add_node(id.as_str(), &InsertSpec::default()).unwrap();
            builder.set_own_stage(&id, Box::new(Gain::new(*g))).unwrap();
            post_ids.push(id);
        }
        builder.add_node("x", &InsertSpec::new().with_pre(pre_ids).with_post(post_ids)).unwrap();
        if let Some(g) = own {
            builder.set_own_stage("x", Box::new(Gain::new(g))).unwrap();
        }
        let mut graph = builder.build();

        let factor: f64 = pre.iter().chain(own.iter()).chain(post.iter()).product();
        let input = mono(&samples);
        let mut output = SampleBlock::new(input.shape());
        graph.route("x", &mut output, &input).unwrap();

        for (o, i) in output.channel(0).iter().zip(&samples) {
            prop_assert!((o - i * factor).abs() < 1e-9, "{} vs {}", o, i * factor);
        }
    }

    /// Splitting a stream into blocks of any size gives the same FIR output
    /// as one call over the whole stream.
    #[test]
    fn fir_block_split_invariant(
        samples in prop::collection::vec(-1.0f64..=1.0, 1..128),
        split in 1usize..32,
        comb in any::<bool>(),
    ) {
        let kernel = if comb { FirKernel::Comb3 } else { FirKernel::Average3 };

        let mut whole = DelayLine::new(kernel, 1);
        let input = mono(&samples);
        let mut expected = SampleBlock::new(input.shape());
        whole.process(&mut expected, &input).unwrap();

        let mut split_fir = DelayLine::new(kernel, 1);
        let mut actual = Vec::new();
        for chunk in samples.chunks(split) {
            let input = mono(chunk);
            let mut output = SampleBlock::new(input.shape());
            split_fir.process(&mut output, &input).unwrap();
            actual.extend_from_slice(output.channel(0));
        }

        for (a, e) in actual.iter().zip(expected.channel(0)) {
            prop_assert!((a - e).abs() < 1e-12);
        }
    }

    /// The FIR stage is linear: f(a·x) = a·f(x).
    #[test]
    fn fir_is_homogeneous(
        samples in prop::collection::vec(-1.0f64..=1.0, 1..64),
        scale in -4.0f64..4.0,
    ) {
        let mut plain = DelayLine::new(FirKernel::Average3, 1);
        let mut scaled = DelayLine::new(FirKernel::Average3, 1);
        let input = mono(&samples);
        let scaled_input = mono(&samples.iter().map(|s| s * scale).collect::<Vec<_>>());
        let mut a = SampleBlock::new(input.shape());
        let mut b = SampleBlock::new(input.shape());
        plain.process(&mut a, &input).unwrap();
        scaled.process(&mut b, &scaled_input).unwrap();
        for (x, y) in a.channel(0).iter().zip(b.channel(0)) {
            prop_assert!((x * scale - y).abs() < 1e-9);
        }
    }
}
