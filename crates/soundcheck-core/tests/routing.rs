//! Integration tests for insert-node routing.
//!
//! Covers the two-buffer parity rule over every mix of pre-chain, own stage
//! and post-chain up to five steps, passthrough semantics, chain resolution
//! failures and shape checks.

use soundcheck_core::{
    BlockShape, DelayLine, FirKernel, GraphBuilder, InsertSpec, RouteError, RoutingGraph,
    SampleBlock, Stage,
};

/// Stage that adds a fixed offset to every sample.
struct Offset(f64);

impl Stage for Offset {
    fn process(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        for (dst, src) in output.channels_mut().zip(input.channels()) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s + self.0;
            }
        }
        Ok(())
    }
}

/// Stage that doubles every sample.
struct Double;

impl Stage for Double {
    fn process(
        &mut self,
        output: &mut SampleBlock,
        input: &SampleBlock,
    ) -> Result<(), RouteError> {
        for (dst, src) in output.channels_mut().zip(input.channels()) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s * 2.0;
            }
        }
        Ok(())
    }
}

fn stereo(left: &[f64], right: &[f64]) -> SampleBlock {
    SampleBlock::from_channels(vec![left.to_vec(), right.to_vec()]).unwrap()
}

/// Builds `pre` and `post` member nodes `p0..` / `q0..` with distinct
/// offsets, then node `x` wiring them around an optional doubling stage.
///
/// Returns the graph and the expected mapping for one sample.
fn parity_graph(pre: usize, own: bool, post: usize) -> (RoutingGraph, impl Fn(f64) -> f64) {
    let mut builder = GraphBuilder::new();
    let mut pre_ids = Vec::new();
    let mut post_ids = Vec::new();
    let mut pre_offsets = Vec::new();
    let mut post_offsets = Vec::new();
    for i in 0..pre {
        let id = format!("p{i}");
        let offset = (i + 1) as f64;
        builder.add_node(id.as_str(), &InsertSpec::default()).unwrap();
        builder.set_own_stage(&id, Box::new(Offset(offset))).unwrap();
        pre_ids.push(id);
        pre_offsets.push(offset);
    }
    for i in 0..post {
        let id = format!("q{i}");
        let offset = 10.0 * (i + 1) as f64;
        builder.add_node(id.as_str(), &InsertSpec::default()).unwrap();
        builder.set_own_stage(&id, Box::new(Offset(offset))).unwrap();
        post_ids.push(id);
        post_offsets.push(offset);
    }
    builder
        .add_node("x", &InsertSpec::new().with_pre(pre_ids).with_post(post_ids))
        .unwrap();
    if own {
        builder.set_own_stage("x", Box::new(Double)).unwrap();
    }

    let expected = move |mut v: f64| {
        for o in &pre_offsets {
            v += o;
        }
        if own {
            v *= 2.0;
        }
        for o in &post_offsets {
            v += o;
        }
        v
    };
    (builder.build(), expected)
}

// ============================================================================
// Parity
// ============================================================================

#[test]
fn every_chain_mix_lands_in_output() {
    for total in 0..=5usize {
        for own in [false, true] {
            if own && total == 0 {
                continue;
            }
            let members = total - usize::from(own);
            for pre in 0..=members {
                let post = members - pre;
                let (mut graph, expected) = parity_graph(pre, own, post);
                let input = stereo(&[1.0, -2.0, 0.5], &[3.0, 0.0, -1.0]);
                let before = input.clone();
                let mut output = SampleBlock::new(input.shape());

                graph.route("x", &mut output, &input).unwrap_or_else(|e| {
                    panic!("pre={pre} own={own} post={post}: {e}");
                });

                assert_eq!(input, before, "input mutated for pre={pre} own={own} post={post}");
                for (out_ch, in_ch) in output.channels().zip(input.channels()) {
                    for (o, i) in out_ch.iter().zip(in_ch) {
                        assert_eq!(*o, expected(*i), "pre={pre} own={own} post={post}");
                    }
                }
            }
        }
    }
}

#[test]
fn repeated_routes_are_stable() {
    let (mut graph, expected) = parity_graph(2, true, 1);
    let input = stereo(&[1.0, 2.0], &[3.0, 4.0]);
    let mut output = SampleBlock::new(input.shape());
    for _ in 0..4 {
        graph.route("x", &mut output, &input).unwrap();
        assert_eq!(output.channel(1), &[expected(3.0), expected(4.0)]);
    }
}

#[test]
fn nested_members_route_through_their_own_chains() {
    let mut builder = GraphBuilder::new();
    builder.add_node("inner", &InsertSpec::default()).unwrap();
    builder.set_own_stage("inner", Box::new(Double)).unwrap();
    builder
        .add_node("middle", &InsertSpec::new().with_pre(["inner"]).with_post(["inner"]))
        .unwrap();
    builder.set_own_stage("middle", Box::new(Offset(1.0))).unwrap();
    builder
        .add_node("outer", &InsertSpec::new().with_pre(["middle"]))
        .unwrap();
    let mut graph = builder.build();

    let input = SampleBlock::from_channels(vec![vec![1.0, 2.0]]).unwrap();
    let mut output = SampleBlock::new(input.shape());
    graph.route("outer", &mut output, &input).unwrap();
    // ((x * 2) + 1) * 2
    assert_eq!(output.channel(0), &[6.0, 10.0]);
}

// ============================================================================
// Passthrough
// ============================================================================

#[test]
fn empty_node_routes_as_passthrough() {
    let mut builder = GraphBuilder::new();
    builder.add_node("input", &InsertSpec::default()).unwrap();
    let mut graph = builder.build();
    let input = stereo(&[0.25, -0.5], &[1.0, 2.0]);
    let mut output = SampleBlock::new(input.shape());
    graph.route("input", &mut output, &input).unwrap();
    assert_eq!(output, input);
}

#[test]
fn passthrough_copies_exactly() {
    let (mut graph, _) = parity_graph(1, true, 1);
    let input = stereo(&[0.1, 0.2, 0.3], &[-0.1, -0.2, -0.3]);
    let mut output = SampleBlock::new(input.shape());
    graph.passthrough("x", &mut output, &input).unwrap();
    assert_eq!(output, input);

    let mut port = graph.port("x").unwrap();
    let mut again = SampleBlock::new(input.shape());
    port.passthrough(&mut again, &input).unwrap();
    assert_eq!(again, input);
}

#[test]
fn passthrough_mismatch_leaves_output_untouched() {
    let (graph, _) = parity_graph(0, true, 0);
    let input = SampleBlock::new(BlockShape::new(1, 4));
    let mut output = SampleBlock::from_channels(vec![vec![9.0; 4], vec![9.0; 4]]).unwrap();
    let err = graph.passthrough("x", &mut output, &input).unwrap_err();
    assert!(matches!(err, RouteError::ShapeMismatch { .. }));
    assert!(output.channels().all(|ch| ch.iter().all(|&s| s == 9.0)));
}

// ============================================================================
// Shape checks
// ============================================================================

#[test]
fn route_shape_mismatch_writes_nothing() {
    let (mut graph, _) = parity_graph(2, true, 2);
    let input = SampleBlock::new(BlockShape::new(2, 8));
    let mut output = SampleBlock::from_channels(vec![vec![5.0; 7], vec![5.0; 7]]).unwrap();
    let err = graph.route("x", &mut output, &input).unwrap_err();
    assert_eq!(
        err,
        RouteError::ShapeMismatch {
            expected: BlockShape::new(2, 7),
            found: BlockShape::new(2, 8),
        }
    );
    assert!(output.channels().all(|ch| ch.iter().all(|&s| s == 5.0)));
}

#[test]
fn scratch_follows_output_shape() {
    let (mut graph, _) = parity_graph(1, true, 0);
    for frames in [4, 16, 4] {
        let input = SampleBlock::new(BlockShape::new(1, frames));
        let mut output = SampleBlock::new(input.shape());
        graph.route("x", &mut output, &input).unwrap();
        assert_eq!(graph.node("x").unwrap().scratch_shape(), input.shape());
    }
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn unknown_insert_fails() {
    let mut builder = GraphBuilder::new();
    let err = builder
        .add_node("input", &InsertSpec::new().with_post(["fft"]))
        .unwrap_err();
    assert_eq!(
        err,
        RouteError::UnresolvedInsert {
            node: "input".into(),
            reference: "fft".into(),
        }
    );
    assert!(builder.is_empty());
}

#[test]
fn forward_reference_fails_even_if_declared_later() {
    let mut builder = GraphBuilder::new();
    assert!(builder
        .add_node("input", &InsertSpec::new().with_post(["fft"]))
        .is_err());
    builder.add_node("fft", &InsertSpec::default()).unwrap();
    assert!(!builder.contains("input"));
}

#[test]
fn self_reference_fails() {
    let mut builder = GraphBuilder::new();
    let err = builder
        .add_node("loop", &InsertSpec::new().with_pre(["loop"]))
        .unwrap_err();
    assert!(matches!(err, RouteError::UnresolvedInsert { .. }));
}

#[test]
fn duplicate_node_fails() {
    let mut builder = GraphBuilder::new();
    builder.add_node("fir", &InsertSpec::default()).unwrap();
    let err = builder.add_node("fir", &InsertSpec::default()).unwrap_err();
    assert_eq!(err, RouteError::DuplicateNode("fir".into()));
    assert!(err.is_configuration());
}

#[test]
fn duplicate_own_stage_fails() {
    let mut builder = GraphBuilder::new();
    builder.add_node("fir", &InsertSpec::default()).unwrap();
    builder
        .set_own_stage("fir", Box::new(DelayLine::new(FirKernel::Average3, 1)))
        .unwrap();
    let err = builder
        .set_own_stage("fir", Box::new(DelayLine::new(FirKernel::Comb3, 1)))
        .unwrap_err();
    assert_eq!(err, RouteError::DuplicateOwnStage("fir".into()));

    let mut graph = builder.build();
    let err = graph
        .port("fir")
        .unwrap()
        .install(Box::new(Double))
        .unwrap_err();
    assert_eq!(err, RouteError::DuplicateOwnStage("fir".into()));
}

#[test]
fn late_install_on_built_graph() {
    let mut builder = GraphBuilder::new();
    builder.add_node("fft", &InsertSpec::default()).unwrap();
    builder
        .add_node("input", &InsertSpec::new().with_post(["fft"]))
        .unwrap();
    let mut graph = builder.build();
    graph.port("fft").unwrap().install(Box::new(Double)).unwrap();

    let input = SampleBlock::from_channels(vec![vec![1.5]]).unwrap();
    let mut output = SampleBlock::new(input.shape());
    graph.port("input").unwrap().feed(&mut output, &input).unwrap();
    assert_eq!(output.channel(0), &[3.0]);
}

#[test]
fn unknown_node_lookup_fails() {
    let mut graph = GraphBuilder::new().build();
    let input = SampleBlock::new(BlockShape::new(1, 1));
    let mut output = SampleBlock::new(input.shape());
    assert_eq!(
        graph.route("missing", &mut output, &input).unwrap_err(),
        RouteError::UnknownNode("missing".into())
    );
    assert!(graph.port("missing").is_err());
}

// ============================================================================
// FIR through the graph
// ============================================================================

#[test]
fn fir_impulse_through_pre_chain_across_split_blocks() {
    let mut builder = GraphBuilder::new().with_block_shape(BlockShape::new(1, 2));
    builder.add_node("fir", &InsertSpec::default()).unwrap();
    builder
        .set_own_stage("fir", Box::new(DelayLine::new(FirKernel::Average3, 1)))
        .unwrap();
    builder
        .add_node("input", &InsertSpec::new().with_pre(["fir"]))
        .unwrap();
    let mut graph = builder.build();

    let third = 1.0 / 3.0;
    let mut collected = Vec::new();
    for chunk in [[1.0, 0.0], [0.0, 0.0], [0.0, 0.0]] {
        let input = SampleBlock::from_channels(vec![chunk.to_vec()]).unwrap();
        let mut output = SampleBlock::new(input.shape());
        graph.route("input", &mut output, &input).unwrap();
        collected.extend_from_slice(output.channel(0));
    }
    let expected = [third, third, third, 0.0, 0.0, 0.0];
    for (a, e) in collected.iter().zip(expected) {
        assert!((a - e).abs() < 1e-12, "{collected:?}");
    }
}

#[test]
fn reset_clears_own_stage_state() {
    let mut builder = GraphBuilder::new();
    builder.add_node("fir", &InsertSpec::default()).unwrap();
    builder
        .set_own_stage("fir", Box::new(DelayLine::new(FirKernel::Average3, 1)))
        .unwrap();
    let mut graph = builder.build();

    let impulse = SampleBlock::from_channels(vec![vec![3.0]]).unwrap();
    let silence = SampleBlock::from_channels(vec![vec![0.0]]).unwrap();
    let mut output = SampleBlock::new(impulse.shape());
    graph.route("fir", &mut output, &impulse).unwrap();
    graph.reset();
    graph.route("fir", &mut output, &silence).unwrap();
    assert_eq!(output.channel(0), &[0.0]);
}
