//! Criterion benchmarks for insert-node routing (`soundcheck-core::graph`).
//!
//! Measures routing overhead independently of DSP cost using a trivial
//! `Gain` stage, across block sizes and chain lengths.
//!
//! Run with: `cargo bench -p soundcheck-core -- route/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use soundcheck_core::{
    BlockShape, DelayLine, FirKernel, Gain, GraphBuilder, InsertSpec, RoutingGraph, SampleBlock,
};

const BLOCK_SIZES: &[usize] = &[64, 256, 1024, 4096];
const CHAIN_LENGTHS: &[usize] = &[1, 2, 5, 10];

// ---------------------------------------------------------------------------
// Graph constructors
// ---------------------------------------------------------------------------

/// Node `x` with `len` gain members in its post-chain.
fn chain_graph(len: usize, shape: BlockShape) -> RoutingGraph {
    let mut builder = GraphBuilder::new().with_block_shape(shape);
    let mut ids = Vec::with_capacity(len);
    for i in 0..len {
        let id = format!("g{i}");
        builder.add_node(id.as_str(), &InsertSpec::default()).unwrap();
        builder.set_own_stage(&id, Box::new(Gain::new(0.999))).unwrap();
        ids.push(id);
    }
    builder.add_node("x", &InsertSpec::new().with_post(ids)).unwrap();
    builder.build()
}

fn bench_chain_lengths(c: &mut Criterion) {
    let mut group = c.benchmark_group("route/chain");
    let shape = BlockShape::new(2, 256);
    for &len in CHAIN_LENGTHS {
        let mut graph = chain_graph(len, shape);
        let input = SampleBlock::new(shape);
        let mut output = SampleBlock::new(shape);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                graph.route("x", &mut output, black_box(&input)).unwrap();
                black_box(&output);
            });
        });
    }
    group.finish();
}

fn bench_block_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("route/fir");
    for &frames in BLOCK_SIZES {
        let shape = BlockShape::new(1, frames);
        let mut builder = GraphBuilder::new().with_block_shape(shape);
        builder.add_node("fir", &InsertSpec::default()).unwrap();
        builder
            .set_own_stage("fir", Box::new(DelayLine::new(FirKernel::Average3, 1)))
            .unwrap();
        builder
            .add_node("input", &InsertSpec::new().with_pre(["fir"]))
            .unwrap();
        let mut graph = builder.build();
        let input = SampleBlock::new(shape);
        let mut output = SampleBlock::new(shape);
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, _| {
            b.iter(|| {
                graph.route("input", &mut output, black_box(&input)).unwrap();
                black_box(&output);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chain_lengths, bench_block_sizes);
criterion_main!(benches);
