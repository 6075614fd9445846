//! Criterion benchmarks for soundcheck-analysis components
//!
//! Run with: cargo bench -p soundcheck-analysis
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use soundcheck_analysis::{
    AlwaysRender, Chart, ChartAxes, EstimatorConfig, SpectralEstimator, SpectrumConfig,
    SpectrumStage, TickDivider,
};
use soundcheck_core::{SampleBlock, Stage};
use std::f64::consts::PI;

const SAMPLE_RATE: f64 = 44_100.0;
const BLOCK: usize = 1024;

/// Generate a mono test sine block
fn sine_block(frequency: f64) -> SampleBlock {
    let samples = (0..BLOCK)
        .map(|i| (2.0 * PI * frequency * i as f64 / SAMPLE_RATE).sin())
        .collect();
    SampleBlock::from_channels(vec![samples]).unwrap()
}

fn bench_estimator(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimator/process_block");
    let block = sine_block(440.0);
    for size in [1024, 4096, 16384] {
        let mut est = SpectralEstimator::new(EstimatorConfig {
            size,
            ..EstimatorConfig::default()
        })
        .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                est.process_block(black_box(&block));
                black_box(est.magnitudes());
            });
        });
    }
    group.finish();
}

fn bench_chart(c: &mut Criterion) {
    let est = {
        let mut est = SpectralEstimator::new(EstimatorConfig::default()).unwrap();
        est.process_block(&sine_block(1000.0));
        est
    };
    let axes = ChartAxes {
        low_hz: 10.0,
        high_hz: 20_000.0,
        width: 640,
        height: 240,
        transform_size: 4096,
    };
    let mut chart = Chart::new(axes, 2);
    c.bench_function("chart/rebuild_640x2", |b| {
        b.iter(|| black_box(chart.rebuild(est.magnitudes(), est.phases())));
    });
}

fn bench_stage(c: &mut Criterion) {
    let block = sine_block(440.0);
    let mut output = SampleBlock::new(block.shape());

    let mut every_tick = SpectrumStage::new(SpectrumConfig::default())
        .unwrap()
        .with_gate(Box::new(AlwaysRender));
    c.bench_function("stage/render_every_tick", |b| {
        b.iter(|| every_tick.process(&mut output, black_box(&block)).unwrap());
    });

    let mut throttled = SpectrumStage::new(SpectrumConfig::default())
        .unwrap()
        .with_gate(Box::new(TickDivider::new(8)));
    c.bench_function("stage/render_every_8th", |b| {
        b.iter(|| throttled.process(&mut output, black_box(&block)).unwrap());
    });
}

criterion_group!(benches, bench_estimator, bench_chart, bench_stage);
criterion_main!(benches);
