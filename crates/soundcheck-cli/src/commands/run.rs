//! Paced graph runner for test signals and WAV files.
//!
//! Blocks are produced by a source and routed through the graph once per
//! tick. By default ticks are paced at the block rate so charts update the
//! way they would on a live device.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Args;
use soundcheck_config::{BuildOptions, GateMode, build_graph, spectrum_stage_ids};
use soundcheck_core::SampleBlock;
use soundcheck_io::{AudioSource, SignalKind, TestSignal, TickTimer, WavSource, read_wav_info};

use super::common::{LevelMeter, apply_params, load_graph, parse_key_val};
use crate::display::TerminalRenderer;

#[derive(Args)]
pub struct RunArgs {
    /// Factory layout name or graph file (TOML)
    #[arg(short, long, default_value = "soundcheck")]
    graph: String,

    /// Test signal: sine:FREQ, noise, impulse:PERIOD or silence
    #[arg(short, long, default_value = "sine:1000")]
    signal: String,

    /// WAV file to play through the graph instead of a test signal
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Stop after this many seconds of audio
    #[arg(long)]
    seconds: Option<f64>,

    /// Run as fast as possible instead of at the block rate
    #[arg(long)]
    fast: bool,

    /// Redraw every Nth tick instead of at the stage frame rate
    #[arg(long)]
    every: Option<u64>,

    /// Stage parameters (e.g., "fft.low=100Hz")
    #[arg(long, value_parser = parse_key_val, number_of_values = 1)]
    param: Vec<(String, String)>,

    /// Do not draw charts
    #[arg(long)]
    no_display: bool,

    /// Chart width in columns
    #[arg(long, default_value = "80")]
    cols: usize,

    /// Chart height in rows
    #[arg(long, default_value = "16")]
    rows: usize,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_graph(&args.graph)?;
    apply_params(&mut config, &args.param)?;

    let mut source: Box<dyn AudioSource> = if let Some(path) = &args.input {
        let info = read_wav_info(path)?;
        let wav = WavSource::open(path, config.block_size)?;
        config.channels = usize::from(info.spec.channels);
        config.sample_rate = info.spec.sample_rate;
        println!(
            "Playing {} ({} ch, {} Hz, {:.2}s)",
            path.display(),
            info.spec.channels,
            info.spec.sample_rate,
            info.duration()
        );
        Box::new(wav)
    } else {
        let kind = SignalKind::parse(&args.signal)
            .ok_or_else(|| anyhow::anyhow!("Unknown signal '{}'", args.signal))?;
        println!("Generating {kind:?}");
        Box::new(TestSignal::new(kind, config.block_shape(), config.sample_rate))
    };

    let mut options = BuildOptions::new()
        .with_gate(args.every.map_or(GateMode::WallClock, GateMode::EveryNth));
    if !args.no_display {
        for id in spectrum_stage_ids(&config) {
            let renderer = TerminalRenderer::new(std::io::stdout(), id, args.cols, args.rows)
                .clearing(true);
            options = options.with_renderer(id, Box::new(renderer));
        }
    }

    let mut graph = build_graph(&config, options)?;
    let max_blocks = args
        .seconds
        .map(|s| (s / graph.block_seconds()).ceil().max(0.0) as u64);

    println!(
        "Running '{}' ({} stage(s), {} Hz, block {})",
        config.name,
        config.len(),
        graph.sample_rate,
        graph.shape
    );
    println!("Press Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut timer = if args.fast {
        TickTimer::unthrottled()
    } else {
        TickTimer::for_blocks(graph.shape.frames, graph.sample_rate)
    };
    let mut input = SampleBlock::new(graph.shape);
    let mut output = SampleBlock::new(graph.shape);
    let mut meter = LevelMeter::default();
    let mut blocks = 0u64;

    while running.load(Ordering::SeqCst) {
        if max_blocks.is_some_and(|max| blocks >= max) {
            break;
        }
        if !source.next_block(&mut input)? {
            break;
        }
        graph.tick(&mut output, &input)?;
        meter.add(output.channels().flatten().copied());
        blocks += 1;
        timer.wait();
    }

    let seconds = blocks as f64 * graph.block_seconds();
    println!("\nRan {blocks} block(s), {seconds:.2}s of audio");
    println!("  Output: {}", meter.summary());
    if timer.late_ticks() > 0 {
        println!("  Late ticks: {}", timer.late_ticks());
    }
    Ok(())
}
