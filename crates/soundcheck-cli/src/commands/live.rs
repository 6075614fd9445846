//! Real-time graph runner on audio devices.
//!
//! The graph runs inside the output callback. Spectrum charts leave the
//! callback through a bounded channel and are drawn on a separate display
//! thread; when the display falls behind, frames are dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use clap::Args;
use crossbeam_channel::RecvTimeoutError;
use soundcheck_config::{BuildOptions, build_graph, spectrum_stage_ids};
use soundcheck_io::{
    AudioStream, Direction, SignalKind, StreamConfig, TestSignal, TickEngine, default_device,
    find_device,
};

use super::common::{apply_params, load_graph, parse_key_val};
use crate::display::{CLEAR, ChannelRenderer, ChartFrame};

/// Frames queued between the audio thread and the display.
const FRAME_QUEUE: usize = 2;

#[derive(Args)]
pub struct LiveArgs {
    /// Factory layout name or graph file (TOML)
    #[arg(short, long, default_value = "soundcheck")]
    graph: String,

    /// Play a test signal instead of capturing input (sine:FREQ, noise, ...)
    #[arg(short, long)]
    signal: Option<String>,

    /// Stage parameters (e.g., "fft.high=8kHz")
    #[arg(long, value_parser = parse_key_val, number_of_values = 1)]
    param: Vec<(String, String)>,

    /// Input device name or index
    #[arg(long)]
    input_device: Option<String>,

    /// Output device name or index
    #[arg(long)]
    output_device: Option<String>,

    /// Sample rate (defaults to the graph's)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Device buffer size in frames
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Stop after this many seconds
    #[arg(long)]
    seconds: Option<f64>,

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

pub fn run(args: LiveArgs) -> anyhow::Result<()> {
    let mut config = load_graph(&args.graph)?;
    apply_params(&mut config, &args.param)?;
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    let signal = args
        .signal
        .as_deref()
        .map(|s| SignalKind::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown signal '{s}'")))
        .transpose()?;

    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<ChartFrame>(FRAME_QUEUE);
    let (recycle_tx, recycle_rx) = crossbeam_channel::bounded(FRAME_QUEUE + 1);
    let dropped = Arc::new(AtomicU64::new(0));

    let mut options = BuildOptions::new();
    if !args.no_display {
        for id in spectrum_stage_ids(&config) {
            let renderer =
                ChannelRenderer::new(id, frame_tx.clone(), recycle_rx.clone(), Arc::clone(&dropped));
            options = options.with_renderer(id, Box::new(renderer));
        }
    }
    drop(frame_tx);
    let mut graph = build_graph(&config, options)?;
    let shape = graph.shape;

    let (default_input, default_output) = default_device()?;
    let input_name = match &args.input_device {
        Some(query) if signal.is_none() => find_device(Direction::Input, query)?.name,
        _ => default_input.map_or_else(|| "none".to_string(), |d| d.name),
    };
    let output_name = match &args.output_device {
        Some(query) => find_device(Direction::Output, query)?.name,
        None => default_output.map_or_else(|| "none".to_string(), |d| d.name),
    };

    let mut stream = AudioStream::new(StreamConfig {
        sample_rate: config.sample_rate,
        buffer_size: args.buffer_size,
        input_device: args.input_device.clone(),
        output_device: args.output_device.clone(),
    })?;

    println!("Live '{}' ({} stage(s), block {})", config.name, config.len(), shape);
    match &signal {
        Some(kind) => println!("  Source: {kind:?}"),
        None => println!("  Input:  {input_name}"),
    }
    println!("  Output: {output_name}");
    println!("  Sample rate: {} Hz", stream.sample_rate());
    if let Some(buffer_size) = args.buffer_size {
        println!("  Buffer size: {buffer_size} frames");
    }
    println!("\nPress Ctrl+C to stop...\n");

    let running = stream.stop_handle();
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    if let Some(seconds) = args.seconds {
        let r = Arc::clone(&running);
        thread::spawn(move || {
            thread::sleep(Duration::from_secs_f64(seconds.max(0.0)));
            r.store(false, Ordering::SeqCst);
        });
    }

    let display = {
        let running = Arc::clone(&running);
        let dropped = Arc::clone(&dropped);
        let (cols, rows) = (args.cols, args.rows);
        thread::spawn(move || {
            loop {
                match frame_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(frame) => {
                        print!(
                            "{CLEAR}{} (dropped {})\n{}",
                            frame.stage,
                            dropped.load(Ordering::Relaxed),
                            frame.draw(cols, rows)
                        );
                        let _ = recycle_tx.try_send(frame.slots);
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
    };

    let blocks = Arc::new(AtomicU64::new(0));
    let underruns = Arc::new(AtomicU64::new(0));
    let overruns = Arc::new(AtomicU64::new(0));
    let (b, u, o) = (
        Arc::clone(&blocks),
        Arc::clone(&underruns),
        Arc::clone(&overruns),
    );
    let mut engine = TickEngine::new(shape, move |out, inp| graph.tick(out, inp));

    match signal {
        Some(kind) => {
            let mut source = TestSignal::new(kind, shape, stream.sample_rate());
            let out_ch = usize::from(stream.output_channels());
            stream.run_output(move |data| {
                engine.render_from(&mut source, data, out_ch);
                b.store(engine.blocks(), Ordering::Relaxed);
                u.store(engine.underruns(), Ordering::Relaxed);
                o.store(engine.overruns(), Ordering::Relaxed);
            })?;
        }
        None => {
            stream.run_duplex(move |input, in_ch, output, out_ch| {
                engine.process_interleaved(input, in_ch, output, out_ch);
                b.store(engine.blocks(), Ordering::Relaxed);
                u.store(engine.underruns(), Ordering::Relaxed);
                o.store(engine.overruns(), Ordering::Relaxed);
            })?;
        }
    }

    drop(stream);
    let _ = display.join();

    println!("\nStopped after {} block(s)", blocks.load(Ordering::Relaxed));
    println!("  Underruns: {}", underruns.load(Ordering::Relaxed));
    println!("  Overruns: {}", overruns.load(Ordering::Relaxed));
    println!("  Dropped frames: {}", dropped.load(Ordering::Relaxed));
    Ok(())
}
