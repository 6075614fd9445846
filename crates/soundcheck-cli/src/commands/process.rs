//! Offline WAV processing command.

use std::path::PathBuf;

use clap::Args;
use indicatif::ProgressBar;
use soundcheck_analysis::{SharedSnapshot, SnapshotRenderer};
use soundcheck_config::{BuildOptions, GateMode, build_graph, spectrum_stage_ids};
use soundcheck_core::SampleBlock;
use soundcheck_io::{AudioSource, WavSource, WavSpec, read_wav, write_wav};

use super::common::{LevelMeter, apply_params, load_graph, parse_key_val, progress_style};
use crate::display::draw_chart;

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Factory layout name or graph file (TOML)
    #[arg(short, long, default_value = "soundcheck")]
    graph: String,

    /// Stage parameters (e.g., "fir.kernel=comb3")
    #[arg(long, value_parser = parse_key_val, number_of_values = 1)]
    param: Vec<(String, String)>,

    /// Processing block size (defaults to the graph's)
    #[arg(long)]
    block_size: Option<usize>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Print the last chart of every spectrum stage
    #[arg(long)]
    chart: bool,

    /// Chart width in columns
    #[arg(long, default_value = "80")]
    cols: usize,

    /// Chart height in rows
    #[arg(long, default_value = "16")]
    rows: usize,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    println!("Reading {}...", args.input.display());
    let (samples, spec) = read_wav(&args.input)?;
    let channels = usize::from(spec.channels.max(1));
    println!(
        "  {} frames, {} ch, {} Hz, {:.2}s",
        samples.len() / channels,
        spec.channels,
        spec.sample_rate,
        samples.len() as f64 / channels as f64 / f64::from(spec.sample_rate)
    );

    let mut config = load_graph(&args.graph)?;
    apply_params(&mut config, &args.param)?;
    config.channels = channels;
    config.sample_rate = spec.sample_rate;
    if let Some(block_size) = args.block_size {
        config.block_size = block_size;
    }

    // Every tick rebuilds so the final chart reflects the end of the file.
    let mut options = BuildOptions::new().with_gate(GateMode::EveryTick);
    let mut charts: Vec<(String, SharedSnapshot)> = Vec::new();
    if args.chart {
        for id in spectrum_stage_ids(&config) {
            let renderer = SnapshotRenderer::new();
            charts.push((id.to_string(), renderer.handle()));
            options = options.with_renderer(id, Box::new(renderer));
        }
    }
    let mut graph = build_graph(&config, options)?;

    println!(
        "Processing with '{}' ({} stage(s), block {})...",
        config.name,
        config.len(),
        graph.shape
    );

    let mut input_meter = LevelMeter::default();
    input_meter.add(samples.iter().map(|&s| f64::from(s)));
    let total_samples = samples.len();

    let mut source = WavSource::from_interleaved(samples, spec, config.block_size)?;
    let pb = ProgressBar::new(source.total_blocks() as u64);
    pb.set_style(progress_style());

    let mut input = SampleBlock::new(graph.shape);
    let mut output = SampleBlock::new(graph.shape);
    let mut scratch = vec![0.0f32; graph.shape.len()];
    let mut processed: Vec<f32> = Vec::with_capacity(total_samples + scratch.len());

    while source.next_block(&mut input)? {
        graph.tick(&mut output, &input)?;
        output.write_interleaved(&mut scratch)?;
        processed.extend_from_slice(&scratch);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    // The final block is zero-padded past the end of the input.
    processed.truncate(total_samples);

    let mut output_meter = LevelMeter::default();
    output_meter.add(processed.iter().map(|&s| f64::from(s)));

    println!("\nStats:");
    println!("  Input:  {}", input_meter.summary());
    println!("  Output: {}", output_meter.summary());

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: args.bit_depth,
    };
    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &processed, out_spec)?;

    for (id, handle) in &charts {
        let snapshot = handle
            .lock()
            .map_err(|_| anyhow::anyhow!("chart for '{id}' is unavailable"))?;
        match snapshot.axes {
            Some(axes) => {
                println!("\n{id} (frame {})", snapshot.frame);
                print!("{}", draw_chart(&axes, &snapshot.slots, args.cols, args.rows));
            }
            None => println!("\n{id}: no chart (input shorter than one transform)"),
        }
    }

    println!("Done!");
    Ok(())
}
