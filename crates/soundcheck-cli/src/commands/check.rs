//! Graph validation command.

use clap::Args;
use soundcheck_config::{BuildOptions, StageKind, build_graph, validate_graph};

use super::common::{apply_params, load_graph, parse_key_val};

#[derive(Args)]
pub struct CheckArgs {
    /// Factory layout name or graph file (TOML)
    #[arg(value_name = "GRAPH")]
    graph: String,

    /// Stage parameters to apply before checking
    #[arg(long, value_parser = parse_key_val, number_of_values = 1)]
    param: Vec<(String, String)>,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let mut config = load_graph(&args.graph)?;
    apply_params(&mut config, &args.param)?;

    if let Err(errors) = validate_graph(&config) {
        let errors = errors.into_vec();
        println!("Graph '{}' has {} problem(s):", config.name, errors.len());
        for error in &errors {
            println!("  - {error}");
        }
        anyhow::bail!("validation failed");
    }

    let graph = build_graph(&config, BuildOptions::new())?;

    println!("Graph: {}", config.name);
    if let Some(desc) = &config.description {
        println!("  {desc}");
    }
    println!();
    println!("  Sample rate: {} Hz", config.sample_rate);
    println!(
        "  Block: {} ({:.1} ms)",
        graph.shape,
        graph.block_seconds() * 1000.0
    );
    println!("  Entry: {}", config.entry);
    println!();
    println!("  {:<12} {:<12} {:<20} {:<20}", "ID", "KIND", "PRE", "POST");
    println!("  {}", "-".repeat(64));
    for stage in &config.stages {
        let kind = StageKind::from_name(&stage.kind).map_or("?", StageKind::name);
        println!(
            "  {:<12} {:<12} {:<20} {:<20}",
            stage.id,
            kind,
            stage.inserts.pre.join(","),
            stage.inserts.post.join(",")
        );
        let mut params: Vec<_> = stage.params.iter().collect();
        params.sort();
        for (key, value) in params {
            println!("  {:<12} {key} = {value}", "");
        }
    }
    println!();
    println!("OK ({} stage(s))", graph.graph.len());
    Ok(())
}
