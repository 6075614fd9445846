//! Soundcheck CLI - run routing graphs and watch their spectrum.

mod commands;
mod display;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "soundcheck")]
#[command(author, version, about = "Streaming spectrum analyser and block-routing graph runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a graph on a test signal or WAV file, paced at the block rate
    Run(commands::run::RunArgs),

    /// Run a graph on a live audio device
    Live(commands::live::LiveArgs),

    /// Process a WAV file through a graph
    Process(commands::process::ProcessArgs),

    /// Validate a graph file or layout
    Check(commands::check::CheckArgs),

    /// List, show and export factory layouts
    Layouts(commands::layouts::LayoutsArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Live(args) => commands::live::run(args),
        Commands::Process(args) => commands::process::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Layouts(args) => commands::layouts::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
