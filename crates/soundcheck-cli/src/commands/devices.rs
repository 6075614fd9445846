//! `soundcheck devices`: what the `live` command can open.

use clap::{Args, Subcommand, ValueEnum};
use soundcheck_io::{AudioDevice, Direction, default_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// Enumerate devices with the index `live` accepts
    List {
        /// Only show one side
        #[arg(long, value_enum)]
        only: Option<Side>,
    },

    /// Show the host's default capture and playback devices
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Input,
    Output,
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Input => Direction::Input,
            Side::Output => Direction::Output,
        }
    }
}

fn heading(direction: Direction) -> &'static str {
    match direction {
        Direction::Input => "capture",
        Direction::Output => "playback",
    }
}

fn flag(direction: Direction) -> &'static str {
    match direction {
        Direction::Input => "--input-device",
        Direction::Output => "--output-device",
    }
}

fn matches(device: &AudioDevice, direction: Direction) -> bool {
    match direction {
        Direction::Input => device.is_input,
        Direction::Output => device.is_output,
    }
}

/// Indices match what `find_device` resolves for the same direction.
fn print_side(devices: &[AudioDevice], direction: Direction) -> usize {
    let side: Vec<&AudioDevice> = devices.iter().filter(|d| matches(d, direction)).collect();
    println!("{} ({}):", heading(direction), flag(direction));
    if side.is_empty() {
        println!("  (none)");
    }
    for (index, device) in side.iter().enumerate() {
        println!("  {index:>3}  {:<40} {:>6} Hz", device.name, device.default_sample_rate);
    }
    println!();
    side.len()
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List { only: None }) {
        DevicesCommand::List { only } => {
            let devices = list_devices()?;
            if devices.is_empty() {
                println!("The audio host reported no devices.");
                return Ok(());
            }

            let sides = match only {
                Some(side) => vec![Direction::from(side)],
                None => vec![Direction::Input, Direction::Output],
            };
            let shown: usize = sides.into_iter().map(|d| print_side(&devices, d)).sum();
            println!("{shown} device entr{}", if shown == 1 { "y" } else { "ies" });
            println!("Pass an index or a name fragment, e.g. `soundcheck live --output-device 0`.");
        }

        DevicesCommand::Info => {
            let (input, output) = default_device()?;
            for (direction, device) in [(Direction::Input, input), (Direction::Output, output)] {
                let line = device.map_or_else(
                    || "no default".to_string(),
                    |d| format!("{} @ {} Hz", d.name, d.default_sample_rate),
                );
                println!("default {:<8} {line}", heading(direction));
            }
        }
    }

    Ok(())
}
