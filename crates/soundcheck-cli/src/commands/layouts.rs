//! Factory layout commands.
//!
//! Lists, prints and exports the built-in graphs so they can be used as a
//! starting point for custom graph files.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use soundcheck_config::{FACTORY_LAYOUT_NAMES, StageKind, factory_layouts, get_factory_layout};

#[derive(Args)]
pub struct LayoutsArgs {
    #[command(subcommand)]
    command: Option<LayoutsCommand>,
}

#[derive(Subcommand)]
enum LayoutsCommand {
    /// List factory layouts
    List,

    /// Print a factory layout as TOML
    Show {
        /// Layout name
        name: String,
    },

    /// Write a factory layout to a file
    Export {
        /// Layout name
        name: String,

        /// Destination file
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List the stage kinds a graph may use
    Kinds,
}

pub fn run(args: LayoutsArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(LayoutsCommand::List) {
        LayoutsCommand::List => {
            println!("Factory Layouts");
            println!("===============\n");
            for layout in factory_layouts() {
                println!(
                    "  {:<12} {} stage(s)  {}",
                    layout.name,
                    layout.len(),
                    layout.description.as_deref().unwrap_or("")
                );
            }
            println!();
            println!("Use with: soundcheck run --graph <NAME>");
        }

        LayoutsCommand::Show { name } => {
            let layout = find(&name)?;
            print!("{}", layout.to_toml()?);
        }

        LayoutsCommand::Export { name, path, force } => {
            let layout = find(&name)?;
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            layout.save(&path)?;
            println!("Exported '{}' to {}", layout.name, path.display());
        }

        LayoutsCommand::Kinds => {
            println!("Stage Kinds");
            println!("===========\n");
            for kind in StageKind::ALL {
                println!("  {:<12} {}", kind.name(), kind.description());
                if !kind.params().is_empty() {
                    println!("  {:<12} params: {}", "", kind.params().join(", "));
                }
            }
        }
    }
    Ok(())
}

fn find(name: &str) -> anyhow::Result<soundcheck_config::GraphConfig> {
    get_factory_layout(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown layout '{name}'. Available: {}",
            FACTORY_LAYOUT_NAMES.join(", ")
        )
    })
}
