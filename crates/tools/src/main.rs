use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tools::{RunOptions, Scenario, ScenarioRunner};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays vector feature scenarios against a 3D scene model")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every pass of a scenario and print one JSON report per pass
    Run {
        /// Scenario file (JSON)
        scenario: PathBuf,

        /// Pretty-print the reports
        #[arg(long)]
        pretty: bool,

        /// Leave image loads pending instead of resolving them after each pass
        #[arg(long)]
        no_images: bool,

        /// Skip the primitive index consistency check
        #[arg(long)]
        no_check: bool,
    },

    /// Parse a scenario and print its normalized form
    Check {
        /// Scenario file (JSON)
        scenario: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    match Args::parse().command {
        Command::Run {
            scenario,
            pretty,
            no_images,
            no_check,
        } => {
            let loaded = Scenario::load(&scenario).map_err(|e| e.to_string())?;
            let options = RunOptions {
                resolve_images: !no_images,
                check_index: !no_check,
            };
            let mut runner = ScenarioRunner::new(&loaded, options);
            let reports = runner.run(&loaded.passes).map_err(|e| e.to_string())?;
            for report in &reports {
                let line = if pretty {
                    serde_json::to_string_pretty(report)
                } else {
                    serde_json::to_string(report)
                }
                .map_err(|e| e.to_string())?;
                println!("{line}");
            }
            info!("{} passes replayed from {}", reports.len(), scenario.display());
        }
        Command::Check { scenario } => {
            let loaded = Scenario::load(&scenario).map_err(|e| e.to_string())?;
            for pass in &loaded.passes {
                for feature in &pass.features {
                    for geometry in &feature.geometries {
                        geometry.to_geometry(feature.id).map_err(|e| e.to_string())?;
                    }
                }
            }
            let text = serde_json::to_string_pretty(&loaded).map_err(|e| e.to_string())?;
            println!("{text}");
        }
    }
    Ok(())
}
