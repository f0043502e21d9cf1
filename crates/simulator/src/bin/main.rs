//! Unit-Train Simulator CLI
//!
//! Generates a synthetic CLM event log and prints a run report or the
//! per-car event rows.

use clap::{Parser, Subcommand};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use unitrain_simulation::{Generator, SimulationConfig};
use unitrain_simulator::{default_config_toml, load_config, SimulationReport};

#[derive(Parser)]
#[command(name = "unitrain-sim")]
#[command(about = "Deterministic unit-train CLM event generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and print its report
    Run {
        /// TOML configuration file (built-in default network if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Override the simulated window length in days
        #[arg(long)]
        days: Option<u32>,

        /// Override the number of parallel trains
        #[arg(long)]
        trains: Option<u32>,

        /// Print every per-car event row as a JSON line instead of the report
        #[arg(long)]
        dump_events: bool,

        /// Log level when RUST_LOG is unset
        #[arg(long, default_value = "info")]
        log_level: String,
    },

    /// Print the default configuration as TOML
    DefaultConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::DefaultConfig => {
            print!("{}", default_config_toml()?);
        }

        Commands::Run {
            config,
            seed,
            days,
            trains,
            dump_events,
            log_level,
        } => {
            // Logs go to stderr; stdout carries the report or rows.
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();

            let mut config = match config {
                Some(path) => load_config(path)?,
                None => SimulationConfig::default(),
            };
            if let Some(days) = days {
                config.window.duration_days = days;
            }
            if let Some(trains) = trains {
                config.trains.parallel_trains = trains;
            }

            let output = Generator::new(config, seed).run()?;

            if dump_events {
                let mut out = BufWriter::new(std::io::stdout().lock());
                for event in &output.events {
                    for row in event.car_rows() {
                        serde_json::to_writer(&mut out, &row)?;
                        writeln!(out)?;
                    }
                }
                out.flush()?;
            } else {
                let report = SimulationReport::from_output(&output, seed)?;
                print!("{report}");
            }
        }
    }

    Ok(())
}
