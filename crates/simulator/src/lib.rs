//! Unit-Train Simulator
//!
//! Outer surface for `unitrain-simulation`: configuration files, run
//! reports and the `unitrain-sim` command-line tool.
//!
//! # Example
//!
//! ```ignore
//! use unitrain_simulation::Generator;
//! use unitrain_simulator::{load_config, SimulationReport};
//!
//! let config = load_config("network.toml")?;
//! let output = Generator::new(config, 42).run()?;
//! let report = SimulationReport::from_output(&output, 42)?;
//!
//! println!("{report}");
//! ```

pub mod config;
pub mod report;

pub use config::{default_config_toml, load_config, parse_config, LoadError};
pub use report::SimulationReport;
