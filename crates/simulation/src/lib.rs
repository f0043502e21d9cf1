//! Deterministic unit-train event simulation.
//!
//! This crate generates a synthetic Car Location Message (CLM) event log for
//! a fleet of unit trains cycling between origin and destination terminals.
//! Given the same configuration and seed, it produces identical results
//! every run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Generator                          │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     trains: Vec<Train>                             │ │
//! │  │     Earliest next_event first, lowest id on ties   │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Lifecycle: one phase-step per call             │ │
//! │  │     CarPool · SlotQueues · StragglerModel · rng    │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     EventLog → stable sort by timestamp            │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use unitrain_simulation::{generate, SimulationConfig};
//!
//! let config = SimulationConfig::default()
//!     .with_window("2024-01-01", 30)
//!     .with_trains(4, 110);
//!
//! let events = generate(config, 42)?;
//! ```

pub mod config;
mod error;
mod events;
pub mod lifecycle;
mod network;
mod pool;
mod queue;
mod runner;
mod straggler;
pub mod time;
mod train;

pub use config::{
    ConfigError, CorridorConfig, DayRange, FleetConfig, HourRange, LocationConfig, QueueConfig,
    SampleRange, SeasonalConfig, SimulationConfig, StragglerConfig, TrainConfig, WindowConfig,
};
pub use error::SimulationError;
pub use events::EventLog;
pub use lifecycle::Lifecycle;
pub use network::Network;
pub use pool::CarPool;
pub use queue::{QueueKind, QueueSlot, SlotQueues};
pub use runner::{generate, Generator, SimulationOutput, SimulationStats, TRAIN_STAGGER};
pub use straggler::{Leg, Straggler, StragglerModel};
pub use train::{Phase, Train};
