//! Error types for simulation runs.

use crate::config::ConfigError;
use thiserror::Error;
use unitrain_types::{CorridorId, LocationId, TrainId};

/// Fatal errors that abort a run. No partial event log is returned.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The configured start date is not `YYYY-MM-DD`.
    #[error("Invalid start date {value:?}: {source}")]
    InvalidStartDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A train references a corridor that is not configured.
    #[error("Unknown corridor: {0}")]
    UnknownCorridor(CorridorId),

    /// A train outside its idle phase has no corridor assigned.
    #[error("Train {0} has no corridor")]
    NoCorridor(TrainId),

    /// An origin or destination lookup failed.
    #[error("Unknown location: {0}")]
    UnknownLocation(LocationId),

    /// A simulated instant or span falls outside the calendar's range.
    #[error("Simulated time out of range")]
    TimeOutOfRange,

    /// The configuration cannot describe a simulation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
