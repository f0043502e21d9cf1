//! Core types for unit-train car-location-message (CLM) logs.
//!
//! This crate holds the vocabulary shared by the simulation engine and its
//! consumers: strongly-typed identifiers, the immutable [`ClmEvent`] record
//! and its closed [`EventType`] tag, and the per-car [`CarRow`] expansion
//! used for tabular export.

mod event;
mod identifiers;

pub use event::{CarRow, ClmEvent, EventType};
pub use identifiers::{CarId, CorridorId, EventId, LocationId, TrainId};
