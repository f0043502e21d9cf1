//! Train records and lifecycle phases.

use crate::{time, SimulationError};
use chrono::{Duration, NaiveDateTime};
use std::fmt;
use unitrain_types::{CarId, CorridorId, LocationId, TrainId};

/// Lifecycle phase of a unit train.
///
/// Trains cycle through the phases in declaration order and wrap from
/// `TransitEmpty` back to `Idle`; there is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    WaitingLoad,
    Loading,
    TransitLoaded,
    WaitingUnload,
    Unloading,
    TransitEmpty,
}

impl Phase {
    /// The phase entered when this one completes.
    pub fn next(self) -> Phase {
        match self {
            Phase::Idle => Phase::WaitingLoad,
            Phase::WaitingLoad => Phase::Loading,
            Phase::Loading => Phase::TransitLoaded,
            Phase::TransitLoaded => Phase::WaitingUnload,
            Phase::WaitingUnload => Phase::Unloading,
            Phase::Unloading => Phase::TransitEmpty,
            Phase::TransitEmpty => Phase::Idle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::WaitingLoad => "waiting_load",
            Phase::Loading => "loading",
            Phase::TransitLoaded => "transit_loaded",
            Phase::WaitingUnload => "waiting_unload",
            Phase::Unloading => "unloading",
            Phase::TransitEmpty => "transit_empty",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one logical train. Mutated only by the lifecycle state machine.
#[derive(Debug, Clone)]
pub struct Train {
    pub id: TrainId,

    /// Cars held exclusively by this train while assigned.
    pub cars: Vec<CarId>,

    /// Where the train last was; `None` before its first formation.
    pub location: Option<LocationId>,

    /// Corridor of the current cycle; `None` while idle.
    pub corridor: Option<CorridorId>,

    pub loaded: bool,

    /// Formation time of the current cycle.
    pub formed_at: Option<NaiveDateTime>,

    /// When this train next needs attention. The driver's scheduling key.
    pub next_event: NaiveDateTime,

    phase: Phase,

    /// Sampled loaded transit days, reused for the empty return.
    pub loaded_transit_days: f64,
}

impl Train {
    /// Create an idle train first due at `first_event`.
    pub fn new(id: TrainId, first_event: NaiveDateTime) -> Self {
        Self {
            id,
            cars: Vec::new(),
            location: None,
            corridor: None,
            loaded: false,
            formed_at: None,
            next_event: first_event,
            phase: Phase::Idle,
            loaded_transit_days: 0.0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to the next phase, due at `at`.
    pub fn advance(&mut self, at: NaiveDateTime) {
        self.phase = self.phase.next();
        self.next_event = at;
    }

    /// Stay in the current phase and try again after `delay`.
    pub fn retry_after(&mut self, delay: Duration) -> Result<(), SimulationError> {
        self.next_event = time::after(self.next_event, delay)?;
        Ok(())
    }

    /// Drop a detached car from the active consist.
    pub fn detach(&mut self, car: CarId) {
        self.cars.retain(|&c| c != car);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_phase_cycle_returns_to_idle() {
        let mut phase = Phase::Idle;
        let mut visited = Vec::new();
        for _ in 0..7 {
            visited.push(phase);
            phase = phase.next();
        }
        assert_eq!(phase, Phase::Idle);
        assert_eq!(
            visited,
            vec![
                Phase::Idle,
                Phase::WaitingLoad,
                Phase::Loading,
                Phase::TransitLoaded,
                Phase::WaitingUnload,
                Phase::Unloading,
                Phase::TransitEmpty,
            ]
        );
    }

    #[test]
    fn test_advance_and_retry() {
        let mut train = Train::new(TrainId(0), start());
        train.retry_after(Duration::hours(24)).unwrap();
        assert_eq!(train.phase(), Phase::Idle);
        assert_eq!(train.next_event, start() + Duration::hours(24));

        train.advance(start() + Duration::hours(25));
        assert_eq!(train.phase(), Phase::WaitingLoad);
        assert_eq!(train.next_event, start() + Duration::hours(25));
    }

    #[test]
    fn test_detach_removes_only_that_car() {
        let mut train = Train::new(TrainId(0), start());
        train.cars = vec![CarId(1), CarId(2), CarId(3)];
        train.detach(CarId(2));
        assert_eq!(train.cars, vec![CarId(1), CarId(3)]);
    }
}
