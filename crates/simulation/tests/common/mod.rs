//! Log reconstruction helpers shared by the integration tests.
#![allow(dead_code)]

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use unitrain_simulation::{SampleRange, SimulationConfig};
use unitrain_types::{ClmEvent, EventType, LocationId, TrainId};

/// Default network with a fixed two-day loaded transit.
pub fn fixed_transit_config(days: u32) -> SimulationConfig {
    let mut config = SimulationConfig::default().with_window("2024-01-01", days);
    config.corridors[0].transit_days = SampleRange::fixed(2.0);
    config
}

/// Events carried by `train`, excluding detached-car side events.
pub fn train_events(events: &[ClmEvent], train: TrainId) -> Vec<&ClmEvent> {
    events
        .iter()
        .filter(|e| e.train_id == Some(train) && !e.event_type.is_straggler())
        .collect()
}

/// Every train id that appears in the log.
pub fn trains(events: &[ClmEvent]) -> Vec<TrainId> {
    let mut ids: Vec<TrainId> = events.iter().filter_map(|e| e.train_id).collect();
    ids.sort();
    ids.dedup();
    ids
}

/// A terminal booking derived from a start/complete event pair.
#[derive(Debug, Clone, Copy)]
pub struct Booking {
    pub train: TrainId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Rebuild booking intervals per location from start/complete pairs.
///
/// A start whose completion lies beyond the logged window is open-ended.
pub fn bookings(
    events: &[ClmEvent],
    start_type: EventType,
    complete_type: EventType,
) -> BTreeMap<LocationId, Vec<Booking>> {
    let mut open: HashMap<TrainId, (LocationId, NaiveDateTime)> = HashMap::new();
    let mut result: BTreeMap<LocationId, Vec<Booking>> = BTreeMap::new();

    for event in events {
        let Some(train) = event.train_id else { continue };
        if event.event_type == start_type {
            open.insert(train, (event.location.clone(), event.timestamp));
        } else if event.event_type == complete_type {
            let (location, start) = open.remove(&train).expect("completion without start");
            assert_eq!(location, event.location);
            result.entry(location).or_default().push(Booking {
                train,
                start,
                end: event.timestamp,
            });
        }
    }
    for (train, (location, start)) in open {
        result.entry(location).or_default().push(Booking {
            train,
            start,
            end: NaiveDateTime::MAX,
        });
    }
    result
}

/// Coarse lifecycle position inferred from the non-station events of a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inferred {
    Idle,
    WaitingLoad,
    Loading,
    Loaded,
    TransitLoaded,
    WaitingUnload,
    Unloading,
    Unloaded,
    TransitEmpty,
}

impl Inferred {
    pub fn in_transit(self) -> bool {
        matches!(self, Inferred::TransitLoaded | Inferred::TransitEmpty)
    }
}

/// The position after observing `event_type`, or `None` if the event cannot
/// follow `from`. Station events are tracked by [`StationVisits`] instead.
pub fn infer_next(from: Inferred, event_type: EventType) -> Option<Inferred> {
    use EventType::*;
    use Inferred::*;
    Some(match (from, event_type) {
        (Idle, FormTrain) => WaitingLoad,
        (WaitingLoad, LoadStart) => Loading,
        (Loading, LoadComplete) => Loaded,
        (Loaded, DepartOrigin) => TransitLoaded,
        (TransitLoaded, ArriveDestination) => WaitingUnload,
        (WaitingUnload, UnloadStart) => Unloading,
        (Unloading, UnloadComplete) => Unloaded,
        (Unloaded, DepartDestination) => TransitEmpty,
        (TransitEmpty, ArriveOrigin) => Idle,
        _ => return None,
    })
}

/// Open station visits of one train, matched per station id.
///
/// A dwell can outlast the following segment, so in timestamp order a train
/// may reach its next station, or the end of the leg, before the departure
/// from the previous station is logged.
#[derive(Debug, Default)]
pub struct StationVisits {
    open: HashMap<LocationId, usize>,
    arrivals_on_leg: usize,
}

impl StationVisits {
    pub fn arrive(&mut self, station: &LocationId) {
        *self.open.entry(station.clone()).or_default() += 1;
        self.arrivals_on_leg += 1;
    }

    /// Close a visit; false if the train never arrived at `station`.
    pub fn depart(&mut self, station: &LocationId) -> bool {
        match self.open.get_mut(station) {
            Some(open) if *open > 0 => {
                *open -= 1;
                true
            }
            _ => false,
        }
    }

    /// Stations reached on the leg just finished.
    pub fn end_leg(&mut self) -> usize {
        std::mem::take(&mut self.arrivals_on_leg)
    }
}
