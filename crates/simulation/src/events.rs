//! Accumulated CLM event log for one run.

use chrono::NaiveDateTime;
use unitrain_types::{CarId, ClmEvent, EventId, EventType, LocationId, TrainId};

/// Append-only event log with run-local id assignment.
///
/// Weight is derived at emission: `cars × capacity` when loaded, zero when
/// empty.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<ClmEvent>,
    next_id: EventId,
    commodity: String,
    capacity_tons: f64,
}

impl EventLog {
    /// Create an empty log for a fleet carrying `commodity`.
    pub fn new(commodity: impl Into<String>, capacity_tons: f64) -> Self {
        Self {
            events: Vec::new(),
            next_id: EventId::FIRST,
            commodity: commodity.into(),
            capacity_tons,
        }
    }

    /// Append an event and return its id.
    pub fn emit(
        &mut self,
        event_type: EventType,
        timestamp: NaiveDateTime,
        location: &LocationId,
        cars: &[CarId],
        train_id: Option<TrainId>,
        loaded: bool,
    ) -> EventId {
        let id = self.next_id;
        self.next_id = id.next();

        let weight_tons = if loaded {
            cars.len() as f64 * self.capacity_tons
        } else {
            0.0
        };

        self.events.push(ClmEvent {
            id,
            timestamp,
            cars: cars.to_vec(),
            train_id,
            location: location.clone(),
            event_type,
            loaded,
            commodity: self.commodity.clone(),
            weight_tons,
        });
        id
    }

    /// Events emitted so far, in emission order.
    pub fn events(&self) -> &[ClmEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consume the log, returning events ordered by timestamp.
    ///
    /// Timestamp is the only sort key. Equal timestamps keep emission order
    /// because the sort is stable, which keeps the output reproducible.
    pub fn into_sorted(self) -> Vec<ClmEvent> {
        let mut events = self.events;
        events.sort_by_key(|e| e.timestamp);
        events
    }
}
