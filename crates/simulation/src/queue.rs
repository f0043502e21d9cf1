//! Terminal slot booking for loading and unloading.
//!
//! Each terminal serves one train at a time per queue type. A slot is
//! booked when a train starts loading or unloading and deleted when it
//! completes; no history is kept.
//!
//! The configured terminal `queue_capacity` and per-type concurrency are
//! not consulted here: a terminal with an active slot admits no other
//! overlapping booking regardless of capacity.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use unitrain_types::{LocationId, TrainId};

/// Which terminal operation a slot books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Loading,
    Unloading,
}

/// An active booking of a terminal over the half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSlot {
    pub train_id: TrainId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl QueueSlot {
    /// Whether this slot strictly overlaps `[start, end)`. Touching
    /// boundaries do not overlap.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        !(start >= self.end || end <= self.start)
    }
}

/// Booking tables for both queue types, keyed by terminal.
#[derive(Debug, Default)]
pub struct SlotQueues {
    loading: HashMap<LocationId, QueueSlot>,
    unloading: HashMap<LocationId, QueueSlot>,
}

impl SlotQueues {
    /// Create empty booking tables.
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: QueueKind) -> &HashMap<LocationId, QueueSlot> {
        match kind {
            QueueKind::Loading => &self.loading,
            QueueKind::Unloading => &self.unloading,
        }
    }

    fn table_mut(&mut self, kind: QueueKind) -> &mut HashMap<LocationId, QueueSlot> {
        match kind {
            QueueKind::Loading => &mut self.loading,
            QueueKind::Unloading => &mut self.unloading,
        }
    }

    /// Whether a booking of `[start, end)` at `location` would be granted.
    pub fn can_start(
        &self,
        kind: QueueKind,
        location: &LocationId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> bool {
        self.table(kind)
            .get(location)
            .map_or(true, |slot| !slot.overlaps(start, end))
    }

    /// Install a booking, replacing any existing slot at `location`.
    ///
    /// Callers check [`can_start`](Self::can_start) first.
    pub fn start(&mut self, kind: QueueKind, location: LocationId, slot: QueueSlot) {
        self.table_mut(kind).insert(location, slot);
    }

    /// Delete the booking at `location` if it belongs to `train_id`.
    ///
    /// A touching booking by another train may already have replaced the
    /// slot; that booking is left in place.
    pub fn complete(&mut self, kind: QueueKind, location: &LocationId, train_id: TrainId) {
        let table = self.table_mut(kind);
        if table.get(location).is_some_and(|slot| slot.train_id == train_id) {
            table.remove(location);
        }
    }

    /// The active booking at `location`, if any.
    pub fn active(&self, kind: QueueKind, location: &LocationId) -> Option<&QueueSlot> {
        self.table(kind).get(location)
    }

    pub fn can_start_loading(
        &self,
        location: &LocationId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> bool {
        self.can_start(QueueKind::Loading, location, start, end)
    }

    pub fn can_start_unloading(
        &self,
        location: &LocationId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> bool {
        self.can_start(QueueKind::Unloading, location, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t(hour: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::hours(hour)
    }

    fn slot(train: u32, start: i64, end: i64) -> QueueSlot {
        QueueSlot {
            train_id: TrainId(train),
            start: t(start),
            end: t(end),
        }
    }

    #[test]
    fn test_empty_location_accepts_any_interval() {
        let queues = SlotQueues::new();
        assert!(queues.can_start_loading(&LocationId::new("MINE"), t(0), t(10)));
    }

    #[test]
    fn test_overlap_rejected() {
        let mut queues = SlotQueues::new();
        let mine = LocationId::new("MINE");
        queues.start(QueueKind::Loading, mine.clone(), slot(0, 10, 20));

        assert!(!queues.can_start_loading(&mine, t(15), t(25)));
        assert!(!queues.can_start_loading(&mine, t(5), t(11)));
        assert!(!queues.can_start_loading(&mine, t(12), t(18)));
        assert!(!queues.can_start_loading(&mine, t(0), t(30)));
    }

    #[test]
    fn test_touching_boundaries_allowed() {
        let mut queues = SlotQueues::new();
        let mine = LocationId::new("MINE");
        queues.start(QueueKind::Loading, mine.clone(), slot(0, 10, 20));

        assert!(queues.can_start_loading(&mine, t(20), t(30)));
        assert!(queues.can_start_loading(&mine, t(0), t(10)));
    }

    #[test]
    fn test_queue_types_are_independent() {
        let mut queues = SlotQueues::new();
        let plant = LocationId::new("PLANT");
        queues.start(QueueKind::Loading, plant.clone(), slot(0, 0, 10));

        assert!(queues.can_start_unloading(&plant, t(0), t(10)));
        assert!(!queues.can_start_loading(&plant, t(0), t(10)));
    }

    #[test]
    fn test_locations_are_independent() {
        let mut queues = SlotQueues::new();
        queues.start(QueueKind::Unloading, LocationId::new("A"), slot(0, 0, 10));
        assert!(queues.can_start_unloading(&LocationId::new("B"), t(0), t(10)));
    }

    #[test]
    fn test_complete_frees_location() {
        let mut queues = SlotQueues::new();
        let mine = LocationId::new("MINE");
        queues.start(QueueKind::Loading, mine.clone(), slot(0, 0, 10));
        queues.complete(QueueKind::Loading, &mine, TrainId(0));

        assert!(queues.active(QueueKind::Loading, &mine).is_none());
        assert!(queues.can_start_loading(&mine, t(2), t(8)));

        // Completing an idle location is a no-op.
        queues.complete(QueueKind::Loading, &mine, TrainId(0));
    }

    #[test]
    fn test_touching_booking_survives_previous_completion() {
        let mut queues = SlotQueues::new();
        let mine = LocationId::new("MINE");
        queues.start(QueueKind::Loading, mine.clone(), slot(0, 0, 10));
        queues.start(QueueKind::Loading, mine.clone(), slot(1, 10, 20));

        // Train 0 completes at hour 10 after train 1 booked [10, 20).
        queues.complete(QueueKind::Loading, &mine, TrainId(0));
        assert_eq!(
            queues.active(QueueKind::Loading, &mine),
            Some(&slot(1, 10, 20))
        );
        assert!(!queues.can_start_loading(&mine, t(12), t(14)));
    }
}
