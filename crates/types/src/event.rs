//! CLM event records.

use crate::{CarId, EventId, LocationId, TrainId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of observable state change carried by a [`ClmEvent`].
///
/// Train-level events use upper-case tags; the three straggler side-events
/// keep their lower-case tags so downstream consumers can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "FORM_TRAIN")]
    FormTrain,
    #[serde(rename = "LOAD_START")]
    LoadStart,
    #[serde(rename = "LOAD_COMPLETE")]
    LoadComplete,
    #[serde(rename = "DEPART_ORIGIN")]
    DepartOrigin,
    #[serde(rename = "ARRIVE_STATION")]
    ArriveStation,
    #[serde(rename = "DEPART_STATION")]
    DepartStation,
    #[serde(rename = "ARRIVE_DESTINATION")]
    ArriveDestination,
    #[serde(rename = "UNLOAD_START")]
    UnloadStart,
    #[serde(rename = "UNLOAD_COMPLETE")]
    UnloadComplete,
    #[serde(rename = "DEPART_DESTINATION")]
    DepartDestination,
    #[serde(rename = "ARRIVE_ORIGIN")]
    ArriveOrigin,
    /// A single car detached from its train at a station.
    #[serde(rename = "car_set_out")]
    CarSetOut,
    /// A detached car resumed travel on its own.
    #[serde(rename = "car_picked_up")]
    CarPickedUp,
    /// A detached car reached the end of its leg independently.
    #[serde(rename = "arrived_destination")]
    ArrivedDestination,
}

impl EventType {
    /// Every event type, in lifecycle order.
    pub const ALL: [EventType; 14] = [
        EventType::FormTrain,
        EventType::LoadStart,
        EventType::LoadComplete,
        EventType::DepartOrigin,
        EventType::ArriveStation,
        EventType::DepartStation,
        EventType::ArriveDestination,
        EventType::UnloadStart,
        EventType::UnloadComplete,
        EventType::DepartDestination,
        EventType::ArriveOrigin,
        EventType::CarSetOut,
        EventType::CarPickedUp,
        EventType::ArrivedDestination,
    ];

    /// The wire tag for this event type.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::FormTrain => "FORM_TRAIN",
            EventType::LoadStart => "LOAD_START",
            EventType::LoadComplete => "LOAD_COMPLETE",
            EventType::DepartOrigin => "DEPART_ORIGIN",
            EventType::ArriveStation => "ARRIVE_STATION",
            EventType::DepartStation => "DEPART_STATION",
            EventType::ArriveDestination => "ARRIVE_DESTINATION",
            EventType::UnloadStart => "UNLOAD_START",
            EventType::UnloadComplete => "UNLOAD_COMPLETE",
            EventType::DepartDestination => "DEPART_DESTINATION",
            EventType::ArriveOrigin => "ARRIVE_ORIGIN",
            EventType::CarSetOut => "car_set_out",
            EventType::CarPickedUp => "car_picked_up",
            EventType::ArrivedDestination => "arrived_destination",
        }
    }

    /// Whether this is one of the detached-car side-events.
    pub fn is_straggler(self) -> bool {
        matches!(
            self,
            EventType::CarSetOut | EventType::CarPickedUp | EventType::ArrivedDestination
        )
    }

    /// Whether this is an intermediate station event.
    pub fn is_station(self) -> bool {
        matches!(self, EventType::ArriveStation | EventType::DepartStation)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A car-location-message: one observable state change of one or more cars.
///
/// Immutable once emitted. `train_id` is `None` for a car traveling
/// independently of any train (a recovered straggler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClmEvent {
    /// Run-unique id, assigned in emission order.
    pub id: EventId,
    pub timestamp: NaiveDateTime,
    pub cars: Vec<CarId>,
    pub train_id: Option<TrainId>,
    pub location: LocationId,
    pub event_type: EventType,
    pub loaded: bool,
    pub commodity: String,
    /// Total lading weight across all cars; zero when empty.
    pub weight_tons: f64,
}

impl ClmEvent {
    /// Number of cars covered by this event.
    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    /// Train id as exported: empty string for independently traveling cars.
    pub fn train_label(&self) -> String {
        self.train_id.map(|t| t.to_string()).unwrap_or_default()
    }

    /// Expand into one row per car, splitting the weight evenly.
    pub fn car_rows(&self) -> Vec<CarRow> {
        if self.cars.is_empty() {
            return Vec::new();
        }
        let weight_share = self.weight_tons / self.cars.len() as f64;
        let train_id = self.train_label();

        self.cars
            .iter()
            .map(|&car_id| CarRow {
                event_id: self.id,
                timestamp: self.timestamp,
                car_id: car_id.to_string(),
                train_id: train_id.clone(),
                location_id: self.location.clone(),
                event_type: self.event_type,
                loaded: self.loaded,
                commodity: self.commodity.clone(),
                weight_tons: weight_share,
            })
            .collect()
    }
}

/// One car's view of a [`ClmEvent`], as exported to tabular sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarRow {
    pub event_id: EventId,
    pub timestamp: NaiveDateTime,
    pub car_id: String,
    pub train_id: String,
    pub location_id: LocationId,
    pub event_type: EventType,
    pub loaded: bool,
    pub commodity: String,
    pub weight_tons: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_event(cars: Vec<CarId>, train_id: Option<TrainId>) -> ClmEvent {
        ClmEvent {
            id: EventId(3),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            cars,
            train_id,
            location: LocationId::new("MINE"),
            event_type: EventType::DepartOrigin,
            loaded: true,
            commodity: "coal".to_string(),
            weight_tons: 300.0,
        }
    }

    #[test]
    fn test_car_rows_split_weight_evenly() {
        let event = sample_event(vec![CarId(1), CarId(2), CarId(3)], Some(TrainId(0)));
        let rows = event.car_rows();

        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.weight_tons, 100.0);
            assert_eq!(row.train_id, "UT000");
            assert_eq!(row.event_id, EventId(3));
        }
        assert_eq!(rows[1].car_id, "CAR00002");
    }

    #[test]
    fn test_car_rows_empty_event() {
        let event = sample_event(Vec::new(), Some(TrainId(0)));
        assert!(event.car_rows().is_empty());
    }

    #[test]
    fn test_independent_car_has_empty_train_label() {
        let event = sample_event(vec![CarId(9)], None);
        assert_eq!(event.train_label(), "");
        assert_eq!(event.car_rows()[0].train_id, "");
    }

    #[test]
    fn test_event_type_tags_match_serde() {
        for event_type in EventType::ALL {
            let json = serde_json::to_string(&event_type).unwrap();
            assert_eq!(json, format!("\"{}\"", event_type.as_str()));
        }
    }

    #[test]
    fn test_straggler_classification() {
        assert!(EventType::CarSetOut.is_straggler());
        assert!(EventType::ArrivedDestination.is_straggler());
        assert!(!EventType::ArriveDestination.is_straggler());
        assert!(EventType::DepartStation.is_station());
    }
}
