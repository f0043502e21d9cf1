//! Detached-car (straggler) model.
//!
//! During each transit leg a train may set out one car at an intermediate
//! station. The car is picked up after a delay and completes the leg on its
//! own, arriving at the leg's end location without its train. Rejoining a
//! later train is not modeled: a detached car stays out of the pool.

use crate::config::{CorridorConfig, HourRange, StragglerConfig};
use crate::events::EventLog;
use crate::{time, SimulationError};
use chrono::{Duration, NaiveDateTime};
use tracing::trace;
use unitrain_types::{CarId, EventType, LocationId, TrainId};

/// One transit leg of one train, as seen by the straggler model.
#[derive(Debug, Clone, Copy)]
pub struct Leg<'a> {
    pub train_id: TrainId,
    pub cars: &'a [CarId],
    pub corridor: &'a CorridorConfig,
    pub start: NaiveDateTime,
    pub duration: Duration,
    /// Loaded legs run origin to destination; empty legs run back.
    pub loaded: bool,
    /// Doubles the straggler rate.
    pub high_straggler_week: bool,
}

impl Leg<'_> {
    /// Where the leg begins.
    pub fn departure(&self) -> &LocationId {
        if self.loaded {
            &self.corridor.origin
        } else {
            &self.corridor.destination
        }
    }

    /// Where the leg ends.
    pub fn arrival(&self) -> &LocationId {
        if self.loaded {
            &self.corridor.destination
        } else {
            &self.corridor.origin
        }
    }
}

/// A car detached during a leg, with its independent itinerary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Straggler {
    pub car: CarId,
    pub station: LocationId,
    pub set_out_at: NaiveDateTime,
    pub picked_up_at: NaiveDateTime,
    pub arrived_at: NaiveDateTime,
}

/// Stochastic generator of detached-car side-events.
#[derive(Debug, Clone)]
pub struct StragglerModel {
    rate_per_train_per_day: f64,
    delay_hours: HourRange,
}

impl StragglerModel {
    pub fn new(config: &StragglerConfig) -> Self {
        Self {
            rate_per_train_per_day: config.rate_per_train_per_day,
            delay_hours: config.delay_hours(),
        }
    }

    /// Decide whether a car detaches on this leg.
    ///
    /// A train without cars never produces a straggler. Otherwise exactly
    /// one trigger draw is made per call, and further draws pick the car,
    /// set-out instant, station and delay.
    pub fn sample(
        &self,
        leg: &Leg<'_>,
        rng: &mut impl rand::Rng,
    ) -> Result<Option<Straggler>, SimulationError> {
        if leg.cars.is_empty() {
            return Ok(None);
        }

        let transit_days = time::as_days(leg.duration);
        let mut base_rate = self.rate_per_train_per_day * transit_days;
        if leg.high_straggler_week {
            base_rate *= 2.0;
        }
        let threshold = base_rate / leg.cars.len() as f64;

        let draw: f64 = rng.gen();
        trace!(train = %leg.train_id, draw, threshold, "Straggler draw");
        if threshold <= 0.0 || draw > threshold {
            return Ok(None);
        }

        let car = leg.cars[rng.gen_range(0..leg.cars.len())];

        let half_leg = leg.duration.num_seconds() as f64 / 2.0;
        let offset = Duration::seconds((rng.gen::<f64>() * half_leg) as i64);
        let set_out_at = time::after(leg.start, offset)?;

        let stations = leg.corridor.stations();
        let station = if stations.is_empty() {
            leg.departure().clone()
        } else {
            stations[rng.gen_range(0..stations.len())].clone()
        };

        let delay = time::hours(self.delay_hours.sample(rng))?;
        let picked_up_at = time::after(set_out_at, delay)?;
        let remaining = leg.duration - offset;

        Ok(Some(Straggler {
            car,
            station,
            set_out_at,
            picked_up_at,
            arrived_at: time::after(picked_up_at, remaining)?,
        }))
    }

    /// Sample a straggler and, if one detaches, emit its three side-events.
    ///
    /// The caller removes the returned car from the train's consist.
    pub fn run(
        &self,
        leg: &Leg<'_>,
        rng: &mut impl rand::Rng,
        log: &mut EventLog,
    ) -> Result<Option<Straggler>, SimulationError> {
        let Some(straggler) = self.sample(leg, rng)? else {
            return Ok(None);
        };
        let car = [straggler.car];

        log.emit(
            EventType::CarSetOut,
            straggler.set_out_at,
            &straggler.station,
            &car,
            Some(leg.train_id),
            leg.loaded,
        );
        log.emit(
            EventType::CarPickedUp,
            straggler.picked_up_at,
            &straggler.station,
            &car,
            None,
            leg.loaded,
        );
        log.emit(
            EventType::ArrivedDestination,
            straggler.arrived_at,
            leg.arrival(),
            &car,
            None,
            leg.loaded,
        );

        Ok(Some(straggler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleRange;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use unitrain_types::CorridorId;

    fn corridor(station_count: u32) -> CorridorConfig {
        CorridorConfig {
            id: CorridorId::new("C1"),
            origin: LocationId::new("MINE"),
            destination: LocationId::new("PLANT"),
            transit_days: SampleRange::fixed(2.0),
            station_count,
            distance_miles: 500.0,
            empty_return_factor: 0.75,
        }
    }

    fn model(rate: f64) -> StragglerModel {
        StragglerModel::new(&StragglerConfig {
            rate_per_train_per_day: rate,
            min_delay_hours: 6.0,
            max_delay_hours: 12.0,
        })
    }

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn leg<'a>(cars: &'a [CarId], corridor: &'a CorridorConfig, loaded: bool) -> Leg<'a> {
        Leg {
            train_id: TrainId(0),
            cars,
            corridor,
            start: start(),
            duration: Duration::hours(48),
            loaded,
            high_straggler_week: false,
        }
    }

    #[test]
    fn test_zero_rate_never_detaches() {
        let cars: Vec<CarId> = (0..10).map(CarId).collect();
        let corridor = corridor(3);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            assert!(model(0.0).sample(&leg(&cars, &corridor, true), &mut rng).unwrap().is_none());
        }
    }

    #[test]
    fn test_empty_train_never_detaches() {
        let corridor = corridor(3);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(model(100.0).sample(&leg(&[], &corridor, true), &mut rng).unwrap().is_none());
    }

    #[test]
    fn test_high_rate_always_detaches_within_first_half() {
        let cars: Vec<CarId> = (0..10).map(CarId).collect();
        let corridor = corridor(3);
        let stations = corridor.stations();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..200 {
            let leg = leg(&cars, &corridor, true);
            let s = model(10.0).sample(&leg, &mut rng).unwrap().unwrap();

            assert!(cars.contains(&s.car));
            assert!(stations.contains(&s.station));
            assert!(s.set_out_at >= leg.start);
            assert!(s.set_out_at <= leg.start + Duration::hours(24));

            let delay = s.picked_up_at - s.set_out_at;
            assert!(delay >= Duration::hours(6) && delay <= Duration::hours(12));

            // Remaining scheduled transit is preserved after pickup.
            let travelled = s.set_out_at - leg.start;
            assert_eq!(s.arrived_at - s.picked_up_at, leg.duration - travelled);
        }
    }

    #[test]
    fn test_high_straggler_week_doubles_rate() {
        // Threshold 0.5 normally, 1.0 (always) in a high-straggler week.
        let cars: Vec<CarId> = (0..4).map(CarId).collect();
        let corridor = corridor(2);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let mut normal_hits = 0;
        for _ in 0..400 {
            if model(1.0).sample(&leg(&cars, &corridor, true), &mut rng).unwrap().is_some() {
                normal_hits += 1;
            }
        }
        assert!(normal_hits > 100 && normal_hits < 300, "hits: {normal_hits}");

        for _ in 0..100 {
            let mut high = leg(&cars, &corridor, true);
            high.high_straggler_week = true;
            assert!(model(1.0).sample(&high, &mut rng).unwrap().is_some());
        }
    }

    #[test]
    fn test_no_stations_sets_out_at_departure() {
        let cars = [CarId(1)];
        let corridor = corridor(0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let s = model(10.0).sample(&leg(&cars, &corridor, false), &mut rng).unwrap().unwrap();
        assert_eq!(s.station, LocationId::new("PLANT"));
    }

    #[test]
    fn test_run_emits_triplet() {
        let cars: Vec<CarId> = (0..10).map(CarId).collect();
        let corridor = corridor(3);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut log = EventLog::new("coal", 100.0);

        let s = model(10.0)
            .run(&leg(&cars, &corridor, false), &mut rng, &mut log)
            .unwrap()
            .unwrap();

        let events = log.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, EventType::CarSetOut);
        assert_eq!(events[0].train_id, Some(TrainId(0)));
        assert_eq!(events[1].event_type, EventType::CarPickedUp);
        assert_eq!(events[1].train_id, None);
        assert_eq!(events[1].location, s.station);
        assert_eq!(events[2].event_type, EventType::ArrivedDestination);
        assert_eq!(events[2].location, LocationId::new("MINE"));
        assert_eq!(events[2].timestamp, s.arrived_at);
        for event in events {
            assert_eq!(event.cars, vec![s.car]);
            assert_eq!(event.weight_tons, 0.0);
        }
    }
}
