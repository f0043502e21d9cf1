//! Train lifecycle state machine.
//!
//! [`Lifecycle`] owns every resource trains contend for (car pool, terminal
//! queues, the random source and the event log) and advances one train by
//! exactly one phase-step at a time:
//!
//! ```text
//!   idle ─► waiting_load ─► loading ─► transit_loaded ─┐
//!    ▲                                                 ▼
//!   transit_empty ◄─ unloading ◄─ waiting_unload ◄─────┘
//! ```
//!
//! Cars of a train returning empty rejoin the free pool at the train's
//! arrival instant, not when the leg is scheduled. The driver's clock never
//! runs backwards, so the release is applied before the first step at or
//! after that instant.
//!
//! Resource shortages are not errors. A train that cannot form retries after
//! a day; a train whose terminal is busy retries after an hour. Retries are
//! unbounded, so an over-subscribed configuration stalls trains silently.

use crate::config::{CorridorConfig, SampleRange, SeasonalConfig, SimulationConfig};
use crate::events::EventLog;
use crate::network::Network;
use crate::pool::CarPool;
use crate::queue::{QueueKind, QueueSlot, SlotQueues};
use crate::straggler::{Leg, StragglerModel};
use crate::time;
use crate::train::{Phase, Train};
use crate::{SimulationError, SimulationStats};
use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use tracing::debug;
use unitrain_types::{CarId, EventType, LocationId};

/// Retry delay when a train cannot form.
pub const FORMATION_RETRY: Duration = Duration::hours(24);

/// Retry delay when a terminal slot is taken.
pub const QUEUE_RETRY: Duration = Duration::hours(1);

/// Gap between formation and the first loading attempt.
pub const FORMATION_TO_LOAD: Duration = Duration::minutes(1);

/// Gap between completing terminal work and departing.
pub const DEPARTURE_DELAY: Duration = Duration::minutes(30);

/// Probability that the same locomotive set is reused at turnaround.
const POWER_CONTINUITY_PROBABILITY: f64 = 0.4;

/// Turnaround when power is reused, in minutes.
const POWER_CONTINUITY_MINUTES: SampleRange = SampleRange::new(30.0, 60.0);

/// Turnaround when power changes, in hours.
const POWER_CHANGE_HOURS: SampleRange = SampleRange::new(1.0, 5.0);

/// Station dwell, in hours.
const STATION_DWELL_HOURS: SampleRange = SampleRange::new(2.0, 4.0);

/// Shared resources and the per-train transition function.
pub struct Lifecycle<R> {
    network: Network,
    seasonal: SeasonalConfig,
    cars_per_train: usize,
    stragglers: StragglerModel,
    rng: R,
    pool: CarPool,
    queues: SlotQueues,
    returning: Vec<(NaiveDateTime, Vec<CarId>)>,
    log: EventLog,
    stats: SimulationStats,
}

impl<R: Rng> Lifecycle<R> {
    /// Create the lifecycle for a configuration, shuffling the car pool with
    /// `rng`.
    pub fn new(config: &SimulationConfig, mut rng: R) -> Self {
        let pool = CarPool::shuffled(config.fleet.total_cars, &mut rng);
        Self::with_pool(config, rng, pool)
    }

    /// Create the lifecycle around an existing car pool.
    pub fn with_pool(config: &SimulationConfig, rng: R, pool: CarPool) -> Self {
        Self {
            network: Network::from_config(config),
            seasonal: config.seasonal.clone(),
            cars_per_train: config.trains.cars_per_train as usize,
            stragglers: StragglerModel::new(&config.stragglers),
            rng,
            pool,
            queues: SlotQueues::new(),
            returning: Vec::new(),
            log: EventLog::new(config.fleet.commodity.clone(), config.fleet.capacity_tons),
            stats: SimulationStats::default(),
        }
    }

    pub fn pool(&self) -> &CarPool {
        &self.pool
    }

    pub fn queues(&self) -> &SlotQueues {
        &self.queues
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Finish the run at `end`, returning the event log and statistics.
    pub fn finish(mut self, end: NaiveDateTime) -> (EventLog, SimulationStats) {
        self.release_returned(end);
        self.stats.cars_assigned_at_end = self.pool.assigned_count();
        (self.log, self.stats)
    }

    /// Return to the pool every consist that has reached origin by `now`.
    fn release_returned(&mut self, now: NaiveDateTime) {
        let pool = &mut self.pool;
        self.returning.retain(|(arrival, cars)| {
            if *arrival <= now {
                pool.release(cars);
                false
            } else {
                true
            }
        });
    }

    /// Advance `train` by one phase-step at its `next_event` time.
    pub fn step(&mut self, train: &mut Train) -> Result<(), SimulationError> {
        let from = train.phase();
        let now = train.next_event;
        self.stats.steps += 1;
        self.release_returned(now);

        match from {
            Phase::Idle => self.form(train, now),
            Phase::WaitingLoad => self.begin_loading(train, now),
            Phase::Loading => self.finish_loading(train, now),
            Phase::TransitLoaded => self.transit_loaded(train, now),
            Phase::WaitingUnload => self.begin_unloading(train, now),
            Phase::Unloading => self.finish_unloading(train, now),
            Phase::TransitEmpty => self.transit_empty(train, now),
        }?;

        if train.phase() != from {
            debug!(
                train = %train.id,
                from = %from,
                to = %train.phase(),
                at = %now,
                next = %train.next_event,
                "Phase transition"
            );
        }
        Ok(())
    }

    fn corridor_of(&self, train: &Train) -> Result<&CorridorConfig, SimulationError> {
        let id = train
            .corridor
            .as_ref()
            .ok_or(SimulationError::NoCorridor(train.id))?;
        self.network.corridor(id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Origin
    // ═══════════════════════════════════════════════════════════════════════

    fn form(&mut self, train: &mut Train, now: NaiveDateTime) -> Result<(), SimulationError> {
        if self.pool.available() < self.cars_per_train {
            self.stats.formation_retries += 1;
            debug!(
                train = %train.id,
                available = self.pool.available(),
                needed = self.cars_per_train,
                "Not enough free cars, deferring formation"
            );
            train.retry_after(FORMATION_RETRY)?;
            return Ok(());
        }

        let (Some(origin), Some(destination)) = (
            self.network.random_origin(&mut self.rng).cloned(),
            self.network.random_destination(&mut self.rng).cloned(),
        ) else {
            train.retry_after(FORMATION_RETRY)?;
            return Ok(());
        };

        let Some(corridor) = self.network.corridor_between(&origin, &destination) else {
            self.stats.formation_retries += 1;
            debug!(
                train = %train.id,
                origin = %origin,
                destination = %destination,
                "No corridor for pair, deferring formation"
            );
            train.retry_after(FORMATION_RETRY)?;
            return Ok(());
        };
        let corridor_id = corridor.id.clone();

        let Some(cars) = self.pool.allocate(self.cars_per_train) else {
            self.stats.formation_retries += 1;
            train.retry_after(FORMATION_RETRY)?;
            return Ok(());
        };

        train.cars = cars;
        train.location = Some(origin.clone());
        train.corridor = Some(corridor_id);
        train.loaded = false;
        train.formed_at = Some(now);
        self.stats.trains_formed += 1;

        self.log.emit(
            EventType::FormTrain,
            now,
            &origin,
            &train.cars,
            Some(train.id),
            false,
        );
        train.advance(time::after(now, FORMATION_TO_LOAD)?);
        Ok(())
    }

    fn begin_loading(
        &mut self,
        train: &mut Train,
        now: NaiveDateTime,
    ) -> Result<(), SimulationError> {
        let origin = self.corridor_of(train)?.origin.clone();
        let hours = self.network.origin(&origin)?.handling_hours;
        let handling = time::hours(hours.sample(&mut self.rng))?;
        let end = time::after(now, handling)?;

        if !self.queues.can_start_loading(&origin, now, end) {
            self.stats.loading_retries += 1;
            debug!(train = %train.id, location = %origin, "Loading slot busy");
            train.retry_after(QUEUE_RETRY)?;
            return Ok(());
        }

        self.queues.start(
            QueueKind::Loading,
            origin.clone(),
            QueueSlot {
                train_id: train.id,
                start: now,
                end,
            },
        );
        self.log.emit(
            EventType::LoadStart,
            now,
            &origin,
            &train.cars,
            Some(train.id),
            false,
        );
        train.advance(end);
        Ok(())
    }

    fn finish_loading(
        &mut self,
        train: &mut Train,
        now: NaiveDateTime,
    ) -> Result<(), SimulationError> {
        let origin = self.corridor_of(train)?.origin.clone();
        self.queues.complete(QueueKind::Loading, &origin, train.id);

        train.loaded = true;
        self.log.emit(
            EventType::LoadComplete,
            now,
            &origin,
            &train.cars,
            Some(train.id),
            true,
        );

        let depart = time::after(now, DEPARTURE_DELAY)?;
        self.log.emit(
            EventType::DepartOrigin,
            depart,
            &origin,
            &train.cars,
            Some(train.id),
            true,
        );
        train.advance(depart);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Destination
    // ═══════════════════════════════════════════════════════════════════════

    fn begin_unloading(
        &mut self,
        train: &mut Train,
        now: NaiveDateTime,
    ) -> Result<(), SimulationError> {
        let destination = self.corridor_of(train)?.destination.clone();
        let hours = self.network.destination(&destination)?.handling_hours;
        let handling = time::hours(hours.sample(&mut self.rng))?;
        let end = time::after(now, handling)?;

        if !self.queues.can_start_unloading(&destination, now, end) {
            self.stats.unloading_retries += 1;
            debug!(train = %train.id, location = %destination, "Unloading slot busy");
            train.retry_after(QUEUE_RETRY)?;
            return Ok(());
        }

        self.queues.start(
            QueueKind::Unloading,
            destination.clone(),
            QueueSlot {
                train_id: train.id,
                start: now,
                end,
            },
        );
        self.log.emit(
            EventType::UnloadStart,
            now,
            &destination,
            &train.cars,
            Some(train.id),
            true,
        );
        train.advance(end);
        Ok(())
    }

    fn finish_unloading(
        &mut self,
        train: &mut Train,
        now: NaiveDateTime,
    ) -> Result<(), SimulationError> {
        let destination = self.corridor_of(train)?.destination.clone();
        self.queues
            .complete(QueueKind::Unloading, &destination, train.id);

        train.loaded = false;
        self.log.emit(
            EventType::UnloadComplete,
            now,
            &destination,
            &train.cars,
            Some(train.id),
            false,
        );

        let depart = time::after(now, DEPARTURE_DELAY)?;
        self.log.emit(
            EventType::DepartDestination,
            depart,
            &destination,
            &train.cars,
            Some(train.id),
            false,
        );
        train.advance(depart);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Transit
    // ═══════════════════════════════════════════════════════════════════════

    fn transit_loaded(
        &mut self,
        train: &mut Train,
        now: NaiveDateTime,
    ) -> Result<(), SimulationError> {
        let corridor = self.corridor_of(train)?.clone();
        let week = time::iso_week(now);

        let sampled_days = corridor.transit_days.sample(&mut self.rng);
        train.loaded_transit_days = sampled_days;

        let mut effective_days = sampled_days;
        if self.seasonal.is_slow(week, &corridor.id) {
            effective_days *= self.seasonal.slowdown_factor;
            debug!(train = %train.id, corridor = %corridor.id, week, "Seasonal slowdown");
        }
        let duration = time::days(effective_days)?;
        let arrival = time::after(now, duration)?;

        self.run_leg(train, &corridor, now, duration, week)?;

        train.location = Some(corridor.destination.clone());
        self.log.emit(
            EventType::ArriveDestination,
            arrival,
            &corridor.destination,
            &train.cars,
            Some(train.id),
            true,
        );
        train.advance(arrival);
        Ok(())
    }

    fn transit_empty(
        &mut self,
        train: &mut Train,
        now: NaiveDateTime,
    ) -> Result<(), SimulationError> {
        let corridor = self.corridor_of(train)?.clone();
        let week = time::iso_week(now);
        let duration = time::days(train.loaded_transit_days * corridor.empty_return_factor)?;
        let arrival = time::after(now, duration)?;

        self.run_leg(train, &corridor, now, duration, week)?;

        self.log.emit(
            EventType::ArriveOrigin,
            arrival,
            &corridor.origin,
            &train.cars,
            Some(train.id),
            false,
        );

        self.returning
            .push((arrival, std::mem::take(&mut train.cars)));
        train.location = Some(corridor.origin.clone());
        train.corridor = None;
        self.stats.cycles_completed += 1;

        let turnaround = self.turnaround_delay()?;
        debug!(train = %train.id, turnaround_minutes = turnaround.num_minutes(), "Turnaround");
        train.advance(time::after(arrival, turnaround)?);
        Ok(())
    }

    /// Emit station events for one leg and run the straggler model.
    ///
    /// A detached car is removed from the consist and from every station
    /// event at or after its set-out instant.
    fn run_leg(
        &mut self,
        train: &mut Train,
        corridor: &CorridorConfig,
        start: NaiveDateTime,
        duration: Duration,
        week: u32,
    ) -> Result<(), SimulationError> {
        let schedule = self.station_schedule(corridor, start, duration, train.loaded)?;

        let leg = Leg {
            train_id: train.id,
            cars: &train.cars,
            corridor,
            start,
            duration,
            loaded: train.loaded,
            high_straggler_week: self.seasonal.is_high_straggler(week),
        };
        let straggler = self.stragglers.run(&leg, &mut self.rng, &mut self.log)?;

        let full_consist = train.cars.clone();
        if let Some(straggler) = &straggler {
            self.stats.stragglers += 1;
            debug!(
                train = %train.id,
                car = %straggler.car,
                station = %straggler.station,
                at = %straggler.set_out_at,
                "Car set out"
            );
            train.detach(straggler.car);
        }

        for (event_type, at, location) in schedule {
            let cars = match &straggler {
                Some(s) if at >= s.set_out_at => &train.cars,
                _ => &full_consist,
            };
            self.log
                .emit(event_type, at, &location, cars, Some(train.id), train.loaded);
        }
        Ok(())
    }

    /// Arrive/depart times for each intermediate station of a leg.
    ///
    /// The leg is cut into `station_count + 1` equal segments; each station
    /// is reached at a segment boundary and left after a sampled dwell.
    fn station_schedule(
        &mut self,
        corridor: &CorridorConfig,
        start: NaiveDateTime,
        duration: Duration,
        loaded: bool,
    ) -> Result<Vec<(EventType, NaiveDateTime, LocationId)>, SimulationError> {
        let mut stations = corridor.stations();
        if !loaded {
            stations.reverse();
        }

        let segment_seconds = duration.num_seconds() / (stations.len() as i64 + 1);
        let mut schedule = Vec::with_capacity(stations.len() * 2);
        for (i, station) in stations.into_iter().enumerate() {
            let offset = Duration::seconds(segment_seconds * (i as i64 + 1));
            let arrive = time::after(start, offset)?;
            let dwell = time::hours(STATION_DWELL_HOURS.sample(&mut self.rng))?;
            let depart = time::after(arrive, dwell)?;
            schedule.push((EventType::ArriveStation, arrive, station.clone()));
            schedule.push((EventType::DepartStation, depart, station));
        }
        Ok(schedule)
    }

    /// Idle time at origin between an empty arrival and the next formation.
    ///
    /// Not surfaced as an event field: only visible as the gap before the
    /// next `FORM_TRAIN`.
    fn turnaround_delay(&mut self) -> Result<Duration, SimulationError> {
        if self.rng.gen::<f64>() < POWER_CONTINUITY_PROBABILITY {
            time::minutes(POWER_CONTINUITY_MINUTES.sample(&mut self.rng))
        } else {
            time::hours(POWER_CHANGE_HOURS.sample(&mut self.rng))
        }
    }
}
