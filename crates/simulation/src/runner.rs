//! Single-threaded discrete-event driver.

use crate::config::SimulationConfig;
use crate::lifecycle::Lifecycle;
use crate::time;
use crate::train::Train;
use crate::SimulationError;
use chrono::Duration;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use unitrain_types::{ClmEvent, TrainId};

/// Offset between the first scheduled attempts of consecutive trains.
pub const TRAIN_STAGGER: Duration = Duration::hours(6);

/// Counters collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    /// Phase-steps processed.
    pub steps: u64,

    /// Successful formations.
    pub trains_formed: u64,

    /// Trains that returned empty to origin.
    pub cycles_completed: u64,

    /// Formation attempts deferred for lack of cars or corridor.
    pub formation_retries: u64,

    /// Loading attempts deferred by an occupied slot.
    pub loading_retries: u64,

    /// Unloading attempts deferred by an occupied slot.
    pub unloading_retries: u64,

    /// Cars set out en route.
    pub stragglers: u64,

    /// Cars outside the free pool at the window end: held by a train,
    /// detached en route, or still returning to origin.
    pub cars_assigned_at_end: usize,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    /// Events sorted by timestamp, ties in emission order.
    pub events: Vec<ClmEvent>,
    pub stats: SimulationStats,
}

/// Drives a fleet of trains through the simulated window.
///
/// All randomness comes from one seeded generator, so a configuration and
/// seed always produce the same event log.
pub struct Generator<R = ChaCha8Rng> {
    config: SimulationConfig,
    rng: R,

    /// Seed of `rng`, when the generator created it.
    seed: Option<u64>,
}

impl Generator<ChaCha8Rng> {
    /// Create a generator seeded with `seed`.
    pub fn new(config: SimulationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }
}

impl<R: Rng> Generator<R> {
    /// Create a generator drawing from an existing random source.
    pub fn with_rng(config: SimulationConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            seed: None,
        }
    }

    /// Run the simulation to the end of the window.
    ///
    /// The driver repeatedly picks the train with the earliest `next_event`
    /// (lowest index on ties) and advances it one step, stopping once that
    /// earliest time lies past the window end. Events emitted by the final
    /// steps may be timestamped beyond the window and are kept.
    pub fn run(self) -> Result<SimulationOutput, SimulationError> {
        let Self { config, rng, seed } = self;
        config.validate()?;

        let start = time::parse_start_date(&config.window.start_date)?;
        let window = time::days(f64::from(config.window.duration_days))?;
        let end = time::after(start, window)?;

        info!(
            seed = ?seed,
            start = %start,
            end = %end,
            trains = config.trains.parallel_trains,
            cars = config.fleet.total_cars,
            "Starting simulation"
        );
        debug!(
            loading_concurrency = config.queues.loading_concurrency,
            unloading_concurrency = config.queues.unloading_concurrency,
            capacities = ?config
                .origins
                .iter()
                .chain(&config.destinations)
                .map(|l| (l.id.as_str(), l.queue_capacity))
                .collect::<Vec<_>>(),
            "Queue capacities are not enforced; one train per terminal"
        );

        let mut trains = (0..config.trains.parallel_trains)
            .map(|i| {
                let offset = i32::try_from(i)
                    .ok()
                    .and_then(|n| TRAIN_STAGGER.checked_mul(n))
                    .ok_or(SimulationError::TimeOutOfRange)?;
                Ok(Train::new(TrainId(i), time::after(start, offset)?))
            })
            .collect::<Result<Vec<_>, SimulationError>>()?;

        let mut lifecycle = Lifecycle::new(&config, rng);

        while let Some(train) = trains.iter_mut().min_by_key(|t| t.next_event) {
            if train.next_event > end {
                break;
            }
            lifecycle.step(train)?;
        }

        let (log, stats) = lifecycle.finish(end);
        let events = log.into_sorted();

        info!(
            events = events.len(),
            steps = stats.steps,
            cycles = stats.cycles_completed,
            stragglers = stats.stragglers,
            "Simulation complete"
        );

        Ok(SimulationOutput { events, stats })
    }
}

/// Run a simulation and return its sorted event log.
pub fn generate(config: SimulationConfig, seed: u64) -> Result<Vec<ClmEvent>, SimulationError> {
    Generator::new(config, seed).run().map(|output| output.events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, SampleRange};
    use tracing_test::traced_test;
    use unitrain_types::EventType;

    fn small_config() -> SimulationConfig {
        SimulationConfig::default()
            .with_window("2024-01-01", 14)
            .with_fleet_size(40)
            .with_trains(3, 10)
    }

    #[test]
    fn test_trains_are_staggered() {
        let output = Generator::new(small_config(), 42).run().unwrap();
        let forms: Vec<_> = output
            .events
            .iter()
            .filter(|e| e.event_type == EventType::FormTrain)
            .take(3)
            .map(|e| (e.train_id, e.timestamp))
            .collect();

        let start = time::parse_start_date("2024-01-01").unwrap();
        assert_eq!(
            forms,
            vec![
                (Some(TrainId(0)), start),
                (Some(TrainId(1)), start + Duration::hours(6)),
                (Some(TrainId(2)), start + Duration::hours(12)),
            ]
        );
    }

    #[test]
    fn test_zero_day_window_still_processes_first_step() {
        let config = small_config().with_window("2024-01-01", 0);
        let output = Generator::new(config, 1).run().unwrap();
        // Only train 0 is due at the window end itself.
        assert_eq!(output.stats.steps, 1);
        assert_eq!(output.events.len(), 1);
        assert_eq!(output.events[0].event_type, EventType::FormTrain);
    }

    #[test]
    fn test_invalid_config_rejected_before_run() {
        let config = small_config().with_trains(0, 10);
        assert!(matches!(
            Generator::new(config, 1).run(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_infinite_return_factor_rejected_before_run() {
        let mut config = small_config();
        config.corridors[0].empty_return_factor = f64::INFINITY;
        assert!(matches!(
            Generator::new(config, 1).run(),
            Err(SimulationError::InvalidConfig(ConfigError::NotFinite { .. }))
        ));
    }

    #[test]
    fn test_window_past_calendar_end_is_an_error() {
        let config = small_config().with_window("2024-01-01", u32::MAX);
        assert_eq!(config.validate(), Ok(()));
        assert!(matches!(
            Generator::new(config, 1).run(),
            Err(SimulationError::TimeOutOfRange)
        ));
    }

    #[test]
    fn test_unrepresentable_transit_is_an_error() {
        let mut config = small_config().with_window("2024-01-01", 30);
        for corridor in &mut config.corridors {
            corridor.transit_days = SampleRange::fixed(1e15);
        }
        assert_eq!(config.validate(), Ok(()));
        assert!(matches!(
            Generator::new(config, 1).run(),
            Err(SimulationError::TimeOutOfRange)
        ));
    }

    #[test]
    fn test_starved_fleet_produces_no_events() {
        let config = small_config().with_fleet_size(5);
        let output = Generator::new(config, 3).run().unwrap();
        assert!(output.events.is_empty());
        assert!(output.stats.formation_retries > 0);
        assert_eq!(output.stats.cars_assigned_at_end, 0);
    }

    #[test]
    fn test_generate_matches_generator() {
        let events = generate(small_config(), 9).unwrap();
        let output = Generator::new(small_config(), 9).run().unwrap();
        assert_eq!(events, output.events);
    }

    #[traced_test]
    #[test]
    fn test_run_logs_summary() {
        Generator::new(small_config(), 5).run().unwrap();
        assert!(logs_contain("Starting simulation"));
        assert!(logs_contain("Simulation complete"));
    }
}
