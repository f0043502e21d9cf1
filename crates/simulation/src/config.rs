//! Configuration types for a simulation run.
//!
//! Every aggregate here is a plain input value owned by the caller; the
//! engine only reads it. Sections carry serde defaults so a partial
//! configuration file fills in from [`SimulationConfig::default`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unitrain_types::{CorridorId, LocationId};

/// Inclusive `[min, max]` range sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleRange {
    pub min: f64,
    pub max: f64,
}

/// A [`SampleRange`] measured in hours.
pub type HourRange = SampleRange;

/// A [`SampleRange`] measured in days.
pub type DayRange = SampleRange;

impl SampleRange {
    /// Create a new range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A degenerate range that always samples `value`.
    pub const fn fixed(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Draw a value uniformly from the range.
    ///
    /// Always consumes exactly one draw from `rng`, even for a degenerate
    /// range, so the random stream does not depend on the configured bounds.
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        let u: f64 = rng.gen();
        self.min + u * (self.max - self.min)
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }
}

/// Car fleet shared by all trains.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Total number of cars in the pool.
    pub total_cars: u32,

    /// Car type, e.g. "hopper".
    pub car_type: String,

    /// Commodity carried when loaded.
    pub commodity: String,

    /// Lading capacity per car, in tons.
    pub capacity_tons: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            total_cars: 600,
            car_type: "hopper".to_string(),
            commodity: "coal".to_string(),
            capacity_tons: 115.0,
        }
    }
}

/// An origin or destination terminal.
///
/// For origins `handling_hours` is the loading duration; for destinations it
/// is the unloading duration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocationConfig {
    pub id: LocationId,

    #[serde(default)]
    pub name: String,

    pub handling_hours: HourRange,

    /// Concurrent trains the terminal can serve. Accepted but not enforced:
    /// every terminal serves one train at a time.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: u32,
}

fn default_queue_capacity() -> u32 {
    1
}

/// An origin/destination pairing with its transit characteristics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorridorConfig {
    pub id: CorridorId,
    pub origin: LocationId,
    pub destination: LocationId,

    /// Loaded transit time.
    pub transit_days: DayRange,

    /// Intermediate stations between origin and destination.
    #[serde(default)]
    pub station_count: u32,

    #[serde(default)]
    pub distance_miles: f64,

    /// Multiplier applied to loaded transit time for the empty return.
    #[serde(default = "default_empty_return_factor")]
    pub empty_return_factor: f64,
}

fn default_empty_return_factor() -> f64 {
    0.8
}

impl CorridorConfig {
    /// Location ids of the intermediate stations, origin side first.
    pub fn stations(&self) -> Vec<LocationId> {
        (1..=self.station_count).map(|n| self.id.station(n)).collect()
    }
}

/// Train composition.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Cars allocated to each train at formation.
    pub cars_per_train: u32,

    /// Number of trains cycling in parallel.
    pub parallel_trains: u32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            cars_per_train: 110,
            parallel_trains: 4,
        }
    }
}

/// Per-queue-type concurrency. Accepted but not enforced.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub loading_concurrency: u32,
    pub unloading_concurrency: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            loading_concurrency: 1,
            unloading_concurrency: 1,
        }
    }
}

/// Detached-car (straggler) parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StragglerConfig {
    /// Expected stragglers per train per transit day.
    pub rate_per_train_per_day: f64,

    /// Delay before a set-out car is picked up again.
    pub min_delay_hours: f64,
    pub max_delay_hours: f64,
}

impl Default for StragglerConfig {
    fn default() -> Self {
        Self {
            rate_per_train_per_day: 0.02,
            min_delay_hours: 24.0,
            max_delay_hours: 72.0,
        }
    }
}

impl StragglerConfig {
    /// Set-out to pickup delay range.
    pub fn delay_hours(&self) -> HourRange {
        SampleRange::new(self.min_delay_hours, self.max_delay_hours)
    }
}

/// Seasonal markers, as ISO week numbers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalConfig {
    /// Week during which `slow_corridor` runs slower.
    pub slow_week: Option<u32>,

    pub slow_corridor: Option<CorridorId>,

    /// Transit-time multiplier during the slow week.
    pub slowdown_factor: f64,

    /// Week during which straggler rates double.
    pub high_straggler_week: Option<u32>,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            slow_week: None,
            slow_corridor: None,
            slowdown_factor: 1.25,
            high_straggler_week: None,
        }
    }
}

impl SeasonalConfig {
    /// Whether a leg on `corridor` departing in `week` is slowed.
    pub fn is_slow(&self, week: u32, corridor: &CorridorId) -> bool {
        self.slow_week == Some(week) && self.slow_corridor.as_ref() == Some(corridor)
    }

    /// Whether `week` is a high-straggler week.
    pub fn is_high_straggler(&self, week: u32) -> bool {
        self.high_straggler_week == Some(week)
    }
}

/// Simulated time window.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// First simulated day, `YYYY-MM-DD`.
    pub start_date: String,

    pub duration_days: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start_date: "2024-01-01".to_string(),
            duration_days: 30,
        }
    }
}

/// Configuration for a simulation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub fleet: FleetConfig,
    pub origins: Vec<LocationConfig>,
    pub destinations: Vec<LocationConfig>,
    pub corridors: Vec<CorridorConfig>,
    pub trains: TrainConfig,
    pub queues: QueueConfig,
    pub stragglers: StragglerConfig,
    pub seasonal: SeasonalConfig,
    pub window: WindowConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let origin = LocationId::new("MINE-A");
        let destination = LocationId::new("PLANT-X");
        Self {
            fleet: FleetConfig::default(),
            origins: vec![LocationConfig {
                id: origin.clone(),
                name: "Black Thunder Mine".to_string(),
                handling_hours: SampleRange::new(8.0, 12.0),
                queue_capacity: 1,
            }],
            destinations: vec![LocationConfig {
                id: destination.clone(),
                name: "Sherco Generating Plant".to_string(),
                handling_hours: SampleRange::new(6.0, 10.0),
                queue_capacity: 1,
            }],
            corridors: vec![CorridorConfig {
                id: CorridorId::new("MINE-A_PLANT-X"),
                origin,
                destination,
                transit_days: SampleRange::new(3.0, 5.0),
                station_count: 3,
                distance_miles: 950.0,
                empty_return_factor: 0.8,
            }],
            trains: TrainConfig::default(),
            queues: QueueConfig::default(),
            stragglers: StragglerConfig::default(),
            seasonal: SeasonalConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Set the simulated window.
    pub fn with_window(mut self, start_date: impl Into<String>, duration_days: u32) -> Self {
        self.window = WindowConfig {
            start_date: start_date.into(),
            duration_days,
        };
        self
    }

    /// Set the train composition.
    pub fn with_trains(mut self, parallel_trains: u32, cars_per_train: u32) -> Self {
        self.trains = TrainConfig {
            cars_per_train,
            parallel_trains,
        };
        self
    }

    /// Set the total number of cars in the fleet.
    pub fn with_fleet_size(mut self, total_cars: u32) -> Self {
        self.fleet.total_cars = total_cars;
        self
    }

    /// Set the straggler rate per train per transit day.
    pub fn with_straggler_rate(mut self, rate_per_train_per_day: f64) -> Self {
        self.stragglers.rate_per_train_per_day = rate_per_train_per_day;
        self
    }

    /// Replace the terminals and corridors.
    pub fn with_network(
        mut self,
        origins: Vec<LocationConfig>,
        destinations: Vec<LocationConfig>,
        corridors: Vec<CorridorConfig>,
    ) -> Self {
        self.origins = origins;
        self.destinations = destinations;
        self.corridors = corridors;
        self
    }

    /// Set the seasonal markers.
    pub fn with_seasonal(mut self, seasonal: SeasonalConfig) -> Self {
        self.seasonal = seasonal;
        self
    }

    /// Check that the configuration can describe a simulation.
    ///
    /// Under-provisioned fleets and queues pass: they stall trains at run
    /// time instead of failing. Corridor references are not cross-checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.origins.is_empty() {
            return Err(ConfigError::Empty("origins"));
        }
        if self.destinations.is_empty() {
            return Err(ConfigError::Empty("destinations"));
        }
        if self.corridors.is_empty() {
            return Err(ConfigError::Empty("corridors"));
        }
        if self.trains.cars_per_train == 0 {
            return Err(ConfigError::Zero("trains.cars_per_train"));
        }
        if self.trains.parallel_trains == 0 {
            return Err(ConfigError::Zero("trains.parallel_trains"));
        }

        for location in self.origins.iter().chain(&self.destinations) {
            if !location.handling_hours.is_valid() {
                return Err(ConfigError::InvalidRange {
                    field: format!("{}.handling_hours", location.id),
                    min: location.handling_hours.min,
                    max: location.handling_hours.max,
                });
            }
        }

        for corridor in &self.corridors {
            if !corridor.transit_days.is_valid() {
                return Err(ConfigError::InvalidRange {
                    field: format!("{}.transit_days", corridor.id),
                    min: corridor.transit_days.min,
                    max: corridor.transit_days.max,
                });
            }
            positive_factor(
                format!("{}.empty_return_factor", corridor.id),
                corridor.empty_return_factor,
            )?;
        }

        let delay = self.stragglers.delay_hours();
        if !delay.is_valid() {
            return Err(ConfigError::InvalidRange {
                field: "stragglers.delay_hours".to_string(),
                min: delay.min,
                max: delay.max,
            });
        }
        if !self.stragglers.rate_per_train_per_day.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "stragglers.rate_per_train_per_day".to_string(),
                value: self.stragglers.rate_per_train_per_day,
            });
        }
        if !(self.stragglers.rate_per_train_per_day >= 0.0) {
            return Err(ConfigError::NotPositive {
                field: "stragglers.rate_per_train_per_day".to_string(),
                value: self.stragglers.rate_per_train_per_day,
            });
        }
        positive_factor(
            "seasonal.slowdown_factor".to_string(),
            self.seasonal.slowdown_factor,
        )?;

        Ok(())
    }
}

fn positive_factor(field: String, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field, value });
    }
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

/// Reasons a configuration cannot describe a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("No {0} configured")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Invalid range for {field}: [{min}, {max}]")]
    InvalidRange { field: String, min: f64, max: f64 },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: String, value: f64 },

    #[error("{field} must be finite, got {value}")]
    NotFinite { field: String, value: f64 },
}
