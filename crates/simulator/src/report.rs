//! Run summary and cycle-time percentiles.

use hdrhistogram::{CreationError, Histogram};
use std::collections::HashMap;
use std::fmt;
use unitrain_simulation::{SimulationOutput, SimulationStats};
use unitrain_types::{ClmEvent, EventType, TrainId};

/// Summary of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Seed the run was generated with.
    pub seed: u64,

    /// Events emitted, per type, in tag order.
    pub event_counts: Vec<(EventType, usize)>,

    /// Per-car rows the log expands to.
    pub car_rows: usize,

    pub stats: SimulationStats,

    /// FORM_TRAIN to ARRIVE_ORIGIN, in minutes, per completed cycle.
    cycle_minutes: Histogram<u64>,
}

impl SimulationReport {
    /// Summarize a finished run.
    pub fn from_output(output: &SimulationOutput, seed: u64) -> Result<Self, CreationError> {
        let mut counts: HashMap<EventType, usize> = HashMap::new();
        for event in &output.events {
            *counts.entry(event.event_type).or_default() += 1;
        }
        let event_counts = EventType::ALL
            .iter()
            .map(|t| (*t, counts.get(t).copied().unwrap_or(0)))
            .collect();

        let car_rows = output.events.iter().map(ClmEvent::car_count).sum();

        Ok(Self {
            seed,
            event_counts,
            car_rows,
            stats: output.stats.clone(),
            cycle_minutes: cycle_histogram(&output.events)?,
        })
    }

    /// Total number of events.
    pub fn total_events(&self) -> usize {
        self.event_counts.iter().map(|(_, n)| n).sum()
    }

    /// Number of events of one type.
    pub fn count(&self, event_type: EventType) -> usize {
        self.event_counts
            .iter()
            .find(|(t, _)| *t == event_type)
            .map_or(0, |(_, n)| *n)
    }

    /// Completed cycles recorded in the histogram.
    pub fn cycles(&self) -> u64 {
        self.cycle_minutes.len()
    }

    /// Cycle time at `quantile` (0.0–1.0) in minutes, if any cycle completed.
    pub fn cycle_minutes_at(&self, quantile: f64) -> Option<u64> {
        (!self.cycle_minutes.is_empty()).then(|| self.cycle_minutes.value_at_quantile(quantile))
    }

    pub fn p50_cycle_minutes(&self) -> Option<u64> {
        self.cycle_minutes_at(0.50)
    }

    pub fn p90_cycle_minutes(&self) -> Option<u64> {
        self.cycle_minutes_at(0.90)
    }

    pub fn p99_cycle_minutes(&self) -> Option<u64> {
        self.cycle_minutes_at(0.99)
    }

    pub fn max_cycle_minutes(&self) -> Option<u64> {
        (!self.cycle_minutes.is_empty()).then(|| self.cycle_minutes.max())
    }
}

/// Record the duration of every cycle that returned to origin.
///
/// The histogram is sized to the longest cycle so no value is clamped.
fn cycle_histogram(events: &[ClmEvent]) -> Result<Histogram<u64>, CreationError> {
    let mut formed: HashMap<TrainId, _> = HashMap::new();
    let mut cycles = Vec::new();

    for event in events {
        let Some(train) = event.train_id else { continue };
        match event.event_type {
            EventType::FormTrain => {
                formed.insert(train, event.timestamp);
            }
            EventType::ArriveOrigin => {
                if let Some(start) = formed.remove(&train) {
                    cycles.push((event.timestamp - start).num_minutes().max(0) as u64);
                }
            }
            _ => {}
        }
    }

    let highest = cycles.iter().copied().max().unwrap_or(0).max(2);
    let mut histogram = Histogram::<u64>::new_with_bounds(1, highest, 3)?;
    for minutes in cycles {
        histogram.saturating_record(minutes);
    }
    Ok(histogram)
}

fn hours(minutes: Option<u64>) -> String {
    minutes.map_or_else(|| "-".to_string(), |m| format!("{:.1}h", m as f64 / 60.0))
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Simulation Report (seed {}) ===", self.seed)?;
        writeln!(f, "Events: {} ({} car rows)", self.total_events(), self.car_rows)?;
        for (event_type, count) in &self.event_counts {
            if *count > 0 {
                writeln!(f, "  {:<20} {:>8}", event_type.as_str(), count)?;
            }
        }

        let s = &self.stats;
        writeln!(f, "Steps:              {}", s.steps)?;
        writeln!(f, "Trains formed:      {}", s.trains_formed)?;
        writeln!(f, "Cycles completed:   {}", s.cycles_completed)?;
        writeln!(
            f,
            "Retries:            formation {}, loading {}, unloading {}",
            s.formation_retries, s.loading_retries, s.unloading_retries
        )?;
        writeln!(f, "Stragglers:         {}", s.stragglers)?;
        writeln!(f, "Cars assigned:      {}", s.cars_assigned_at_end)?;
        writeln!(
            f,
            "Cycle time:         p50 {}, p90 {}, p99 {}, max {}",
            hours(self.p50_cycle_minutes()),
            hours(self.p90_cycle_minutes()),
            hours(self.p99_cycle_minutes()),
            hours(self.max_cycle_minutes()),
        )
    }
}
