//! Car pool management.
//!
//! Provides a `CarPool` that owns every car id in the fleet and tracks which
//! ones are currently assigned to a train. A car is either in the assigned
//! set or free, never both, and the pool never hands the same car to two
//! trains at once.

use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::info;
use unitrain_types::CarId;

/// Pool of rail cars shared by all trains.
#[derive(Debug, Clone)]
pub struct CarPool {
    /// Every car in the fleet, in allocation (shuffle) order.
    cars: Vec<CarId>,

    /// Cars currently held by a train or detached en route.
    assigned: HashSet<CarId>,
}

impl CarPool {
    /// Create a pool of `total_cars` cars in shuffled allocation order.
    pub fn shuffled(total_cars: u32, rng: &mut impl rand::Rng) -> Self {
        let mut cars: Vec<CarId> = (0..total_cars).map(CarId).collect();
        cars.shuffle(rng);

        info!(total_cars, "Created car pool");

        Self::from_order(cars)
    }

    /// Create a pool that allocates cars in exactly the given order.
    pub fn from_order(cars: Vec<CarId>) -> Self {
        Self {
            cars,
            assigned: HashSet::new(),
        }
    }

    /// Allocate `count` free cars, taking the earliest in allocation order.
    ///
    /// Returns `None` without side effects if fewer than `count` are free.
    pub fn allocate(&mut self, count: usize) -> Option<Vec<CarId>> {
        if self.available() < count {
            return None;
        }

        let block: Vec<CarId> = self
            .cars
            .iter()
            .copied()
            .filter(|car| !self.assigned.contains(car))
            .take(count)
            .collect();

        self.assigned.extend(block.iter().copied());
        Some(block)
    }

    /// Return cars to the pool, making them eligible for any train.
    pub fn release(&mut self, cars: &[CarId]) {
        for car in cars {
            self.assigned.remove(car);
        }
    }

    /// Whether a car is currently assigned.
    pub fn is_assigned(&self, car: CarId) -> bool {
        self.assigned.contains(&car)
    }

    /// Number of free cars.
    pub fn available(&self) -> usize {
        self.cars.len() - self.assigned.len()
    }

    /// Number of assigned cars.
    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }

    /// Total cars in the fleet.
    pub fn total_cars(&self) -> usize {
        self.cars.len()
    }
}
