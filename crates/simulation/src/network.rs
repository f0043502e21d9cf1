//! Indexed, read-only view of the configured rail network.

use crate::config::{CorridorConfig, LocationConfig, SimulationConfig};
use crate::SimulationError;
use indexmap::IndexMap;
use unitrain_types::{CorridorId, LocationId};

/// Terminals and corridors keyed by id, in configuration order.
///
/// Insertion order is preserved so that random selection by index is
/// reproducible for a given configuration.
#[derive(Debug, Clone)]
pub struct Network {
    origins: IndexMap<LocationId, LocationConfig>,
    destinations: IndexMap<LocationId, LocationConfig>,
    corridors: IndexMap<CorridorId, CorridorConfig>,
}

impl Network {
    /// Index the terminals and corridors of a configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            origins: config
                .origins
                .iter()
                .map(|o| (o.id.clone(), o.clone()))
                .collect(),
            destinations: config
                .destinations
                .iter()
                .map(|d| (d.id.clone(), d.clone()))
                .collect(),
            corridors: config
                .corridors
                .iter()
                .map(|c| (c.id.clone(), c.clone()))
                .collect(),
        }
    }

    /// Pick an origin uniformly at random.
    pub fn random_origin(&self, rng: &mut impl rand::Rng) -> Option<&LocationId> {
        random_key(&self.origins, rng)
    }

    /// Pick a destination uniformly at random.
    pub fn random_destination(&self, rng: &mut impl rand::Rng) -> Option<&LocationId> {
        random_key(&self.destinations, rng)
    }

    /// The first corridor linking `origin` to `destination`.
    pub fn corridor_between(
        &self,
        origin: &LocationId,
        destination: &LocationId,
    ) -> Option<&CorridorConfig> {
        self.corridors
            .values()
            .find(|c| &c.origin == origin && &c.destination == destination)
    }

    pub fn corridor(&self, id: &CorridorId) -> Result<&CorridorConfig, SimulationError> {
        self.corridors
            .get(id)
            .ok_or_else(|| SimulationError::UnknownCorridor(id.clone()))
    }

    pub fn origin(&self, id: &LocationId) -> Result<&LocationConfig, SimulationError> {
        self.origins
            .get(id)
            .ok_or_else(|| SimulationError::UnknownLocation(id.clone()))
    }

    pub fn destination(&self, id: &LocationId) -> Result<&LocationConfig, SimulationError> {
        self.destinations
            .get(id)
            .ok_or_else(|| SimulationError::UnknownLocation(id.clone()))
    }
}

fn random_key<'a, V>(
    map: &'a IndexMap<LocationId, V>,
    rng: &mut impl rand::Rng,
) -> Option<&'a LocationId> {
    if map.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..map.len());
    map.get_index(idx).map(|(k, _)| k)
}
