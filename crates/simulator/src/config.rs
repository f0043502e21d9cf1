//! Loading simulation configuration from TOML.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use unitrain_simulation::{SimulationConfig, SimulationError};

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Parse a configuration from TOML text.
///
/// Missing sections and fields take their default values. The result is
/// validated before it is returned.
pub fn parse_config(text: &str) -> Result<SimulationConfig, LoadError> {
    let config: SimulationConfig = toml::from_str(text)?;
    config.validate().map_err(SimulationError::from)?;
    Ok(config)
}

/// Read and parse a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<SimulationConfig, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text)?;

    info!(
        path = %path.display(),
        origins = config.origins.len(),
        destinations = config.destinations.len(),
        corridors = config.corridors.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// The default configuration rendered as TOML.
pub fn default_config_toml() -> Result<String, LoadError> {
    Ok(toml::to_string_pretty(&SimulationConfig::default())?)
}
