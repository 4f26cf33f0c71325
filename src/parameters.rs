//! Simulation parameters.
//!
//! Disease constants and world-generation settings are plain serde structs so a model can load
//! them from a JSON file. Every field has a default, so a file only needs to name the values it
//! changes:
//!
//! ```json
//! { "n_agents": 40, "seed": 7, "disease": { "mortality_rate": 0.02 } }
//! ```
//!
//! Parameters are handed to the [`World`](crate::world::World) at construction. There are no
//! process-wide settings, so independent simulations can run side by side.

use std::fs;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EpiError;

pub const DEFAULT_BASE_INFECTIOUSNESS: f64 = 0.05;
pub const DEFAULT_MORTALITY_RATE: f64 = 0.01;
pub const DEFAULT_DAYS_OF_IMMUNITY: u32 = 100;
pub const DEFAULT_CURE_THRESHOLD: f64 = 0.1;

/// Constants of the infection model shared by every agent and place in a world.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiseaseParameters {
    /// Scales the infectiousness of a contact before it is compared against the target's
    /// protection.
    pub base_infectiousness: f64,
    /// Per-step probability that an infected agent dies.
    pub mortality_rate: f64,
    /// Length of the window over which immunity builds after infection.
    pub days_of_immunity: u32,
    /// An infected agent is cured once its immunity exceeds this value.
    pub cure_threshold: f64,
}

impl Default for DiseaseParameters {
    fn default() -> Self {
        DiseaseParameters {
            base_infectiousness: DEFAULT_BASE_INFECTIOUSNESS,
            mortality_rate: DEFAULT_MORTALITY_RATE,
            days_of_immunity: DEFAULT_DAYS_OF_IMMUNITY,
            cure_threshold: DEFAULT_CURE_THRESHOLD,
        }
    }
}

impl DiseaseParameters {
    /// # Errors
    ///
    /// Returns [`EpiError::InvalidParameter`] if a rate lies outside `[0, 1]`, the
    /// infectiousness is negative, or `days_of_immunity` is zero.
    pub fn validate(&self) -> Result<(), EpiError> {
        if !self.base_infectiousness.is_finite() || self.base_infectiousness < 0.0 {
            return Err(EpiError::InvalidParameter(
                "base_infectiousness must be finite and >= 0".to_string(),
            ));
        }
        check_unit_interval("mortality_rate", self.mortality_rate)?;
        if self.days_of_immunity == 0 {
            return Err(EpiError::InvalidParameter(
                "days_of_immunity must be > 0".to_string(),
            ));
        }
        if !self.cure_threshold.is_finite() {
            return Err(EpiError::InvalidParameter(
                "cure_threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for [`World::randomized`](crate::world::World::randomized) plus the constants the
/// resulting world runs with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorldParameters {
    pub n_places: usize,
    pub n_agents: usize,
    /// Base seed for every random stream in the world.
    pub seed: u64,
    /// Random place capacities are drawn from this half-open range.
    pub capacity_range: Range<u32>,
    /// Each random place requests this many connections, counting edges other
    /// places already declared towards it.
    pub connections_range: Range<usize>,
    pub disease: DiseaseParameters,
}

impl Default for WorldParameters {
    fn default() -> Self {
        WorldParameters {
            n_places: 10,
            n_agents: 20,
            seed: 0,
            capacity_range: 2..10,
            connections_range: 1..3,
            disease: DiseaseParameters::default(),
        }
    }
}

impl WorldParameters {
    /// Reads parameters from a JSON file and validates them.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if the file can't be read, isn't valid JSON for these parameters,
    /// or fails [`validate`](Self::validate).
    pub fn from_json_file(path: &Path) -> Result<Self, EpiError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// # Errors
    ///
    /// Returns an `EpiError` if the string isn't valid JSON for these parameters or fails
    /// [`validate`](Self::validate).
    pub fn from_json_str(contents: &str) -> Result<Self, EpiError> {
        let parameters: WorldParameters = serde_json::from_str(contents)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// # Errors
    ///
    /// Returns [`EpiError::InvalidParameter`] for empty or zero-based ranges and for invalid
    /// disease constants.
    pub fn validate(&self) -> Result<(), EpiError> {
        if self.capacity_range.is_empty() || self.capacity_range.start == 0 {
            return Err(EpiError::InvalidParameter(format!(
                "capacity_range must be non-empty and start above zero, got {:?}",
                self.capacity_range
            )));
        }
        if self.connections_range.is_empty() {
            return Err(EpiError::InvalidParameter(format!(
                "connections_range must be non-empty, got {:?}",
                self.connections_range
            )));
        }
        self.disease.validate()
    }
}

pub(crate) fn check_unit_interval(name: &str, value: f64) -> Result<(), EpiError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EpiError::InvalidParameter(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}
