//! Single motor unit record
//! Location: src/motor/unit.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use super::activation::fire_probability;

/// Stable handle of a unit within one simulated individual.
///
/// Handles are assigned once at pool initialization and travel with the unit
/// through every degeneration step, so units with identical sampled values
/// stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub usize);

impl UnitId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MU#{}", self.0)
    }
}

/// Amplitude, threshold and threshold deviation of one motor unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorUnit {
    /// Single motor unit potential (mV)
    pub amplitude: f64,
    /// Stimulus intensity at 50% firing probability (mA)
    pub threshold: f64,
    /// Steepness of the firing sigmoid (mA)
    pub threshold_deviation: f64,
}

impl MotorUnit {
    pub fn new(amplitude: f64, threshold: f64, threshold_deviation: f64) -> Self {
        Self {
            amplitude,
            threshold,
            threshold_deviation,
        }
    }

    /// Deviation derived from a relative spread: `threshold * spread`
    pub fn with_relative_spread(amplitude: f64, threshold: f64, relative_spread: f64) -> Self {
        Self::new(amplitude, threshold, threshold * relative_spread)
    }

    pub fn relative_spread(&self) -> f64 {
        self.threshold_deviation / self.threshold
    }

    pub fn fire_probability(&self, stimulus: f64) -> f64 {
        fire_probability(stimulus, self.threshold, self.threshold_deviation)
    }

    /// Same unit with extra amplitude from collateral sprouting
    pub fn reinnervated(self, gained_amplitude: f64) -> Self {
        Self {
            amplitude: self.amplitude + gained_amplitude,
            ..self
        }
    }
}
