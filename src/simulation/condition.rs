// src/simulation/condition.rs
//! One cell of the experiment matrix

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::SimResult;
use crate::motor::degeneration::{DegenerationEngine, DenervationPolicy, ReinnervationPolicy};

/// Denervation policy, reinnervation policy and reinnervation strength
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentCondition {
    pub denervation: DenervationPolicy,
    pub reinnervation: ReinnervationPolicy,
    pub reinnervation_strength: f64,
}

impl ExperimentCondition {
    pub fn new(
        denervation: DenervationPolicy,
        reinnervation: ReinnervationPolicy,
        reinnervation_strength: f64,
    ) -> Self {
        Self {
            denervation,
            reinnervation,
            reinnervation_strength,
        }
    }

    /// Relative directory `de-{d}/re-{r}/str-{s}` for this condition's artifacts
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(format!("de-{}", self.denervation))
            .join(format!("re-{}", self.reinnervation))
            .join(format!("str-{:?}", self.reinnervation_strength))
    }

    /// Engine applying this condition
    pub fn engine(&self, denervation_fraction: f64) -> SimResult<DegenerationEngine> {
        DegenerationEngine::new(
            self.denervation,
            self.reinnervation,
            self.reinnervation_strength,
            denervation_fraction,
        )
    }
}

impl fmt::Display for ExperimentCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "de-{}/re-{}/str-{:?}",
            self.denervation, self.reinnervation, self.reinnervation_strength
        )
    }
}
