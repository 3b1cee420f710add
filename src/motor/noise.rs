//! Additive Gaussian noise on scan responses
//! Location: src/motor/noise.rs

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::error_context;

/// Normal(offset, std_dev) noise added to every scan sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    pub offset: f64,
    pub std_dev: f64,
}

impl NoiseModel {
    pub fn new(offset: f64, std_dev: f64) -> Self {
        Self { offset, std_dev }
    }

    /// Noise-free model
    pub fn silent() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn is_silent(&self) -> bool {
        self.offset == 0.0 && self.std_dev == 0.0
    }

    /// Draw one noise sample per stimulus
    pub fn sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> SimResult<Vec<f64>> {
        if !(self.std_dev.is_finite() && self.std_dev >= 0.0) {
            return Err(SimError::degenerate_distribution(
                "noise_std",
                format!("noise standard deviation {} must be non-negative", self.std_dev),
                error_context!("noise", "sample"),
            ));
        }
        let normal = Normal::new(self.offset, self.std_dev).map_err(|e| {
            SimError::degenerate_distribution(
                "noise_std",
                format!("Normal({}, {}): {}", self.offset, self.std_dev, e),
                error_context!("noise", "sample"),
            )
        })?;

        Ok((0..count).map(|_| normal.sample(rng)).collect())
    }
}
