// src/simulation/trajectory.rs
//! Per-individual summary of a degeneration run

use serde::{Deserialize, Serialize};

use super::condition::ExperimentCondition;
use crate::motor::pool::MotorPool;
use crate::motor::scan::Scan;

/// Observation made before one degeneration step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub pool_size: usize,
    /// Largest scan response, the observed CMAP maximum
    pub max_response: f64,
    /// Summed amplitude of the pool, the noiseless CMAP maximum
    pub total_amplitude: f64,
}

impl TrajectoryPoint {
    pub fn observe(pool: &MotorPool, scan: &Scan) -> Self {
        Self {
            pool_size: pool.len(),
            // grids always hold at least two stimuli
            max_response: scan.max_response().unwrap_or(0.0),
            total_amplitude: pool.total_amplitude(),
        }
    }
}

/// Points of one seed under one condition, in step order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub condition: ExperimentCondition,
    pub seed: u64,
    pub points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new(condition: ExperimentCondition, seed: u64) -> Self {
        Self {
            condition,
            seed,
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, point: TrajectoryPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn pool_sizes(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.pool_size).collect()
    }

    pub fn max_responses(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.max_response).collect()
    }

    /// Scan basenames `{pool_size}-{seed}` in step order
    pub fn scan_basenames(&self) -> Vec<String> {
        self.points
            .iter()
            .map(|p| scan_basename(p.pool_size, self.seed))
            .collect()
    }
}

/// File stem shared by the scan and batch index entries
pub fn scan_basename(pool_size: usize, seed: u64) -> String {
    format!("{}-{}", pool_size, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::degeneration::{DenervationPolicy, ReinnervationPolicy};
    use crate::motor::unit::MotorUnit;

    #[test]
    fn test_observe_point() {
        let pool = MotorPool::from_units([MotorUnit::new(0.03, 10.0, 0.1), MotorUnit::new(0.05, 11.0, 0.1)]);
        let scan = Scan::new(vec![1.0, 2.0, 3.0], vec![0.0, 0.081, 0.079]).unwrap();
        let point = TrajectoryPoint::observe(&pool, &scan);

        assert_eq!(point.pool_size, 2);
        assert_eq!(point.max_response, 0.081);
        assert!((point.total_amplitude - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_basenames_follow_steps() {
        let condition = ExperimentCondition::new(DenervationPolicy::Random, ReinnervationPolicy::None, 0.2);
        let mut trajectory = Trajectory::new(condition, 3);
        for size in [160, 80, 40] {
            trajectory.push(TrajectoryPoint {
                pool_size: size,
                max_response: 1.0,
                total_amplitude: 1.0,
            });
        }
        assert_eq!(trajectory.pool_sizes(), vec![160, 80, 40]);
        assert_eq!(trajectory.scan_basenames(), vec!["160-3", "80-3", "40-3"]);
    }
}
