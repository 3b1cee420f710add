// src/export/sink.rs
//! Destinations for simulation artifacts
//!
//! The driver hands every artifact to an [`ArtifactSink`]. Sinks are shared
//! across worker threads, so implementations must be `Send + Sync`.

use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::error::SimResult;
use crate::motor::pool::MotorPool;
use crate::motor::scan::Scan;
use crate::simulation::condition::ExperimentCondition;
use crate::simulation::driver::ExperimentReport;
use crate::simulation::trajectory::{scan_basename, Trajectory};

/// Identifies the artifacts of one trajectory step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactKey {
    pub condition: ExperimentCondition,
    pub seed: u64,
    pub pool_size: usize,
}

impl ArtifactKey {
    pub fn new(condition: ExperimentCondition, seed: u64, pool_size: usize) -> Self {
        Self {
            condition,
            seed,
            pool_size,
        }
    }

    /// `{pool_size}-{seed}`
    pub fn basename(&self) -> String {
        scan_basename(self.pool_size, self.seed)
    }
}

/// Receives scans, ground truth, trajectories, batch indexes and the run report
pub trait ArtifactSink: Send + Sync {
    fn write_scan(&self, key: &ArtifactKey, scan: &Scan) -> SimResult<()>;

    fn write_ground_truth(&self, key: &ArtifactKey, pool: &MotorPool) -> SimResult<()>;

    fn write_trajectory(&self, _trajectory: &Trajectory) -> SimResult<()> {
        Ok(())
    }

    fn write_batch_index(&self, _condition: &ExperimentCondition, _basenames: &[String]) -> SimResult<()> {
        Ok(())
    }

    fn write_report(&self, _report: &ExperimentReport) -> SimResult<()> {
        Ok(())
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ArtifactSink for NullSink {
    fn write_scan(&self, _key: &ArtifactKey, _scan: &Scan) -> SimResult<()> {
        Ok(())
    }

    fn write_ground_truth(&self, _key: &ArtifactKey, _pool: &MotorPool) -> SimResult<()> {
        Ok(())
    }
}

/// Keeps artifacts in memory, keyed by `(condition label, basename)`
#[derive(Debug, Default)]
pub struct MemorySink {
    scans: Mutex<BTreeMap<(String, String), Scan>>,
    ground_truth: Mutex<BTreeMap<(String, String), MotorPool>>,
    trajectories: Mutex<Vec<Trajectory>>,
    batches: Mutex<BTreeMap<String, Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(&self, condition: &ExperimentCondition, basename: &str) -> Option<Scan> {
        self.scans
            .lock()
            .get(&(condition.to_string(), basename.to_string()))
            .cloned()
    }

    pub fn ground_truth(&self, condition: &ExperimentCondition, basename: &str) -> Option<MotorPool> {
        self.ground_truth
            .lock()
            .get(&(condition.to_string(), basename.to_string()))
            .cloned()
    }

    pub fn batch_index(&self, condition: &ExperimentCondition) -> Option<Vec<String>> {
        self.batches.lock().get(&condition.to_string()).cloned()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.lock().len()
    }

    pub fn ground_truth_count(&self) -> usize {
        self.ground_truth.lock().len()
    }

    /// Trajectories ordered by condition label, then seed
    pub fn trajectories(&self) -> Vec<Trajectory> {
        let mut trajectories = self.trajectories.lock().clone();
        trajectories.sort_by(|a, b| {
            a.condition
                .to_string()
                .cmp(&b.condition.to_string())
                .then(a.seed.cmp(&b.seed))
        });
        trajectories
    }
}

impl ArtifactSink for MemorySink {
    fn write_scan(&self, key: &ArtifactKey, scan: &Scan) -> SimResult<()> {
        self.scans
            .lock()
            .insert((key.condition.to_string(), key.basename()), scan.clone());
        Ok(())
    }

    fn write_ground_truth(&self, key: &ArtifactKey, pool: &MotorPool) -> SimResult<()> {
        self.ground_truth
            .lock()
            .insert((key.condition.to_string(), key.basename()), pool.clone());
        Ok(())
    }

    fn write_trajectory(&self, trajectory: &Trajectory) -> SimResult<()> {
        self.trajectories.lock().push(trajectory.clone());
        Ok(())
    }

    fn write_batch_index(&self, condition: &ExperimentCondition, basenames: &[String]) -> SimResult<()> {
        self.batches.lock().insert(condition.to_string(), basenames.to_vec());
        Ok(())
    }
}
