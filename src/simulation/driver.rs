// src/simulation/driver.rs
//! Simulation driver
//!
//! Runs one trajectory per (condition, seed): initialize a pool from the
//! seed, then scan and degenerate until the pool falls below the minimum
//! viable size. Trajectories are independent and run on the rayon pool;
//! steps within a trajectory are sequential.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::condition::ExperimentCondition;
use super::trajectory::{Trajectory, TrajectoryPoint};
use crate::config::{ConfigSummary, SimulationConfig};
use crate::error::{SimError, SimResult};
use crate::export::sink::{ArtifactKey, ArtifactSink};
use crate::motor::pool::{MotorPool, PoolParameters};
use crate::motor::scan::ScanGenerator;

/// Outcome of one trajectory
#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryReport {
    pub trajectory: Trajectory,
    /// Basenames of scans that were written, in step order
    pub scan_files: Vec<String>,
    /// Per-artifact export failures; the trajectory kept running
    #[serde(serialize_with = "error_list")]
    pub export_errors: Vec<SimError>,
    /// Core failure that ended the trajectory early
    #[serde(serialize_with = "optional_error")]
    pub failure: Option<SimError>,
}

impl TrajectoryReport {
    fn new(condition: ExperimentCondition, seed: u64) -> Self {
        Self {
            trajectory: Trajectory::new(condition, seed),
            scan_files: Vec::new(),
            export_errors: Vec::new(),
            failure: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.trajectory.seed
    }

    pub fn condition(&self) -> &ExperimentCondition {
        &self.trajectory.condition
    }

    /// Ran to termination without a core failure
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    fn record_export(&mut self, result: SimResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    condition = %self.trajectory.condition,
                    seed = self.trajectory.seed,
                    error = %e,
                    "artifact export failed"
                );
                self.export_errors.push(e);
                false
            }
        }
    }
}

/// All trajectories of one condition plus its batch index
#[derive(Debug, Clone, Serialize)]
pub struct ConditionReport {
    pub condition: ExperimentCondition,
    /// Seed order, then step order
    pub batch_index: Vec<String>,
    #[serde(serialize_with = "optional_error")]
    pub batch_error: Option<SimError>,
    pub trajectories: Vec<TrajectoryReport>,
}

/// Summary of a full experiment run
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub version: String,
    pub summary: ConfigSummary,
    pub conditions: Vec<ConditionReport>,
}

impl ExperimentReport {
    pub fn trajectories(&self) -> impl Iterator<Item = &TrajectoryReport> + '_ {
        self.conditions.iter().flat_map(|c| c.trajectories.iter())
    }

    pub fn trajectory_count(&self) -> usize {
        self.trajectories().count()
    }

    pub fn failed_trajectories(&self) -> usize {
        self.trajectories().filter(|t| !t.is_complete()).count()
    }

    pub fn export_error_count(&self) -> usize {
        self.trajectories().map(|t| t.export_errors.len()).sum::<usize>()
            + self.conditions.iter().filter(|c| c.batch_error.is_some()).count()
    }
}

fn error_list<S: Serializer>(errors: &[SimError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}

fn optional_error<S: Serializer>(error: &Option<SimError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

struct Progress {
    completed: AtomicUsize,
    total: usize,
}

impl Progress {
    fn tick(&self, report: &TrajectoryReport) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            completed = done,
            total = self.total,
            condition = %report.condition(),
            seed = report.seed(),
            steps = report.trajectory.len(),
            "trajectory finished"
        );
    }
}

/// Runs the experiment matrix described by one configuration
#[derive(Debug, Clone)]
pub struct SimulationDriver {
    config: SimulationConfig,
    pool_parameters: PoolParameters,
    scanner: ScanGenerator,
}

impl SimulationDriver {
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        config
            .validate_consistency()
            .map_err(|errors| SimError::configuration("driver", errors.join("; ")))?;

        Ok(Self {
            pool_parameters: config.pool.parameters(),
            scanner: ScanGenerator::new(config.scan.grid(), config.scan.noise()),
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn scanner(&self) -> &ScanGenerator {
        &self.scanner
    }

    /// Initial pool for `seed`, as the first step of its trajectory sees it
    pub fn initial_pool(&self, seed: u64) -> SimResult<MotorPool> {
        MotorPool::initialize(&self.pool_parameters, &mut StdRng::seed_from_u64(seed))
    }

    /// Run one trajectory; core errors end it and are recorded in the report
    pub fn run_trajectory(
        &self,
        condition: ExperimentCondition,
        seed: u64,
        sink: &dyn ArtifactSink,
    ) -> TrajectoryReport {
        let mut report = TrajectoryReport::new(condition, seed);

        if let Err(e) = self.simulate(&mut report, sink) {
            warn!(condition = %condition, seed, error = %e, "trajectory failed");
            report.failure = Some(e);
        }

        let exported = sink.write_trajectory(&report.trajectory);
        report.record_export(exported);
        report
    }

    fn simulate(&self, report: &mut TrajectoryReport, sink: &dyn ArtifactSink) -> SimResult<()> {
        let condition = report.trajectory.condition;
        let seed = report.trajectory.seed;
        let engine = condition.engine(self.config.experiment.denervation_fraction)?;
        let min_viable = self.config.experiment.min_viable_pool;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut pool = MotorPool::initialize(&self.pool_parameters, &mut rng)?;

        while pool.len() >= min_viable {
            let scan = self.scanner.scan(&pool, &mut rng)?;
            let point = TrajectoryPoint::observe(&pool, &scan);
            report.trajectory.push(point);

            let key = ArtifactKey::new(condition, seed, pool.len());
            if report.record_export(sink.write_scan(&key, &scan)) {
                report.scan_files.push(key.basename());
            }
            report.record_export(sink.write_ground_truth(&key, &pool));

            debug!(
                condition = %condition,
                seed,
                pool_size = point.pool_size,
                max_response = point.max_response,
                total_amplitude = point.total_amplitude,
                "scanned pool"
            );

            pool = engine.step(&pool, &mut rng)?.survivors;
        }

        Ok(())
    }

    /// Run every seed of one condition and write its batch index
    pub fn run_condition(&self, condition: ExperimentCondition, sink: &dyn ArtifactSink) -> ConditionReport {
        let progress = Progress {
            completed: AtomicUsize::new(0),
            total: self.config.experiment.seeds.len(),
        };
        self.run_condition_with(condition, sink, &progress)
    }

    fn run_condition_with(
        &self,
        condition: ExperimentCondition,
        sink: &dyn ArtifactSink,
        progress: &Progress,
    ) -> ConditionReport {
        let mut trajectories: Vec<TrajectoryReport> = self
            .config
            .experiment
            .seeds
            .par_iter()
            .map(|&seed| {
                let report = self.run_trajectory(condition, seed, sink);
                progress.tick(&report);
                report
            })
            .collect();
        trajectories.sort_by_key(|t| t.seed());

        let batch_index: Vec<String> = trajectories
            .iter()
            .flat_map(|t| t.scan_files.iter().cloned())
            .collect();

        let batch_error = sink.write_batch_index(&condition, &batch_index).err();
        if let Some(e) = &batch_error {
            warn!(condition = %condition, error = %e, "batch index export failed");
        }

        info!(
            condition = %condition,
            scans = batch_index.len(),
            failed = trajectories.iter().filter(|t| !t.is_complete()).count(),
            "condition finished"
        );

        ConditionReport {
            condition,
            batch_index,
            batch_error,
            trajectories,
        }
    }

    /// Run the whole matrix, on `worker_threads` threads when configured
    pub fn run(&self, sink: &dyn ArtifactSink) -> SimResult<ExperimentReport> {
        match self.config.experiment.worker_threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| SimError::configuration("driver", e.to_string()))?;
                Ok(pool.install(|| self.run_all(sink)))
            }
            None => Ok(self.run_all(sink)),
        }
    }

    fn run_all(&self, sink: &dyn ArtifactSink) -> ExperimentReport {
        let started = Instant::now();
        let conditions = self.config.conditions();
        let summary = self.config.get_summary();
        let progress = Progress {
            completed: AtomicUsize::new(0),
            total: conditions.len() * self.config.experiment.seeds.len(),
        };

        info!(
            conditions = summary.condition_count,
            seeds = summary.seed_count,
            units = summary.unit_count,
            threads = rayon::current_num_threads(),
            "starting simulation"
        );

        let conditions: Vec<ConditionReport> = conditions
            .par_iter()
            .map(|&condition| self.run_condition_with(condition, sink, &progress))
            .collect();

        let report = ExperimentReport {
            version: crate::VERSION.to_string(),
            summary,
            conditions,
        };

        if let Err(e) = sink.write_report(&report) {
            warn!(error = %e, "run report export failed");
        }

        info!(
            trajectories = report.trajectory_count(),
            failed = report.failed_trajectories(),
            export_errors = report.export_error_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "simulation finished"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sink::{MemorySink, NullSink};
    use crate::motor::degeneration::{DenervationPolicy, ReinnervationPolicy};

    fn small_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.experiment.seeds = vec![1, 2];
        config.experiment.denervation_policies = vec![DenervationPolicy::Random];
        config.experiment.reinnervation_policies = vec![ReinnervationPolicy::Distributive, ReinnervationPolicy::None];
        config.experiment.reinnervation_strengths = vec![0.2];
        config.pool.unit_count = 40;
        config.scan.points = 50;
        config.scan.flanks = 5;
        config
    }

    #[test]
    fn test_trajectory_terminates_below_viable_size() {
        let driver = SimulationDriver::new(small_config()).unwrap();
        let condition = ExperimentCondition::new(DenervationPolicy::Random, ReinnervationPolicy::None, 0.2);
        let report = driver.run_trajectory(condition, 1, &NullSink);

        assert!(report.is_complete());
        assert_eq!(report.trajectory.pool_sizes(), vec![40, 20, 10, 5]);
        assert_eq!(report.scan_files, vec!["40-1", "20-1", "10-1", "5-1"]);
    }

    #[test]
    fn test_none_reinnervation_never_grows_pool() {
        let driver = SimulationDriver::new(small_config()).unwrap();
        let condition = ExperimentCondition::new(DenervationPolicy::Selective, ReinnervationPolicy::None, 0.2);
        let report = driver.run_trajectory(condition, 2, &NullSink);

        let totals: Vec<f64> = report.trajectory.points.iter().map(|p| p.total_amplitude).collect();
        assert!(totals.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_run_collects_batch_index_in_seed_order() {
        let driver = SimulationDriver::new(small_config()).unwrap();
        let sink = MemorySink::new();
        let report = driver.run(&sink).unwrap();

        assert_eq!(report.conditions.len(), 2);
        assert_eq!(report.trajectory_count(), 4);
        assert_eq!(report.failed_trajectories(), 0);
        for condition in &report.conditions {
            assert_eq!(
                condition.batch_index,
                vec!["40-1", "20-1", "10-1", "5-1", "40-2", "20-2", "10-2", "5-2"]
            );
            assert_eq!(sink.batch_index(&condition.condition), Some(condition.batch_index.clone()));
        }
        assert_eq!(sink.scan_count(), 16);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config();
        config.experiment.seeds.clear();
        assert!(matches!(
            SimulationDriver::new(config),
            Err(SimError::Configuration { .. })
        ));
    }

    #[test]
    fn test_report_serializes_errors_as_text() {
        let mut report = TrajectoryReport::new(
            ExperimentCondition::new(DenervationPolicy::Random, ReinnervationPolicy::None, 0.2),
            9,
        );
        report.failure = Some(SimError::configuration("test", "boom"));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["failure"].as_str().unwrap().contains("boom"));
        assert_eq!(json["export_errors"], serde_json::json!([]));
    }
}
