// src/config/mod.rs
//! Simulation configuration
//!
//! One immutable [`SimulationConfig`] is loaded up front and handed to the
//! driver; nothing in the crate reads process-wide parameters.

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::motor::degeneration::{DenervationPolicy, ReinnervationPolicy};
use crate::motor::pool::{PoolParameters, SpreadModel};
use crate::motor::noise::NoiseModel;
use crate::motor::scan::{GridSpacing, StimulusGrid};
use crate::simulation::condition::ExperimentCondition;
use crate::utils::validation::{
    validate_positive, validate_range, validate_unit_interval, ValidationError, ValidationResult,
};

/// Complete simulator configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub experiment: ExperimentSettings,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Experiment matrix and degeneration schedule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExperimentSettings {
    #[serde(default = "defaults::seeds")]
    pub seeds: Vec<u64>,

    #[serde(default = "defaults::denervation_policies")]
    pub denervation_policies: Vec<DenervationPolicy>,

    #[serde(default = "defaults::reinnervation_policies")]
    pub reinnervation_policies: Vec<ReinnervationPolicy>,

    #[serde(default = "defaults::reinnervation_strengths")]
    pub reinnervation_strengths: Vec<f64>,

    #[serde(default = "defaults::denervation_fraction")]
    pub denervation_fraction: f64,

    #[serde(default = "defaults::min_viable_pool")]
    pub min_viable_pool: usize,

    /// Worker threads for trajectories; rayon's default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
}

/// Healthy motor pool sampling parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    #[serde(default = "defaults::unit_count")]
    pub unit_count: usize,

    #[serde(default = "defaults::smup_mean")]
    pub smup_mean: f64,

    #[serde(default = "defaults::smup_min")]
    pub smup_min: f64,

    #[serde(default = "defaults::threshold_mean")]
    pub threshold_mean: f64,

    #[serde(default = "defaults::threshold_deviation")]
    pub threshold_deviation: f64,

    #[serde(default = "defaults::spread")]
    pub spread: SpreadModel,
}

/// Stimulus grid and observation noise
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    #[serde(default = "defaults::points")]
    pub points: usize,

    #[serde(default = "defaults::flanks")]
    pub flanks: usize,

    #[serde(default = "defaults::margin")]
    pub margin: f64,

    #[serde(default = "defaults::spacing")]
    pub spacing: GridSpacing,

    #[serde(default = "defaults::noise_std")]
    pub noise_std: f64,

    #[serde(default = "defaults::noise_offset")]
    pub noise_offset: f64,
}

/// Scan file flavour written for the external fitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanFormat {
    /// Indexed records with a scan-point boundary header
    Mem,
    /// Plain fixed-width records
    Dat,
}

/// Artifact export switches
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "defaults::scan_format")]
    pub scan_format: ScanFormat,

    #[serde(default = "defaults::enabled")]
    pub ground_truth: bool,

    #[serde(default = "defaults::enabled")]
    pub batch_index: bool,

    #[serde(default = "defaults::enabled")]
    pub trajectories: bool,

    #[serde(default = "defaults::enabled")]
    pub report: bool,
}

/// Default value providers using constants
mod defaults {
    use super::ScanFormat;
    use crate::config::constants::*;
    use crate::motor::degeneration::{DenervationPolicy, ReinnervationPolicy};
    use crate::motor::pool::SpreadModel;
    use crate::motor::scan::GridSpacing;
    use std::path::PathBuf;

    pub fn seeds() -> Vec<u64> {
        (experiment::DEFAULT_FIRST_SEED..experiment::DEFAULT_FIRST_SEED + experiment::DEFAULT_SEED_COUNT).collect()
    }
    pub fn denervation_policies() -> Vec<DenervationPolicy> { DenervationPolicy::ALL.to_vec() }
    pub fn reinnervation_policies() -> Vec<ReinnervationPolicy> { ReinnervationPolicy::ALL.to_vec() }
    pub fn reinnervation_strengths() -> Vec<f64> { experiment::DEFAULT_REINNERVATION_STRENGTHS.to_vec() }
    pub fn denervation_fraction() -> f64 { experiment::DEFAULT_DENERVATION_FRACTION }
    pub fn min_viable_pool() -> usize { experiment::DEFAULT_MIN_VIABLE_POOL }

    pub fn unit_count() -> usize { pool::DEFAULT_UNIT_COUNT }
    pub fn smup_mean() -> f64 { pool::DEFAULT_SMUP_MEAN }
    pub fn smup_min() -> f64 { pool::DEFAULT_SMUP_MIN }
    pub fn threshold_mean() -> f64 { pool::DEFAULT_THRESHOLD_MEAN }
    pub fn threshold_deviation() -> f64 { pool::DEFAULT_THRESHOLD_DEVIATION }
    pub fn spread() -> SpreadModel { SpreadModel::Fixed { value: pool::DEFAULT_RELATIVE_SPREAD } }

    pub fn points() -> usize { scan::DEFAULT_POINTS }
    pub fn flanks() -> usize { scan::DEFAULT_FLANKS }
    pub fn margin() -> f64 { scan::DEFAULT_MARGIN }
    pub fn spacing() -> GridSpacing { GridSpacing::Geometric }
    pub fn noise_std() -> f64 { scan::DEFAULT_NOISE_STD }
    pub fn noise_offset() -> f64 { scan::DEFAULT_NOISE_OFFSET }

    pub fn output_dir() -> PathBuf { PathBuf::from(export::DEFAULT_OUTPUT_DIR) }
    pub fn scan_format() -> ScanFormat { ScanFormat::Mem }
    pub fn enabled() -> bool { true }
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            seeds: defaults::seeds(),
            denervation_policies: defaults::denervation_policies(),
            reinnervation_policies: defaults::reinnervation_policies(),
            reinnervation_strengths: defaults::reinnervation_strengths(),
            denervation_fraction: defaults::denervation_fraction(),
            min_viable_pool: defaults::min_viable_pool(),
            worker_threads: None,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            unit_count: defaults::unit_count(),
            smup_mean: defaults::smup_mean(),
            smup_min: defaults::smup_min(),
            threshold_mean: defaults::threshold_mean(),
            threshold_deviation: defaults::threshold_deviation(),
            spread: defaults::spread(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            points: defaults::points(),
            flanks: defaults::flanks(),
            margin: defaults::margin(),
            spacing: defaults::spacing(),
            noise_std: defaults::noise_std(),
            noise_offset: defaults::noise_offset(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            scan_format: defaults::scan_format(),
            ground_truth: defaults::enabled(),
            batch_index: defaults::enabled(),
            trajectories: defaults::enabled(),
            report: defaults::enabled(),
        }
    }
}

impl ExperimentSettings {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.seeds.is_empty() {
            return Err(ValidationError::EmptyList("experiment.seeds".to_string()));
        }
        if self.denervation_policies.is_empty() {
            return Err(ValidationError::EmptyList("experiment.denervation_policies".to_string()));
        }
        if self.reinnervation_policies.is_empty() {
            return Err(ValidationError::EmptyList("experiment.reinnervation_policies".to_string()));
        }
        if self.reinnervation_strengths.is_empty() {
            return Err(ValidationError::EmptyList("experiment.reinnervation_strengths".to_string()));
        }
        for strength in &self.reinnervation_strengths {
            validate_unit_interval("experiment.reinnervation_strengths", *strength)?;
        }
        if !(self.denervation_fraction > 0.0 && self.denervation_fraction < 1.0) {
            return Err(ValidationError::OutOfRange {
                field: "experiment.denervation_fraction".to_string(),
                value: self.denervation_fraction.to_string(),
                min: "0 (exclusive)".to_string(),
                max: "1 (exclusive)".to_string(),
            });
        }
        if self.worker_threads == Some(0) {
            return Err(ValidationError::OutOfRange {
                field: "experiment.worker_threads".to_string(),
                value: "0".to_string(),
                min: "1".to_string(),
                max: "unbounded".to_string(),
            });
        }
        Ok(())
    }
}

impl PoolConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.unit_count == 0 {
            return Err(ValidationError::OutOfRange {
                field: "pool.unit_count".to_string(),
                value: "0".to_string(),
                min: "1".to_string(),
                max: "unbounded".to_string(),
            });
        }
        validate_positive("pool.smup_min", self.smup_min)?;
        if self.smup_mean <= self.smup_min {
            return Err(ValidationError::ConstraintViolation {
                fields: vec!["pool.smup_mean".to_string(), "pool.smup_min".to_string()],
                message: format!(
                    "mean amplitude {} must exceed minimum amplitude {}",
                    self.smup_mean, self.smup_min
                ),
            });
        }
        validate_range("pool.threshold_deviation", self.threshold_deviation, 0.0, f64::MAX)?;
        match self.spread {
            SpreadModel::Fixed { value } => validate_range("pool.spread.value", value, 0.0, f64::MAX)?,
            SpreadModel::Uniform { low, high } => {
                validate_range("pool.spread.low", low, 0.0, f64::MAX)?;
                if high < low {
                    return Err(ValidationError::ConstraintViolation {
                        fields: vec!["pool.spread.low".to_string(), "pool.spread.high".to_string()],
                        message: format!("upper bound {} is below lower bound {}", high, low),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn parameters(&self) -> PoolParameters {
        PoolParameters {
            unit_count: self.unit_count,
            smup_mean: self.smup_mean,
            smup_min: self.smup_min,
            threshold_mean: self.threshold_mean,
            threshold_deviation: self.threshold_deviation,
            spread: self.spread,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.points < constants::scan::MIN_POINTS {
            return Err(ValidationError::OutOfRange {
                field: "scan.points".to_string(),
                value: self.points.to_string(),
                min: constants::scan::MIN_POINTS.to_string(),
                max: "unbounded".to_string(),
            });
        }
        validate_range("scan.margin", self.margin, 0.0, f64::MAX)?;
        validate_range("scan.noise_std", self.noise_std, 0.0, f64::MAX)?;
        if !self.noise_offset.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: "scan.noise_offset".to_string(),
                value: self.noise_offset.to_string(),
                expected: "a finite number".to_string(),
            });
        }
        Ok(())
    }

    pub fn grid(&self) -> StimulusGrid {
        StimulusGrid {
            points: self.points,
            flanks: self.flanks,
            margin: self.margin,
            spacing: self.spacing,
        }
    }

    pub fn noise(&self) -> NoiseModel {
        NoiseModel {
            offset: self.noise_offset,
            std_dev: self.noise_std,
        }
    }
}

impl SimulationConfig {
    /// Validate every section plus the cross-field rules
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for result in [
            self.experiment.validate(),
            self.pool.validate(),
            self.scan.validate(),
        ] {
            if let Err(e) = result {
                errors.push(e.to_string());
            }
        }

        // Every trajectory must keep shrinking until it drops below the viable size
        let fraction = self.experiment.denervation_fraction;
        let smallest_step = (self.experiment.min_viable_pool.max(1) as f64 * fraction).floor() as usize;
        if smallest_step == 0 {
            errors.push(format!(
                "Denervation fraction {} removes no units from a pool of {}; trajectories would never terminate",
                fraction, self.experiment.min_viable_pool
            ));
        }

        if self.scan.spacing == GridSpacing::Geometric
            && self.pool.threshold_mean - 4.0 * self.pool.threshold_deviation - self.scan.margin <= 0.0
        {
            tracing::warn!(
                threshold_mean = self.pool.threshold_mean,
                threshold_deviation = self.pool.threshold_deviation,
                "geometric stimulus grid may reach non-positive stimuli for low-threshold units"
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Expand the experiment matrix.
    ///
    /// `none` reinnervation ignores strength, so it yields a single condition
    /// at the first configured strength.
    pub fn conditions(&self) -> Vec<ExperimentCondition> {
        let mut conditions = Vec::new();
        let first_strength = self.experiment.reinnervation_strengths.first().copied().unwrap_or(0.0);

        for &denervation in &self.experiment.denervation_policies {
            for &reinnervation in &self.experiment.reinnervation_policies {
                if reinnervation == ReinnervationPolicy::None {
                    conditions.push(ExperimentCondition::new(denervation, reinnervation, first_strength));
                    continue;
                }
                for &strength in &self.experiment.reinnervation_strengths {
                    conditions.push(ExperimentCondition::new(denervation, reinnervation, strength));
                }
            }
        }

        conditions
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            seed_count: self.experiment.seeds.len(),
            condition_count: self.conditions().len(),
            unit_count: self.pool.unit_count,
            scan_length: self.scan.grid().len(),
            min_viable_pool: self.experiment.min_viable_pool,
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub seed_count: usize,
    pub condition_count: usize,
    pub unit_count: usize,
    pub scan_length: usize,
    pub min_viable_pool: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = SimulationConfig::default();
        assert_eq!(config.pool.unit_count, pool::DEFAULT_UNIT_COUNT);
        assert_eq!(config.experiment.seeds, (1..=10).collect::<Vec<u64>>());
        assert!(config.validate_consistency().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = SimulationConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: SimulationConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.pool.unit_count, deserialized.pool.unit_count);
        assert_eq!(config.experiment.reinnervation_policies, deserialized.experiment.reinnervation_policies);
        assert_eq!(config.pool.spread, deserialized.pool.spread);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
[experiment]
reinnervation_policies = ["distributed", "none"]

[pool]
unit_count = 40
spread = { model = "uniform", low = 0.015, high = 0.02 }
"#,
        )
        .unwrap();

        assert_eq!(config.pool.unit_count, 40);
        assert_eq!(config.pool.smup_mean, pool::DEFAULT_SMUP_MEAN);
        assert_eq!(
            config.experiment.reinnervation_policies,
            vec![ReinnervationPolicy::Distributive, ReinnervationPolicy::None]
        );
        assert_eq!(config.pool.spread, SpreadModel::Uniform { low: 0.015, high: 0.02 });
        assert_eq!(config.scan.points, scan::DEFAULT_POINTS);
    }

    #[test]
    fn test_default_condition_matrix() {
        let config = SimulationConfig::default();
        let conditions = config.conditions();

        // 2 denervation x (3 compensating x 2 strengths + none)
        assert_eq!(conditions.len(), 14);
        let none_count = conditions
            .iter()
            .filter(|c| c.reinnervation == ReinnervationPolicy::None)
            .count();
        assert_eq!(none_count, 2);
        assert!(conditions
            .iter()
            .filter(|c| c.reinnervation == ReinnervationPolicy::None)
            .all(|c| c.reinnervation_strength == 0.2));
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimulationConfig::default();
        config.experiment.denervation_fraction = 0.1;
        // floor(5 * 0.1) == 0: the pool could stall above the viable size
        let errors = config.validate_consistency().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("never terminate")));

        let mut config = SimulationConfig::default();
        config.pool.smup_mean = config.pool.smup_min;
        config.experiment.reinnervation_strengths = vec![1.5];
        let errors = config.validate_consistency().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_summary() {
        let summary = SimulationConfig::default().get_summary();
        assert_eq!(summary.seed_count, 10);
        assert_eq!(summary.condition_count, 14);
        assert_eq!(summary.scan_length, 540);
    }
}
