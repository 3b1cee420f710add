//! Motor pool of one simulated individual
//! Location: src/motor/pool.rs
//!
//! The pool is an ordered arena of units. Each entry carries a [`UnitId`]
//! handle, and partitioning works on positions, so two units with the same
//! sampled amplitude or threshold are never confused.

use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::unit::{MotorUnit, UnitId};
use crate::error::{SimError, SimResult};
use crate::error_context;

/// How each unit's threshold deviation is derived from its threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum SpreadModel {
    /// Same relative spread for every unit
    Fixed { value: f64 },
    /// Relative spread drawn uniformly per unit
    Uniform { low: f64, high: f64 },
}

/// Sampling parameters for a healthy pool
#[derive(Debug, Clone, PartialEq)]
pub struct PoolParameters {
    pub unit_count: usize,
    /// Mean single motor unit potential (mV)
    pub smup_mean: f64,
    /// Smallest single motor unit potential (mV)
    pub smup_min: f64,
    pub threshold_mean: f64,
    pub threshold_deviation: f64,
    pub spread: SpreadModel,
}

/// A unit and its stable handle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub id: UnitId,
    pub unit: MotorUnit,
}

/// Ordered collection of motor units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorPool {
    entries: Vec<PoolEntry>,
}

/// Aggregate statistics of a pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolSummary {
    pub unit_count: usize,
    pub total_amplitude: f64,
    pub mean_amplitude: f64,
    pub largest_amplitude: f64,
    pub lowest_threshold: f64,
    pub highest_threshold: f64,
}

impl MotorPool {
    /// Sample a healthy pool.
    ///
    /// Amplitudes follow an exponential distribution shifted to start at
    /// `smup_min` with mean `smup_mean`; thresholds are normal. All amplitudes
    /// are drawn first, then all thresholds, then per-unit spreads when the
    /// spread model is uniform.
    pub fn initialize<R: Rng + ?Sized>(params: &PoolParameters, rng: &mut R) -> SimResult<Self> {
        if params.unit_count == 0 {
            return Err(SimError::degenerate_distribution(
                "unit_count",
                "a pool needs at least one unit",
                error_context!("pool", "initialize"),
            ));
        }

        let scale = params.smup_mean - params.smup_min;
        if !(scale.is_finite() && scale > 0.0) || !(params.smup_min > 0.0) {
            return Err(SimError::degenerate_distribution(
                "smup_mean",
                format!(
                    "mean amplitude {} must exceed positive minimum {}",
                    params.smup_mean, params.smup_min
                ),
                error_context!("pool", "initialize"),
            ));
        }

        let sizes = Exp::new(1.0 / scale).map_err(|e| {
            SimError::degenerate_distribution(
                "smup_mean",
                e.to_string(),
                error_context!("pool", "initialize"),
            )
        })?;
        if !(params.threshold_deviation.is_finite() && params.threshold_deviation >= 0.0) {
            return Err(SimError::degenerate_distribution(
                "threshold_deviation",
                format!("threshold deviation {} must be non-negative", params.threshold_deviation),
                error_context!("pool", "initialize"),
            ));
        }
        let thresholds = Normal::new(params.threshold_mean, params.threshold_deviation).map_err(|e| {
            SimError::degenerate_distribution(
                "threshold_deviation",
                e.to_string(),
                error_context!("pool", "initialize"),
            )
        })?;

        let amplitudes: Vec<f64> = (0..params.unit_count)
            .map(|_| params.smup_min + sizes.sample(rng))
            .collect();
        let thresholds: Vec<f64> = (0..params.unit_count).map(|_| thresholds.sample(rng)).collect();

        let spreads: Vec<f64> = match params.spread {
            SpreadModel::Fixed { value } => {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(SimError::degenerate_distribution(
                        "spread",
                        format!("relative spread {} must be non-negative", value),
                        error_context!("pool", "initialize"),
                    ));
                }
                vec![value; params.unit_count]
            }
            SpreadModel::Uniform { low, high } => {
                if !(low.is_finite() && high.is_finite() && low >= 0.0 && low <= high) {
                    return Err(SimError::degenerate_distribution(
                        "spread",
                        format!("uniform spread bounds [{}, {}] are invalid", low, high),
                        error_context!("pool", "initialize"),
                    ));
                }
                let uniform = Uniform::new_inclusive(low, high);
                (0..params.unit_count).map(|_| uniform.sample(rng)).collect()
            }
        };

        let units = amplitudes
            .into_iter()
            .zip(thresholds)
            .zip(spreads)
            .map(|((amplitude, threshold), spread)| MotorUnit::with_relative_spread(amplitude, threshold, spread));

        Ok(Self::from_units(units))
    }

    /// Build a pool from explicit units, handles numbered in order
    pub fn from_units<I: IntoIterator<Item = MotorUnit>>(units: I) -> Self {
        let entries = units
            .into_iter()
            .enumerate()
            .map(|(i, unit)| PoolEntry {
                id: UnitId(i),
                unit,
            })
            .collect();
        Self { entries }
    }

    pub fn from_entries(entries: Vec<PoolEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&PoolEntry> {
        self.entries.get(position)
    }

    pub fn find(&self, id: UnitId) -> Option<&PoolEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn units(&self) -> impl Iterator<Item = &MotorUnit> + '_ {
        self.entries.iter().map(|entry| &entry.unit)
    }

    pub fn ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    pub fn amplitudes(&self) -> Vec<f64> {
        self.units().map(|unit| unit.amplitude).collect()
    }

    pub fn thresholds(&self) -> Vec<f64> {
        self.units().map(|unit| unit.threshold).collect()
    }

    /// Maximal response the pool can produce
    pub fn total_amplitude(&self) -> f64 {
        self.units().map(|unit| unit.amplitude).sum()
    }

    /// Lowest and highest threshold, `None` for an empty pool
    pub fn threshold_span(&self) -> Option<(f64, f64)> {
        self.units().fold(None, |span, unit| match span {
            None => Some((unit.threshold, unit.threshold)),
            Some((low, high)) => Some((low.min(unit.threshold), high.max(unit.threshold))),
        })
    }

    pub fn summary(&self) -> PoolSummary {
        let total = self.total_amplitude();
        let (lowest_threshold, highest_threshold) = self.threshold_span().unwrap_or((0.0, 0.0));
        PoolSummary {
            unit_count: self.len(),
            total_amplitude: total,
            mean_amplitude: if self.is_empty() { 0.0 } else { total / self.len() as f64 },
            largest_amplitude: self.units().map(|unit| unit.amplitude).fold(0.0, f64::max),
            lowest_threshold,
            highest_threshold,
        }
    }

    /// Positions ordered by ascending amplitude, ties broken by handle
    pub fn positions_by_amplitude(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = (0..self.len()).collect();
        positions.sort_by(|&a, &b| {
            let (ea, eb) = (&self.entries[a], &self.entries[b]);
            ea.unit
                .amplitude
                .total_cmp(&eb.unit.amplitude)
                .then(ea.id.cmp(&eb.id))
        });
        positions
    }

    /// Split into `(selected, remaining)` by position.
    ///
    /// Selected entries come out in the order given; remaining entries keep
    /// their pool order. Out-of-range or repeated positions are rejected.
    pub fn partition(&self, positions: &[usize]) -> SimResult<(MotorPool, MotorPool)> {
        if positions.len() > self.len() {
            return Err(SimError::invalid_pool_size(
                positions.len(),
                self.len(),
                error_context!("pool", "partition"),
            ));
        }

        let mut seen = HashSet::with_capacity(positions.len());
        for &position in positions {
            if position >= self.len() || !seen.insert(position) {
                return Err(SimError::invalid_pool_size(
                    position + 1,
                    self.len(),
                    error_context!("pool", "partition").add_info("position", position.to_string()),
                ));
            }
        }

        let selected = positions.iter().map(|&p| self.entries[p]).collect();
        let remaining = self
            .entries
            .iter()
            .enumerate()
            .filter(|(p, _)| !seen.contains(p))
            .map(|(_, entry)| *entry)
            .collect();

        Ok((Self::from_entries(selected), Self::from_entries(remaining)))
    }

    /// Add collateral amplitude to the unit at `position`
    pub fn grow(&mut self, position: usize, gained_amplitude: f64) -> SimResult<()> {
        let available = self.len();
        let entry = self.entries.get_mut(position).ok_or_else(|| {
            SimError::invalid_pool_size(position + 1, available, error_context!("pool", "grow"))
        })?;
        entry.unit = entry.unit.reinnervated(gained_amplitude);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a MotorPool {
    type Item = &'a PoolEntry;
    type IntoIter = std::slice::Iter<'a, PoolEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn default_params() -> PoolParameters {
        PoolParameters {
            unit_count: 160,
            smup_mean: 0.0625,
            smup_min: 0.025,
            threshold_mean: 10.683675,
            threshold_deviation: 2.0,
            spread: SpreadModel::Fixed { value: 0.0165 },
        }
    }

    fn pool_of(amplitudes: &[f64]) -> MotorPool {
        MotorPool::from_units(amplitudes.iter().map(|&a| MotorUnit::new(a, 10.0, 0.1)))
    }

    #[test]
    fn test_initialize_respects_parameters() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool = MotorPool::initialize(&default_params(), &mut rng).unwrap();

        assert_eq!(pool.len(), 160);
        assert!(pool.units().all(|u| u.amplitude >= 0.025));
        assert!(pool
            .units()
            .all(|u| (u.threshold_deviation - u.threshold * 0.0165).abs() < 1e-12));

        let ids: HashSet<UnitId> = pool.ids().collect();
        assert_eq!(ids.len(), 160);
    }

    #[test]
    fn test_initialize_is_deterministic() {
        let a = MotorPool::initialize(&default_params(), &mut StdRng::seed_from_u64(7)).unwrap();
        let b = MotorPool::initialize(&default_params(), &mut StdRng::seed_from_u64(7)).unwrap();
        let c = MotorPool::initialize(&default_params(), &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_amplitude_mean_close_to_target() {
        let params = PoolParameters {
            unit_count: 20_000,
            ..default_params()
        };
        let pool = MotorPool::initialize(&params, &mut StdRng::seed_from_u64(5)).unwrap();
        let mean = pool.summary().mean_amplitude;
        assert!((mean - 0.0625).abs() < 0.002, "mean amplitude {}", mean);
    }

    #[test]
    fn test_uniform_spread_within_bounds() {
        let params = PoolParameters {
            spread: SpreadModel::Uniform { low: 0.01, high: 0.02 },
            ..default_params()
        };
        let pool = MotorPool::initialize(&params, &mut StdRng::seed_from_u64(2)).unwrap();
        assert!(pool
            .units()
            .all(|u| (0.01 - 1e-12..=0.02 + 1e-12).contains(&u.relative_spread())));
    }

    #[test]
    fn test_degenerate_amplitude_distribution() {
        let params = PoolParameters {
            smup_mean: 0.025,
            ..default_params()
        };
        let err = MotorPool::initialize(&params, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, SimError::DegenerateDistribution { .. }));

        for params in [
            PoolParameters { unit_count: 0, ..default_params() },
            PoolParameters { threshold_deviation: -1.0, ..default_params() },
            PoolParameters { spread: SpreadModel::Fixed { value: -0.1 }, ..default_params() },
            PoolParameters { spread: SpreadModel::Uniform { low: 0.02, high: 0.01 }, ..default_params() },
        ] {
            let err = MotorPool::initialize(&params, &mut StdRng::seed_from_u64(1)).unwrap_err();
            assert!(matches!(err, SimError::DegenerateDistribution { .. }));
        }
    }

    #[test]
    fn test_negative_threshold_deviation_rejected() {
        for deviation in [-1.0, -1e-12, f64::NAN] {
            let params = PoolParameters { threshold_deviation: deviation, ..default_params() };
            match MotorPool::initialize(&params, &mut StdRng::seed_from_u64(1)) {
                Err(SimError::DegenerateDistribution { parameter, .. }) => {
                    assert_eq!(parameter, "threshold_deviation")
                }
                other => panic!("Expected DegenerateDistribution, got: {:?}", other),
            }
        }

        let params = PoolParameters { threshold_deviation: 0.0, ..default_params() };
        let pool = MotorPool::initialize(&params, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(pool.thresholds().iter().all(|&t| t == params.threshold_mean));
    }

    #[test]
    fn test_partition_keeps_duplicates_apart() {
        let pool = pool_of(&[0.05, 0.05, 0.05, 0.07]);
        let (selected, remaining) = pool.partition(&[1]).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(remaining.len(), 3);
        assert_eq!(selected.entries()[0].id, UnitId(1));
        assert_eq!(
            remaining.ids().collect::<Vec<_>>(),
            vec![UnitId(0), UnitId(2), UnitId(3)]
        );
    }

    #[test]
    fn test_partition_rejects_bad_positions() {
        let pool = pool_of(&[0.05, 0.06]);
        assert!(matches!(
            pool.partition(&[0, 1, 0]),
            Err(SimError::InvalidPoolSize { requested: 3, available: 2, .. })
        ));
        assert!(pool.partition(&[2]).is_err());
        assert!(pool.partition(&[1, 1]).is_err());
    }

    #[test]
    fn test_positions_by_amplitude() {
        let pool = pool_of(&[0.07, 0.03, 0.05, 0.03]);
        assert_eq!(pool.positions_by_amplitude(), vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_summary_of_empty_pool() {
        let summary = MotorPool::default().summary();
        assert_eq!(summary.unit_count, 0);
        assert_eq!(summary.total_amplitude, 0.0);
        assert_eq!(summary.mean_amplitude, 0.0);
    }

    #[test]
    fn test_grow() {
        let mut pool = pool_of(&[0.05]);
        pool.grow(0, 0.01).unwrap();
        assert!((pool.total_amplitude() - 0.06).abs() < 1e-12);
        assert!(pool.grow(1, 0.01).is_err());
    }
}
