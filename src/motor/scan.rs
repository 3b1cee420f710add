//! Stimulus grids and synthetic stimulus-response scans
//! Location: src/motor/scan.rs
//!
//! A scan sweeps stimulus intensity across the threshold range of the pool.
//! At each intensity every unit fires independently with its activation
//! probability, and the response is the summed amplitude of the units that
//! fired plus Gaussian noise.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::activation::sample_fire;
use super::noise::NoiseModel;
use super::pool::MotorPool;
use crate::error::{SimError, SimResult};
use crate::error_context;

/// Spacing of the stimulus points between the flanks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSpacing {
    Linear,
    Geometric,
}

/// Stimulus grid shape
///
/// `points` samples span `[min_threshold - margin, max_threshold + margin]`,
/// and the first and last values are each repeated `flanks` more times so the
/// fitter sees stable baseline and plateau regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StimulusGrid {
    pub points: usize,
    pub flanks: usize,
    pub margin: f64,
    pub spacing: GridSpacing,
}

/// 1-based boundaries of the flank regions in an exported scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPoints {
    pub first: usize,
    pub baseline_end: usize,
    pub plateau_start: usize,
    pub last: usize,
}

impl ScanPoints {
    /// Boundaries for a scan of `total` samples with `flanks` repeats per end
    pub fn new(total: usize, flanks: usize) -> Self {
        let flank = flanks.max(1).min(total.max(1));
        Self {
            first: 1,
            baseline_end: flank,
            plateau_start: total + 1 - flank,
            last: total,
        }
    }
}

impl StimulusGrid {
    /// Number of stimuli in a scan
    pub fn len(&self) -> usize {
        self.points + 2 * self.flanks
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scan_points(&self) -> ScanPoints {
        ScanPoints::new(self.len(), self.flanks)
    }

    /// Stimuli spanning `[low, high]` with flanks
    pub fn span(&self, low: f64, high: f64) -> SimResult<Vec<f64>> {
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(SimError::degenerate_distribution(
                "stimulus_range",
                format!("invalid stimulus range [{}, {}]", low, high),
                error_context!("scan", "span"),
            ));
        }

        let core = match self.spacing {
            GridSpacing::Linear => linspace(low, high, self.points),
            GridSpacing::Geometric => geomspace(low, high, self.points)?,
        };

        let (first, last) = match (core.first(), core.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Ok(Vec::new()),
        };

        let mut stimuli = Vec::with_capacity(self.len());
        stimuli.extend(std::iter::repeat(first).take(self.flanks));
        stimuli.extend_from_slice(&core);
        stimuli.extend(std::iter::repeat(last).take(self.flanks));
        Ok(stimuli)
    }

    /// Stimuli covering the threshold range of `pool`
    pub fn for_pool(&self, pool: &MotorPool) -> SimResult<Vec<f64>> {
        let (low, high) = pool.threshold_span().ok_or_else(|| {
            SimError::invalid_pool_size(1, 0, error_context!("scan", "for_pool"))
        })?;
        self.span(low - self.margin, high + self.margin)
    }
}

/// `count` evenly spaced values from `low` to `high` inclusive
pub fn linspace(low: f64, high: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let step = (high - low) / (count - 1) as f64;
            let mut values: Vec<f64> = (0..count).map(|i| low + step * i as f64).collect();
            values[count - 1] = high;
            values
        }
    }
}

/// `count` geometrically spaced values from `low` to `high` inclusive
pub fn geomspace(low: f64, high: f64, count: usize) -> SimResult<Vec<f64>> {
    if !(low > 0.0 && high > 0.0) {
        return Err(SimError::degenerate_distribution(
            "stimulus_range",
            format!("geometric grid needs positive bounds, got [{}, {}]", low, high),
            error_context!("scan", "geomspace"),
        ));
    }

    let mut values: Vec<f64> = linspace(low.ln(), high.ln(), count).into_iter().map(f64::exp).collect();
    if let Some(first) = values.first_mut() {
        *first = low;
    }
    if count > 1 {
        values[count - 1] = high;
    }
    Ok(values)
}

/// Stimulus-response pairs of one scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub stimuli: Vec<f64>,
    pub responses: Vec<f64>,
}

impl Scan {
    pub fn new(stimuli: Vec<f64>, responses: Vec<f64>) -> SimResult<Self> {
        if stimuli.len() != responses.len() {
            return Err(SimError::Parse {
                line: stimuli.len().min(responses.len()) + 1,
                reason: format!(
                    "{} stimuli but {} responses",
                    stimuli.len(),
                    responses.len()
                ),
            });
        }
        Ok(Self { stimuli, responses })
    }

    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.stimuli.iter().copied().zip(self.responses.iter().copied())
    }

    /// Largest response, `None` for an empty scan
    pub fn max_response(&self) -> Option<f64> {
        self.responses.iter().copied().reduce(f64::max)
    }
}

/// Scan every stimulus against `pool`.
///
/// All noise samples are drawn first, then one uniform draw per unit per
/// stimulus in pool order.
pub fn generate_scan<R: Rng + ?Sized>(
    pool: &MotorPool,
    stimuli: &[f64],
    noise: &NoiseModel,
    rng: &mut R,
) -> SimResult<Scan> {
    let noise_samples = noise.sample(stimuli.len(), rng)?;

    let responses = stimuli
        .iter()
        .zip(noise_samples)
        .map(|(&stimulus, noise_sample)| {
            let mut cmap = 0.0;
            for unit in pool.units() {
                let draw: f64 = rng.gen();
                if sample_fire(unit.fire_probability(stimulus), draw) {
                    cmap += unit.amplitude;
                }
            }
            cmap + noise_sample
        })
        .collect();

    Ok(Scan {
        stimuli: stimuli.to_vec(),
        responses,
    })
}

/// Grid and noise bound together for repeated scans
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanGenerator {
    grid: StimulusGrid,
    noise: NoiseModel,
}

impl ScanGenerator {
    pub fn new(grid: StimulusGrid, noise: NoiseModel) -> Self {
        Self { grid, noise }
    }

    pub fn grid(&self) -> &StimulusGrid {
        &self.grid
    }

    pub fn noise(&self) -> &NoiseModel {
        &self.noise
    }

    /// Scan `pool` over a grid fitted to its own thresholds
    pub fn scan<R: Rng + ?Sized>(&self, pool: &MotorPool, rng: &mut R) -> SimResult<Scan> {
        let stimuli = self.grid.for_pool(pool)?;
        generate_scan(pool, &stimuli, &self.noise, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::unit::MotorUnit;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(spacing: GridSpacing) -> StimulusGrid {
        StimulusGrid {
            points: 500,
            flanks: 20,
            margin: 0.5,
            spacing,
        }
    }

    #[test]
    fn test_grid_length_and_flanks() {
        let stimuli = grid(GridSpacing::Geometric).span(5.0, 15.0).unwrap();
        assert_eq!(stimuli.len(), 540);
        assert!(stimuli[..21].iter().all(|&s| s == 5.0));
        assert!(stimuli[519..].iter().all(|&s| s == 15.0));
        assert!(stimuli.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_geometric_spacing_ratio() {
        let values = geomspace(1.0, 1000.0, 4).unwrap();
        let expected = [1.0, 10.0, 100.0, 1000.0];
        for (v, e) in values.iter().zip(expected) {
            assert!((v - e).abs() < 1e-9 * e);
        }
        assert!(geomspace(0.0, 10.0, 4).is_err());
        assert!(geomspace(-1.0, 10.0, 4).is_err());
    }

    #[test]
    fn test_linspace_endpoints() {
        let values = linspace(0.1, 0.7, 7);
        assert_eq!(values.first(), Some(&0.1));
        assert_eq!(values.last(), Some(&0.7));
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
        assert!(linspace(3.0, 4.0, 0).is_empty());
    }

    #[test]
    fn test_scan_points() {
        let points = grid(GridSpacing::Linear).scan_points();
        assert_eq!(points, ScanPoints { first: 1, baseline_end: 20, plateau_start: 521, last: 540 });
    }

    #[test]
    fn test_grid_for_empty_pool_fails() {
        let err = grid(GridSpacing::Linear).for_pool(&MotorPool::default()).unwrap_err();
        assert!(matches!(err, SimError::InvalidPoolSize { .. }));
    }

    #[test]
    fn test_empty_pool_scan_is_pure_noise() {
        let mut rng = StdRng::seed_from_u64(4);
        let stimuli = linspace(1.0, 2.0, 10);
        let scan = generate_scan(&MotorPool::default(), &stimuli, &NoiseModel::silent(), &mut rng).unwrap();
        assert_eq!(scan.responses, vec![0.0; 10]);
    }

    #[test]
    fn test_scan_saturates_at_total_amplitude() {
        let pool = MotorPool::from_units([
            MotorUnit::new(0.03, 10.0, 0.1),
            MotorUnit::new(0.05, 11.0, 0.1),
        ]);
        let stimuli = [0.0, 100.0];
        let scan = generate_scan(&pool, &stimuli, &NoiseModel::silent(), &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(scan.responses[0], 0.0);
        assert!((scan.responses[1] - 0.08).abs() < 1e-12);
        assert_eq!(scan.max_response(), Some(scan.responses[1]));
    }

    #[test]
    fn test_scan_mismatched_lengths() {
        assert!(Scan::new(vec![1.0, 2.0], vec![0.1]).is_err());
        assert!(Scan::default().max_response().is_none());
    }
}
