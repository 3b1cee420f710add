//! Denervation and reinnervation of a motor pool
//! Location: src/motor/degeneration.rs
//!
//! One degeneration step removes a fraction of the pool (denervation) and
//! hands part of the lost amplitude back to the survivors (reinnervation by
//! collateral sprouting). Selection and compensation are separate traits so
//! new policies plug in without touching the engine.

use rand::seq::index;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::pool::MotorPool;
use crate::error::{SimError, SimResult};
use crate::error_context;

/// Chooses which units are denervated
pub trait SelectionPolicy {
    /// Positions of `count` distinct units to remove from `pool`
    fn select(&self, pool: &MotorPool, count: usize, rng: &mut dyn RngCore) -> SimResult<Vec<usize>>;
}

/// Redistributes denervated amplitude onto surviving units
pub trait CompensationPolicy {
    /// Grow `survivors` in place; returns the amplitude handed out
    fn compensate(
        &self,
        survivors: &mut MotorPool,
        denervated: &MotorPool,
        strength: f64,
        rng: &mut dyn RngCore,
    ) -> SimResult<f64>;
}

/// Which units die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenervationPolicy {
    /// Uniformly random subset
    Random,
    /// The largest units
    Selective,
}

/// How survivors compensate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReinnervationPolicy {
    /// A random subset of lost amplitudes, each adopted whole by a random survivor
    Random,
    /// Equal share for every survivor
    #[serde(alias = "distributed")]
    Distributive,
    /// Share proportional to squared amplitude
    Selective,
    /// No compensation
    None,
}

impl DenervationPolicy {
    pub const ALL: [DenervationPolicy; 2] = [DenervationPolicy::Random, DenervationPolicy::Selective];

    pub fn name(&self) -> &'static str {
        match self {
            DenervationPolicy::Random => "random",
            DenervationPolicy::Selective => "selective",
        }
    }
}

impl ReinnervationPolicy {
    pub const ALL: [ReinnervationPolicy; 4] = [
        ReinnervationPolicy::Random,
        ReinnervationPolicy::Distributive,
        ReinnervationPolicy::Selective,
        ReinnervationPolicy::None,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReinnervationPolicy::Random => "random",
            ReinnervationPolicy::Distributive => "distributive",
            ReinnervationPolicy::Selective => "selective",
            ReinnervationPolicy::None => "none",
        }
    }

    /// Whether the strength parameter has any effect
    pub fn uses_strength(&self) -> bool {
        !matches!(self, ReinnervationPolicy::None)
    }
}

impl fmt::Display for DenervationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ReinnervationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DenervationPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(DenervationPolicy::Random),
            "selective" => Ok(DenervationPolicy::Selective),
            other => Err(SimError::configuration(
                "denervation",
                format!("unknown policy '{}'", other),
            )),
        }
    }
}

impl FromStr for ReinnervationPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(ReinnervationPolicy::Random),
            "distributive" | "distributed" => Ok(ReinnervationPolicy::Distributive),
            "selective" => Ok(ReinnervationPolicy::Selective),
            "none" => Ok(ReinnervationPolicy::None),
            other => Err(SimError::configuration(
                "reinnervation",
                format!("unknown policy '{}'", other),
            )),
        }
    }
}

impl SelectionPolicy for DenervationPolicy {
    fn select(&self, pool: &MotorPool, count: usize, rng: &mut dyn RngCore) -> SimResult<Vec<usize>> {
        if count > pool.len() {
            return Err(SimError::invalid_pool_size(
                count,
                pool.len(),
                error_context!("denervation", "select").add_info("policy", self.name()),
            ));
        }

        match self {
            DenervationPolicy::Random => Ok(index::sample(rng, pool.len(), count).into_vec()),
            DenervationPolicy::Selective => {
                let by_amplitude = pool.positions_by_amplitude();
                Ok(by_amplitude[pool.len() - count..].to_vec())
            }
        }
    }
}

impl CompensationPolicy for ReinnervationPolicy {
    fn compensate(
        &self,
        survivors: &mut MotorPool,
        denervated: &MotorPool,
        strength: f64,
        rng: &mut dyn RngCore,
    ) -> SimResult<f64> {
        match self {
            ReinnervationPolicy::None => Ok(0.0),
            ReinnervationPolicy::Random => adopt_random(survivors, denervated, strength, rng),
            ReinnervationPolicy::Distributive => {
                let pool_share = denervated.total_amplitude() * strength;
                if pool_share == 0.0 {
                    return Ok(0.0);
                }
                require_survivors(survivors, "distributive")?;

                let share = pool_share / survivors.len() as f64;
                for position in 0..survivors.len() {
                    survivors.grow(position, share)?;
                }
                Ok(pool_share)
            }
            ReinnervationPolicy::Selective => {
                let pool_share = denervated.total_amplitude() * strength;
                if pool_share == 0.0 {
                    return Ok(0.0);
                }
                require_survivors(survivors, "selective")?;

                let weights: Vec<f64> = survivors.units().map(|u| u.amplitude * u.amplitude).collect();
                let weight_sum: f64 = weights.iter().sum();
                if !(weight_sum.is_finite() && weight_sum > 0.0) {
                    return Err(SimError::degenerate_distribution(
                        "amplitude",
                        format!("squared amplitude sum {} cannot weight reinnervation", weight_sum),
                        error_context!("reinnervation", "compensate"),
                    ));
                }

                for (position, weight) in weights.into_iter().enumerate() {
                    survivors.grow(position, weight / weight_sum * pool_share)?;
                }
                Ok(pool_share)
            }
        }
    }
}

/// `floor(|denervated| * strength)` lost units are adopted whole, each by a
/// different random survivor
fn adopt_random(
    survivors: &mut MotorPool,
    denervated: &MotorPool,
    strength: f64,
    rng: &mut dyn RngCore,
) -> SimResult<f64> {
    let adopted = (denervated.len() as f64 * strength).floor() as usize;
    if adopted == 0 {
        return Ok(0.0);
    }
    if adopted > survivors.len() {
        return Err(SimError::invalid_pool_size(
            adopted,
            survivors.len(),
            error_context!("reinnervation", "adopt_random"),
        ));
    }

    let lost = index::sample(rng, denervated.len(), adopted);
    let adopters = index::sample(rng, survivors.len(), adopted);

    let mut handed_out = 0.0;
    for (lost_position, adopter) in lost.iter().zip(adopters.iter()) {
        let amplitude = denervated
            .get(lost_position)
            .map(|entry| entry.unit.amplitude)
            .unwrap_or_default();
        survivors.grow(adopter, amplitude)?;
        handed_out += amplitude;
    }
    Ok(handed_out)
}

fn require_survivors(survivors: &MotorPool, policy: &str) -> SimResult<()> {
    if survivors.is_empty() {
        return Err(SimError::invalid_pool_size(
            1,
            0,
            error_context!("reinnervation", "compensate").add_info("policy", policy),
        ));
    }
    Ok(())
}

/// Outcome of one degeneration step
#[derive(Debug, Clone, PartialEq)]
pub struct DegenerationStep {
    /// Surviving units after compensation, in their previous order
    pub survivors: MotorPool,
    /// Units removed in this step, before any compensation
    pub denervated: MotorPool,
    /// Amplitude moved from the denervated units onto survivors
    pub redistributed_amplitude: f64,
}

/// Applies one denervation/reinnervation policy pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegenerationEngine {
    pub denervation_fraction: f64,
    pub denervation: DenervationPolicy,
    pub reinnervation: ReinnervationPolicy,
    pub reinnervation_strength: f64,
}

impl DegenerationEngine {
    pub fn new(
        denervation: DenervationPolicy,
        reinnervation: ReinnervationPolicy,
        reinnervation_strength: f64,
        denervation_fraction: f64,
    ) -> SimResult<Self> {
        if !(denervation_fraction > 0.0 && denervation_fraction < 1.0) {
            return Err(SimError::configuration(
                "degeneration",
                format!("denervation fraction {} must lie in (0, 1)", denervation_fraction),
            ));
        }
        if !(0.0..=1.0).contains(&reinnervation_strength) {
            return Err(SimError::configuration(
                "degeneration",
                format!("reinnervation strength {} must lie in [0, 1]", reinnervation_strength),
            ));
        }

        Ok(Self {
            denervation_fraction,
            denervation,
            reinnervation,
            reinnervation_strength,
        })
    }

    /// Units removed from a pool of `pool_size`
    pub fn denervation_count(&self, pool_size: usize) -> usize {
        (pool_size as f64 * self.denervation_fraction).floor() as usize
    }

    /// Split `pool` into `(denervated, survivors)` without compensation
    pub fn denervate(&self, pool: &MotorPool, rng: &mut dyn RngCore) -> SimResult<(MotorPool, MotorPool)> {
        let count = self.denervation_count(pool.len());
        if count == 0 {
            return Err(SimError::invalid_pool_size(
                count,
                pool.len(),
                error_context!("degeneration", "denervate")
                    .add_info("reason", "step would remove no units"),
            ));
        }

        let positions = self.denervation.select(pool, count, rng)?;
        pool.partition(&positions)
    }

    /// Denervate then reinnervate
    pub fn step(&self, pool: &MotorPool, rng: &mut dyn RngCore) -> SimResult<DegenerationStep> {
        let (denervated, mut survivors) = self.denervate(pool, rng)?;
        let redistributed_amplitude =
            self.reinnervation
                .compensate(&mut survivors, &denervated, self.reinnervation_strength, rng)?;

        tracing::debug!(
            before = pool.len(),
            removed = denervated.len(),
            redistributed = redistributed_amplitude,
            "degeneration step"
        );

        Ok(DegenerationStep {
            survivors,
            denervated,
            redistributed_amplitude,
        })
    }
}
