//! Probabilistic activation of a motor unit by a stimulus
//! Location: src/motor/activation.rs
//!
//! A unit fires with the probability given by the Gaussian cumulative
//! distribution of its threshold:
//!
//! ```text
//! p = (erf((stimulus - threshold) / (sqrt(2) * deviation)) + 1) / 2
//! ```

use std::f64::consts::FRAC_1_SQRT_2;

/// Error function approximation (Abramowitz & Stegun 7.1.26).
///
/// Absolute error below 1.5e-7. Exact and odd around 0, and non-decreasing,
/// which the activation model relies on.
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    if x.is_nan() {
        return f64::NAN;
    }
    // The coefficients sum to 0.999999999, leaving a 1e-9 residue at the origin
    if x == 0.0 {
        return 0.0;
    }

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}

/// Probability that a unit with the given threshold fires at `stimulus`.
///
/// A non-positive or non-finite `deviation` is the zero-noise limit of the
/// sigmoid: a step function firing exactly when `stimulus >= threshold`.
pub fn fire_probability(stimulus: f64, threshold: f64, deviation: f64) -> f64 {
    if !(deviation.is_finite() && deviation > 0.0) {
        return if stimulus >= threshold { 1.0 } else { 0.0 };
    }

    let z = (stimulus - threshold) * FRAC_1_SQRT_2 / deviation;
    ((erf(z) + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Binary firing outcome for a uniform `[0, 1)` draw.
///
/// Fires on `draw < probability`, so `p = 0` never fires. The `<=` variant
/// differs only when the draw lands exactly on `p`.
#[inline]
pub fn sample_fire(probability: f64, draw: f64) -> bool {
    draw < probability
}

/// Firing probability of one unit over a stimulus sequence
pub fn activation_curve(stimuli: &[f64], threshold: f64, deviation: f64) -> Vec<f64> {
    stimuli
        .iter()
        .map(|&stimulus| fire_probability(stimulus, threshold, deviation))
        .collect()
}
