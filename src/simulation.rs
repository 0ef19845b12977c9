//! Synthetic lightcurves.
//!
//! Evenly sampled model signals on a fixed cadence, with optional Gaussian
//! noise and observing gaps. Used by the tests, benches and demos, and handy
//! for checking a configuration against a known period.

use crate::error::{Error, Result};
use crate::lightcurve::Lightcurve;
use rand::prelude::*;
use rand_distr::Normal;
use std::f64::consts::PI;

// =============================================================================
// Sampling
// =============================================================================

const MINUTES_PER_DAY: f64 = 1440.0;

/// Times `0, dt, 2 dt, ...` strictly below `duration_days`, with `dt` the
/// cadence converted to days.
pub fn cadence_times(duration_days: f64, cadence_minutes: f64) -> Vec<f64> {
    if !(duration_days > 0.0) || !(cadence_minutes > 0.0) {
        return Vec::new();
    }
    (0u64..)
        .map(|i| i as f64 * cadence_minutes / MINUTES_PER_DAY)
        .take_while(|&t| t < duration_days)
        .collect()
}

// =============================================================================
// Model signals
// =============================================================================

/// Sinusoid `1 + amplitude * sin(2πt / period)`.
///
/// # Arguments
/// * `id` - Lightcurve identifier
/// * `period` - Period in days
/// * `amplitude` - Semi-amplitude in normalized flux
/// * `duration_days` - Observation length
/// * `cadence_minutes` - Sampling interval
pub fn sinusoid(
    id: &str,
    period: f64,
    amplitude: f64,
    duration_days: f64,
    cadence_minutes: f64,
) -> Lightcurve {
    Lightcurve::from_samples(
        id,
        cadence_times(duration_days, cadence_minutes)
            .into_iter()
            .map(|t| (t, 1.0 + amplitude * (2.0 * PI * t / period).sin())),
    )
}

/// Shape of a detached eclipsing binary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EclipseShape {
    /// Orbital period in days
    pub period: f64,
    /// Fractional depth of the primary eclipse at phase 0
    pub primary_depth: f64,
    /// Fractional depth of the secondary eclipse at phase 0.5
    pub secondary_depth: f64,
    /// Gaussian width of each eclipse in phase units
    pub width: f64,
}

impl Default for EclipseShape {
    fn default() -> Self {
        Self {
            period: 1.8,
            primary_depth: 0.2,
            secondary_depth: 0.08,
            width: 0.03,
        }
    }
}

impl EclipseShape {
    /// Normalized flux at time `t`.
    pub fn flux_at(&self, t: f64) -> f64 {
        let phase = t.rem_euclid(self.period) / self.period;
        let dip = |center: f64, depth: f64| {
            // distance to the eclipse center on the unit circle
            let d = (phase - center).abs();
            let d = d.min(1.0 - d);
            depth * (-0.5 * (d / self.width).powi(2)).exp()
        };
        1.0 - dip(0.0, self.primary_depth) - dip(0.5, self.secondary_depth)
    }
}

/// Eclipsing binary lightcurve with two Gaussian eclipses per orbit.
///
/// The periodogram of such a signal has strong power at harmonics of the
/// orbital frequency, often more than at the orbital frequency itself.
pub fn eclipsing_binary(
    id: &str,
    shape: &EclipseShape,
    duration_days: f64,
    cadence_minutes: f64,
) -> Lightcurve {
    Lightcurve::from_samples(
        id,
        cadence_times(duration_days, cadence_minutes)
            .into_iter()
            .map(|t| (t, shape.flux_at(t))),
    )
}

// =============================================================================
// Perturbations
// =============================================================================

/// Add independent N(0, σ²) noise to the flux.
///
/// # Arguments
/// * `lightcurve` - Input lightcurve
/// * `sigma` - Noise standard deviation
/// * `seed` - Optional random seed for reproducibility
pub fn add_noise(lightcurve: &Lightcurve, sigma: f64, seed: Option<u64>) -> Result<Lightcurve> {
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| Error::invalid(format!("invalid noise level {sigma}: {e}")))?;

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    Ok(Lightcurve::from_samples(
        lightcurve.id(),
        lightcurve
            .samples()
            .map(|(t, f)| (t, f + rng.sample::<f64, _>(normal)))
            .collect::<Vec<_>>(),
    ))
}

/// Remove the samples with `start <= t < end`.
pub fn insert_gap(lightcurve: &Lightcurve, start: f64, end: f64) -> Lightcurve {
    Lightcurve::from_samples(
        lightcurve.id(),
        lightcurve
            .samples()
            .filter(|&(t, _)| t < start || t >= end)
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_times() {
        let t = cadence_times(1.0, 30.0);
        assert_eq!(t.len(), 48);
        assert_eq!(t[0], 0.0);
        assert_eq!(t[1], 30.0 / 1440.0);
        assert!(t.iter().all(|&v| v < 1.0));
        assert!(cadence_times(0.0, 30.0).is_empty());
    }

    #[test]
    fn test_sinusoid_range() {
        let lc = sinusoid("s", 2.5, 0.01, 20.0, 30.0);
        assert_eq!(lc.len(), 960);
        assert!(lc.flux().iter().all(|&f| (0.99..=1.01).contains(&f)));
        assert_eq!(lc.id(), "s");
    }

    #[test]
    fn test_eclipse_depths() {
        let shape = EclipseShape::default();
        assert!((shape.flux_at(0.0) - (1.0 - shape.primary_depth)).abs() < 1e-6);
        let mid = shape.flux_at(0.5 * shape.period);
        assert!((mid - (1.0 - shape.secondary_depth)).abs() < 1e-6);
        assert!((shape.flux_at(0.25 * shape.period) - 1.0).abs() < 1e-6);
        // periodic
        assert!((shape.flux_at(0.3) - shape.flux_at(0.3 + 3.0 * shape.period)).abs() < 1e-12);
    }

    #[test]
    fn test_noise_is_reproducible() {
        let lc = sinusoid("n", 1.0, 0.0, 5.0, 30.0);
        let a = add_noise(&lc, 0.001, Some(7)).unwrap();
        let b = add_noise(&lc, 0.001, Some(7)).unwrap();
        let c = add_noise(&lc, 0.001, Some(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.time(), lc.time());

        let mean = a.flux().iter().sum::<f64>() / a.len() as f64;
        assert!((mean - 1.0).abs() < 5e-4);
    }

    #[test]
    fn test_noise_rejects_negative_sigma() {
        let lc = sinusoid("n", 1.0, 0.0, 1.0, 30.0);
        assert!(add_noise(&lc, -1.0, Some(1)).is_err());
    }

    #[test]
    fn test_insert_gap() {
        let lc = sinusoid("g", 1.0, 0.01, 10.0, 30.0);
        let gapped = insert_gap(&lc, 4.0, 6.0);
        assert_eq!(gapped.len(), lc.len() - 96);
        assert!(gapped.time().iter().all(|&t| !(4.0..6.0).contains(&t)));
    }
}
