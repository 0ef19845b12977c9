//! Generalized Lomb-Scargle power spectra over explicit frequency grids.
//!
//! The power is the floating-mean ("generalized") Lomb-Scargle periodogram
//! with uniform weights: the data are centered on their mean and at every
//! test frequency a sinusoid plus offset is fit by least squares. With the
//! default [`Normalization::Standard`] the power is the fraction of variance
//! explained, in `[0, 1]`.
//!
//! # Algorithm
//! For each angular frequency ω (weights `w_i = 1/n`, `y` centered):
//! 1. Time shift τ from `tan 2ωτ = (S2 - 2SC) / (C2 - (C² - S²))`
//!    where `S = Σw sin ωt`, `C = Σw cos ωt`, `S2 = Σw sin 2ωt`,
//!    `C2 = Σw cos 2ωt`.
//! 2. With `c_i = cos ω(t_i - τ)`, `s_i = sin ω(t_i - τ)`, mean-corrected
//!    sums `YC`, `YS`, `CC`, `SS` give `P = YC²/CC + YS²/SS`.
//! 3. Normalize by `YY = Σw y²` (see [`Normalization`]).

use crate::error::{Error, Result};
use crate::lightcurve::Lightcurve;
use crate::peaks::{find_peaks, PeakConfig, PeakSet};
use crate::slice_maybe_parallel;
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Minimum denominator used in the power formula.
const POWER_EPS: f64 = 1e-15;

/// Normalization applied to the raw Lomb-Scargle power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// `P / YY`: fraction of variance explained, in `[0, 1]`
    #[default]
    Standard,
    /// `P / (YY - P)`
    Model,
    /// `-ln(1 - P / YY)`
    Log,
    /// `P / 2`: unnormalized power in flux² units
    Psd,
}

/// Settings for the coarse spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Grid points per sample for the default grid
    pub oversample: usize,
    /// Assumed instrument cadence in minutes; sets the Nyquist limit
    pub cadence_minutes: f64,
    /// Explicit frequency grid (cycles/day); replaces the default grid
    pub grid: Option<Vec<f64>>,
    /// Power normalization
    pub normalization: Normalization,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            oversample: 10,
            cadence_minutes: 30.0,
            grid: None,
            normalization: Normalization::Standard,
        }
    }
}

impl SpectrumConfig {
    /// Cadence in days.
    pub fn cadence_days(&self) -> f64 {
        self.cadence_minutes / 60.0 / 24.0
    }

    /// Nyquist frequency implied by the fixed cadence (cycles/day).
    pub fn nyquist(&self) -> f64 {
        0.5 / self.cadence_days()
    }
}

// ============================================================================
// Frequency grids
// ============================================================================

/// Strictly increasing sequence of positive frequencies (cycles/day).
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    frequencies: Vec<f64>,
}

impl FrequencyGrid {
    /// Wrap an explicit grid, checking that it is non-empty, finite,
    /// positive and strictly increasing.
    pub fn from_vec(frequencies: Vec<f64>) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(Error::invalid("frequency grid is empty"));
        }
        if let Some(i) = frequencies.iter().position(|f| !f.is_finite() || *f <= 0.0) {
            return Err(Error::invalid(format!(
                "frequency grid value {} at index {} is not a positive finite number",
                frequencies[i], i
            )));
        }
        if let Some(i) = frequencies.windows(2).position(|w| w[1] <= w[0]) {
            return Err(Error::invalid(format!(
                "frequency grid is not strictly increasing at index {}",
                i + 1
            )));
        }
        Ok(Self { frequencies })
    }

    /// `num` evenly spaced frequencies from `start` to `stop` inclusive.
    ///
    /// Values are `start + k * step` with the final point pinned to `stop`,
    /// the same construction as numpy's `linspace`.
    pub fn linspace(start: f64, stop: f64, num: usize) -> Result<Self> {
        if num == 0 {
            return Err(Error::invalid("frequency grid needs at least one point"));
        }
        if num == 1 {
            return Self::from_vec(vec![start]);
        }
        let step = (stop - start) / (num - 1) as f64;
        let mut frequencies: Vec<f64> = (0..num).map(|k| start + k as f64 * step).collect();
        frequencies[num - 1] = stop;
        Self::from_vec(frequencies)
    }

    /// Default coarse grid for a lightcurve: `oversample * n` points from
    /// `1 / (t_last - t_first)` to the Nyquist frequency of the fixed cadence.
    pub fn for_lightcurve(time: &[f64], config: &SpectrumConfig) -> Result<Self> {
        if time.len() < 2 {
            return Err(Error::invalid(format!(
                "default frequency grid needs at least 2 samples, got {}",
                time.len()
            )));
        }
        if config.oversample == 0 {
            return Err(Error::invalid("oversample must be at least 1"));
        }
        if !(config.cadence_minutes > 0.0) {
            return Err(Error::invalid("cadence must be positive"));
        }
        let span = time[time.len() - 1] - time[0];
        if !(span > 0.0) {
            return Err(Error::invalid(format!(
                "time span must be positive, got {span}"
            )));
        }
        let f_low = 1.0 / span;
        let f_nyquist = config.nyquist();
        if f_low >= f_nyquist {
            return Err(Error::invalid(format!(
                "lowest frequency {f_low:.4} is not below the Nyquist frequency {f_nyquist:.4}"
            )));
        }
        Self::linspace(f_low, f_nyquist, config.oversample * time.len())
    }

    /// Narrow grid `[(1 - half_width) / P, (1 + half_width) / P]` around a
    /// period, used by the refinement searches.
    pub fn around_period(period: f64, half_width: f64, n_points: usize) -> Result<Self> {
        if !(period > 0.0) || !period.is_finite() {
            return Err(Error::invalid(format!(
                "period must be positive and finite, got {period}"
            )));
        }
        if !(0.0..1.0).contains(&half_width) || half_width == 0.0 {
            return Err(Error::invalid(format!(
                "refinement half width must be in (0, 1), got {half_width}"
            )));
        }
        Self::linspace(
            (1.0 - half_width) / period,
            (1.0 + half_width) / period,
            n_points,
        )
    }

    /// Frequencies as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.frequencies
    }

    /// Number of frequencies.
    #[inline]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Always false for a constructed grid.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency at index `k`.
    #[inline]
    pub fn get(&self, k: usize) -> Option<f64> {
        self.frequencies.get(k).copied()
    }

    /// Consume into the underlying vector.
    pub fn into_vec(self) -> Vec<f64> {
        self.frequencies
    }
}

// ============================================================================
// Lomb-Scargle power
// ============================================================================

/// Compute Lomb-Scargle power of `flux(time)` at each frequency.
///
/// # Arguments
/// * `time` - Observation times (days), any spacing
/// * `flux` - Observed values, same length as `time`
/// * `frequencies` - Test frequencies in cycles/day
/// * `normalization` - Power normalization
///
/// # Errors
/// [`Error::InvalidInput`] for empty or mismatched arrays, fewer than two
/// samples, or non-finite values.
///
/// # Example
/// ```rust
/// use lcfold::spectrum::{lomb_scargle, Normalization};
/// use std::f64::consts::PI;
///
/// // Irregularly sampled sine wave
/// let times: Vec<f64> = (0..60)
///     .map(|i| i as f64 * 0.21 + 0.05 * (i as f64).sin())
///     .collect();
/// let period = 1.5;
/// let flux: Vec<f64> = times.iter().map(|&t| (2.0 * PI * t / period).sin()).collect();
/// let freqs: Vec<f64> = (1..=200).map(|k| k as f64 * 0.01).collect();
///
/// let power = lomb_scargle(&times, &flux, &freqs, Normalization::Standard).unwrap();
/// let best = power
///     .iter()
///     .enumerate()
///     .max_by(|a, b| a.1.total_cmp(b.1))
///     .map(|(k, _)| freqs[k])
///     .unwrap();
/// assert!((1.0 / best - period).abs() < 0.2);
/// ```
pub fn lomb_scargle(
    time: &[f64],
    flux: &[f64],
    frequencies: &[f64],
    normalization: Normalization,
) -> Result<Vec<f64>> {
    check_series(time, flux)?;

    let n = time.len();
    let w = 1.0 / n as f64;
    let mean = flux.iter().sum::<f64>() * w;
    let y: Vec<f64> = flux.iter().map(|&f| f - mean).collect();
    let yy: f64 = y.iter().map(|&v| v * v).sum::<f64>() * w;

    let power: Vec<f64> = slice_maybe_parallel!(frequencies)
        .map(|&freq| {
            let raw = lomb_scargle_single_freq(time, &y, w, 2.0 * PI * freq);
            normalize_power(raw, yy, normalization)
        })
        .collect();

    Ok(power)
}

fn check_series(time: &[f64], flux: &[f64]) -> Result<()> {
    if time.is_empty() || flux.is_empty() {
        return Err(Error::invalid("time and flux must not be empty"));
    }
    if time.len() != flux.len() {
        return Err(Error::invalid(format!(
            "time and flux must have the same length ({} vs {})",
            time.len(),
            flux.len()
        )));
    }
    if time.len() < 2 {
        return Err(Error::invalid("Lomb-Scargle needs at least 2 samples"));
    }
    if time.iter().chain(flux.iter()).any(|v| !v.is_finite()) {
        return Err(Error::invalid("time and flux must be finite"));
    }
    Ok(())
}

/// Raw (un-normalized) floating-mean power at one angular frequency.
///
/// `y` must already be centered; `w` is the uniform weight `1/n`.
fn lomb_scargle_single_freq(time: &[f64], y: &[f64], w: f64, omega: f64) -> f64 {
    if omega <= 0.0 {
        return 0.0;
    }

    // Time shift tau, including the floating-mean correction
    let mut s = 0.0;
    let mut c = 0.0;
    let mut s2 = 0.0;
    let mut c2 = 0.0;
    for &t in time.iter() {
        let (sin_wt, cos_wt) = (omega * t).sin_cos();
        s += sin_wt;
        c += cos_wt;
        s2 += 2.0 * sin_wt * cos_wt;
        c2 += 2.0 * (0.5 - sin_wt * sin_wt);
    }
    s *= w;
    c *= w;
    s2 = s2 * w - 2.0 * s * c;
    c2 = c2 * w - (c * c - s * s);
    let half_angle = 0.5 * s2.atan2(c2);

    let mut y_sum = 0.0;
    let mut yc = 0.0;
    let mut ys = 0.0;
    let mut cc = 0.0;
    let mut ss = 0.0;
    let mut c_tau = 0.0;
    let mut s_tau = 0.0;
    for (&t, &yi) in time.iter().zip(y.iter()) {
        let (sin_tau, cos_tau) = (omega * t - half_angle).sin_cos();
        y_sum += yi;
        yc += yi * cos_tau;
        ys += yi * sin_tau;
        cc += cos_tau * cos_tau;
        ss += sin_tau * sin_tau;
        c_tau += cos_tau;
        s_tau += sin_tau;
    }
    let y_mean = y_sum * w;
    let c_tau = c_tau * w;
    let s_tau = s_tau * w;
    let yc = yc * w - y_mean * c_tau;
    let ys = ys * w - y_mean * s_tau;
    let cc = (cc * w - c_tau * c_tau).max(POWER_EPS);
    let ss = (ss * w - s_tau * s_tau).max(POWER_EPS);

    yc * yc / cc + ys * ys / ss
}

fn normalize_power(raw: f64, yy: f64, normalization: Normalization) -> f64 {
    if yy <= 0.0 {
        return 0.0;
    }
    match normalization {
        Normalization::Standard => raw / yy,
        Normalization::Model => raw / (yy - raw).max(POWER_EPS),
        Normalization::Log => -(1.0 - raw / yy).max(POWER_EPS).ln(),
        Normalization::Psd => 0.5 * raw,
    }
}

// ============================================================================
// Power spectrum
// ============================================================================

/// Lomb-Scargle power aligned index-by-index with its frequency grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    grid: FrequencyGrid,
    power: Vec<f64>,
}

impl PowerSpectrum {
    /// Coarse spectrum of a lightcurve: explicit grid from the config if
    /// given, otherwise [`FrequencyGrid::for_lightcurve`].
    pub fn compute(lightcurve: &Lightcurve, config: &SpectrumConfig) -> Result<Self> {
        check_series(lightcurve.time(), lightcurve.flux())?;
        let grid = match &config.grid {
            Some(explicit) => FrequencyGrid::from_vec(explicit.clone())?,
            None => FrequencyGrid::for_lightcurve(lightcurve.time(), config)?,
        };
        log::debug!(
            "lomb-scargle for '{}': {} samples, {} frequencies in [{:.4}, {:.4}]",
            lightcurve.id(),
            lightcurve.len(),
            grid.len(),
            grid.as_slice()[0],
            grid.as_slice()[grid.len() - 1]
        );
        Self::on_grid(
            lightcurve.time(),
            lightcurve.flux(),
            grid,
            config.normalization,
        )
    }

    /// Spectrum of `flux(time)` on a given grid.
    pub fn on_grid(
        time: &[f64],
        flux: &[f64],
        grid: FrequencyGrid,
        normalization: Normalization,
    ) -> Result<Self> {
        let power = lomb_scargle(time, flux, grid.as_slice(), normalization)?;
        Ok(Self { grid, power })
    }

    /// The frequency grid.
    pub fn grid(&self) -> &FrequencyGrid {
        &self.grid
    }

    /// Frequencies (cycles/day).
    pub fn frequencies(&self) -> &[f64] {
        self.grid.as_slice()
    }

    /// Power at each frequency.
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Number of (frequency, power) pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.power.len()
    }

    /// Whether the spectrum is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Index of the first maximum of the power.
    pub fn argmax(&self) -> Option<usize> {
        argmax(&self.power)
    }

    /// Largest power value (0 for an empty spectrum).
    pub fn max_power(&self) -> f64 {
        self.argmax().map(|k| self.power[k]).unwrap_or(0.0)
    }

    /// Frequency of the highest power.
    pub fn peak_frequency(&self) -> Option<f64> {
        self.argmax().and_then(|k| self.grid.get(k))
    }

    /// Run the peak detector over the power.
    pub fn find_peaks(&self, config: &PeakConfig) -> Result<PeakSet> {
        find_peaks(&self.power, config)
    }

    /// Frequencies at the indices of a peak set from this spectrum.
    pub fn peak_frequencies(&self, peaks: &PeakSet) -> Vec<f64> {
        peaks
            .indices()
            .filter_map(|k| self.grid.get(k))
            .collect()
    }
}

/// Index of the first maximum, ignoring NaN.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (k, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((k, v)),
        }
    }
    best.map(|(k, _)| k)
}

/// Index of the first minimum, ignoring NaN.
pub(crate) fn argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (k, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((k, v)),
        }
    }
    best.map(|(k, _)| k)
}
