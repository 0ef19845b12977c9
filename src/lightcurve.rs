//! Lightcurve container and the pre-spectral cleaning rule.
//!
//! A [`Lightcurve`] owns parallel `time` (days) and `flux` (normalized,
//! nominally 1.0) vectors plus an identifier. Samples are expected in
//! ascending time order; [`Lightcurve::validate`] checks this before any
//! stage that differences or searches for gaps.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings for [`Lightcurve::clean`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Samples at or before this many days after the first one are dropped.
    pub trim_start: f64,
    /// Consecutive time difference (days) that counts as a gap.
    pub gap_threshold: f64,
    /// Samples within this many days at or after the last sample before a
    /// gap are dropped, that sample included.
    pub gap_trim: f64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            trim_start: 0.25,
            gap_threshold: 1.0,
            gap_trim: 0.25,
        }
    }
}

/// An ordered series of (time, flux) observations of one target.
#[derive(Debug, Clone, PartialEq)]
pub struct Lightcurve {
    id: String,
    time: Vec<f64>,
    flux: Vec<f64>,
}

impl Lightcurve {
    /// Create a lightcurve from parallel time and flux arrays.
    ///
    /// Fails with [`Error::InvalidInput`] when the arrays differ in length.
    pub fn new(id: impl Into<String>, time: Vec<f64>, flux: Vec<f64>) -> Result<Self> {
        if time.len() != flux.len() {
            return Err(Error::invalid(format!(
                "time and flux must have the same length ({} vs {})",
                time.len(),
                flux.len()
            )));
        }
        Ok(Self {
            id: id.into(),
            time,
            flux,
        })
    }

    /// Create a lightcurve from `(time, flux)` pairs.
    pub fn from_samples(
        id: impl Into<String>,
        samples: impl IntoIterator<Item = (f64, f64)>,
    ) -> Self {
        let (time, flux) = samples.into_iter().unzip();
        Self {
            id: id.into(),
            time,
            flux,
        }
    }

    /// Identifier (file stem for loaded lightcurves).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Observation times in days.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Normalized flux values.
    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the lightcurve holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Iterate over `(time, flux)` pairs.
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time.iter().copied().zip(self.flux.iter().copied())
    }

    /// Total time span `t_last - t_first` (0 for fewer than two samples).
    pub fn span(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(&first), Some(&last)) => last - first,
            _ => 0.0,
        }
    }

    /// Check that the lightcurve is usable by the spectral stages: non-empty,
    /// finite times in non-decreasing order.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::invalid(format!("lightcurve '{}' is empty", self.id)));
        }
        if let Some(i) = self.time.iter().position(|t| !t.is_finite()) {
            return Err(Error::invalid(format!(
                "lightcurve '{}' has a non-finite time at sample {}",
                self.id, i
            )));
        }
        if let Some(i) = self.time.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::invalid(format!(
                "lightcurve '{}' is not sorted by time (sample {} precedes {})",
                self.id,
                i + 1,
                i
            )));
        }
        Ok(())
    }

    /// Apply the data-quality filter used before spectral estimation.
    ///
    /// 1. Recenter time on the first sample.
    /// 2. Keep only samples with `t > trim_start`.
    /// 3. On the trimmed series, for each gap `t[i+1] - t[i] >= gap_threshold`
    ///    drop the samples with `0 <= t - t[i] <= gap_trim`. The window opens
    ///    at the last sample before the gap, so with the default settings only
    ///    that sample goes and every post-gap sample is kept.
    pub fn clean(&self, config: &CleanConfig) -> Result<Lightcurve> {
        self.validate()?;

        let t0 = self.time[0];
        let (mut time, mut flux): (Vec<f64>, Vec<f64>) = self
            .samples()
            .map(|(t, f)| (t - t0, f))
            .filter(|&(t, _)| t > config.trim_start)
            .unzip();

        let gap_starts: Vec<f64> = time
            .windows(2)
            .filter(|w| w[1] - w[0] >= config.gap_threshold)
            .map(|w| w[0])
            .collect();

        for gap_start in gap_starts {
            let (kept_t, kept_f): (Vec<f64>, Vec<f64>) = time
                .iter()
                .copied()
                .zip(flux.iter().copied())
                .filter(|&(t, _)| t < gap_start || t - gap_start > config.gap_trim)
                .unzip();
            time = kept_t;
            flux = kept_f;
        }

        log::debug!(
            "cleaned lightcurve '{}': {} -> {} samples",
            self.id,
            self.len(),
            time.len()
        );

        Ok(Lightcurve {
            id: self.id.clone(),
            time,
            flux,
        })
    }
}
