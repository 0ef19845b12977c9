//! Pipeline configuration.
//!
//! Every stage has its own settings struct with defaults; [`PipelineConfig`]
//! gathers them and can be loaded from JSON. The refinement objective has no
//! default and must always be named. Every other missing field falls back to
//! its default, so a config file only needs the values it changes:
//!
//! ```json
//! { "refine": "dispersion_min", "bins": 50, "clean": { "gap_threshold": 0.5 } }
//! ```

use crate::error::{Error, Result};
use crate::fold::SplitPolicy;
use crate::harmonics::HarmonicConfig;
use crate::lightcurve::CleanConfig;
use crate::peaks::PeakConfig;
use crate::refine::{RefineConfig, RefineMode};
use crate::spectrum::{PowerSpectrum, SpectrumConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How peak-detector thresholds are derived from the coarse spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakStrategy {
    /// [`PeakConfig::coarse`]: wide separation, low height and prominence
    /// floors, minimum width
    #[default]
    Coarse,
    /// [`PeakConfig::survey`]: separation of one oversampling step, only
    /// the dominant peaks
    Survey,
}

impl PeakStrategy {
    /// Peak settings for `spectrum`, computed from `n_samples` observations.
    pub fn peak_config(
        &self,
        spectrum: &PowerSpectrum,
        n_samples: usize,
        oversample: usize,
    ) -> PeakConfig {
        match self {
            PeakStrategy::Coarse => {
                PeakConfig::coarse(spectrum.len(), n_samples, spectrum.max_power())
            }
            PeakStrategy::Survey => PeakConfig::survey(oversample, spectrum.max_power()),
        }
    }
}

/// Settings for one pass of the period search pipeline.
///
/// There is no `Default`: build one with [`PipelineConfig::new`] and the
/// refinement objective of your choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Header lines skipped when loading lightcurve files
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
    /// Pre-spectral cleaning
    #[serde(default)]
    pub clean: CleanConfig,
    /// Coarse spectrum
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    /// Peak threshold derivation
    #[serde(default)]
    pub peaks: PeakStrategy,
    /// Candidate band and harmonic tolerance
    #[serde(default)]
    pub harmonics: HarmonicConfig,
    /// Refinement objective
    pub refine: RefineMode,
    /// Refinement window
    #[serde(default)]
    pub refine_config: RefineConfig,
    /// Number of phase bins
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Chunking of phase-sorted samples into bins
    #[serde(default)]
    pub split: SplitPolicy,
    /// Known period (days); skips the spectral search and refinement
    #[serde(default)]
    pub period: Option<f64>,
}

fn default_skip_rows() -> usize {
    crate::io::DEFAULT_SKIP_ROWS
}

fn default_bins() -> usize {
    100
}

impl PipelineConfig {
    /// Default settings for every stage, refining with `refine`.
    pub fn new(refine: RefineMode) -> Self {
        Self {
            skip_rows: default_skip_rows(),
            clean: CleanConfig::default(),
            spectrum: SpectrumConfig::default(),
            peaks: PeakStrategy::default(),
            harmonics: HarmonicConfig::default(),
            refine,
            refine_config: RefineConfig::default(),
            bins: default_bins(),
            split: SplitPolicy::default(),
            period: None,
        }
    }

    /// Check settings that no stage can recover from.
    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(Error::invalid("bins must be at least 1"));
        }
        if self.spectrum.oversample == 0 {
            return Err(Error::invalid("oversample must be at least 1"));
        }
        if self.refine_config.n_points == 0 {
            return Err(Error::invalid("refinement needs at least one trial frequency"));
        }
        if !(self.harmonics.f_min < self.harmonics.f_max) {
            return Err(Error::invalid(format!(
                "empty frequency band ({}, {})",
                self.harmonics.f_min, self.harmonics.f_max
            )));
        }
        if let Some(period) = self.period {
            if !(period > 0.0) || !period.is_finite() {
                return Err(Error::invalid(format!(
                    "known period must be positive and finite, got {period}"
                )));
            }
        }
        Ok(())
    }
}

/// Load and validate a pipeline configuration from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: PipelineConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Load a configuration file with `refine` taking the place of any
/// objective the file names, so the file may leave it out.
pub fn load_config_with_refine(path: impl AsRef<Path>, refine: RefineMode) -> Result<PipelineConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    let mut value: serde_json::Value = serde_json::from_str(&contents)?;
    let Some(fields) = value.as_object_mut() else {
        return Err(Error::invalid("pipeline configuration must be a JSON object"));
    };
    fields.insert("refine".to_string(), serde_json::to_value(refine)?);
    let config: PipelineConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

/// Write a configuration as pretty-printed JSON.
pub fn save_config(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<()> {
    fs::write(path.as_ref(), serde_json::to_string_pretty(config)?)?;
    Ok(())
}
