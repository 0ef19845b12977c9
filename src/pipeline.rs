//! Staged processing of one lightcurve.
//!
//! The stages run in a fixed order and each one produces an immutable value
//! consumed by the next:
//!
//! ```text
//! clean -> spectrum -> peaks -> guess -> refine -> fold -> bin
//! ```
//!
//! With a known period in [`PipelineConfig::period`] the spectral stages are
//! skipped and folding starts right after cleaning.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fold::{phase_fold, BinnedFold, FoldedLightcurve};
use crate::harmonics::guess_frequency;
use crate::io::{read_lightcurve, write_folded};
use crate::lightcurve::Lightcurve;
use crate::peaks::PeakSet;
use crate::refine::{refine_period, Refinement, RefineMode};
use crate::spectrum::PowerSpectrum;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Cleaned,
    Spectrum,
    Peaks,
    Guessed,
    Refined,
    Folded,
    Binned,
}

/// Output of the spectral search for a coarse period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSearch {
    /// Coarse Lomb-Scargle spectrum
    pub spectrum: PowerSpectrum,
    /// Detected peaks in `spectrum`
    pub peaks: PeakSet,
    /// Frequencies of the detected peaks, ascending
    pub candidates: Vec<f64>,
    /// Harmonic-aware frequency guess (cycles/day)
    pub frequency: f64,
}

impl PeriodSearch {
    /// Coarse period in days.
    pub fn period(&self) -> f64 {
        1.0 / self.frequency
    }
}

/// Everything produced for one lightcurve.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    /// Samples before cleaning
    pub raw_samples: usize,
    /// Cleaned lightcurve
    pub cleaned: Lightcurve,
    /// Spectral search, absent when the period was given
    pub search: Option<PeriodSearch>,
    /// Refinement scan, absent when the period was given
    pub refinement: Option<Refinement>,
    /// Final period (days)
    pub period: f64,
    /// Phase-folded samples
    pub folded: FoldedLightcurve,
    /// Binned fold
    pub binned: BinnedFold,
    /// Completed stages in order
    pub stages: Vec<PipelineStage>,
}

/// Serializable digest of a [`PipelineResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub id: String,
    pub raw_samples: usize,
    pub cleaned_samples: usize,
    pub candidates: Vec<f64>,
    pub coarse_period: Option<f64>,
    pub refine_mode: Option<RefineMode>,
    pub period: f64,
    pub bins: usize,
    pub stages: Vec<PipelineStage>,
}

impl PipelineResult {
    /// Lightcurve id.
    pub fn id(&self) -> &str {
        self.cleaned.id()
    }

    /// Last completed stage.
    pub fn stage(&self) -> Option<PipelineStage> {
        self.stages.last().copied()
    }

    /// Digest for reports.
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            id: self.id().to_string(),
            raw_samples: self.raw_samples,
            cleaned_samples: self.cleaned.len(),
            candidates: self
                .search
                .as_ref()
                .map(|s| s.candidates.clone())
                .unwrap_or_default(),
            coarse_period: self.search.as_ref().map(PeriodSearch::period),
            refine_mode: self.refinement.as_ref().map(|r| r.mode),
            period: self.period,
            bins: self.binned.len(),
            stages: self.stages.clone(),
        }
    }

    /// Write the binned fold for two cycles to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        write_folded(path, &self.binned, self.period)
    }
}

/// Period search and folding for single lightcurves.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline after validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Coarse spectrum, peaks and harmonic-aware frequency guess of an
    /// already cleaned lightcurve.
    pub fn search_period(&self, cleaned: &Lightcurve) -> Result<PeriodSearch> {
        let config = &self.config;
        let spectrum = PowerSpectrum::compute(cleaned, &config.spectrum)?;
        let peak_config =
            config
                .peaks
                .peak_config(&spectrum, cleaned.len(), config.spectrum.oversample);
        let peaks = spectrum.find_peaks(&peak_config)?;
        let candidates = spectrum.peak_frequencies(&peaks);
        log::debug!(
            "'{}': {} peaks, candidates {:?}",
            cleaned.id(),
            peaks.len(),
            candidates
        );

        let frequency = guess_frequency(&candidates, &config.harmonics)?;
        log::info!(
            "guessed period for '{}': {:.6} d ({:.6} c/d)",
            cleaned.id(),
            1.0 / frequency,
            frequency
        );

        Ok(PeriodSearch {
            spectrum,
            peaks,
            candidates,
            frequency,
        })
    }

    /// Run every stage on a raw lightcurve.
    pub fn run(&self, lightcurve: &Lightcurve) -> Result<PipelineResult> {
        let config = &self.config;
        let mut stages = Vec::with_capacity(7);

        let cleaned = lightcurve.clean(&config.clean)?;
        stages.push(PipelineStage::Cleaned);

        let (search, refinement, period) = match config.period {
            Some(period) => {
                log::info!("using known period {period:.6} d for '{}'", cleaned.id());
                (None, None, period)
            }
            None => {
                let search = self.search_period(&cleaned)?;
                stages.extend([
                    PipelineStage::Spectrum,
                    PipelineStage::Peaks,
                    PipelineStage::Guessed,
                ]);
                let refinement = refine_period(
                    &cleaned,
                    search.period(),
                    config.refine,
                    &config.refine_config,
                )?;
                stages.push(PipelineStage::Refined);
                let period = refinement.period;
                (Some(search), Some(refinement), period)
            }
        };

        let folded = phase_fold(cleaned.time(), cleaned.flux(), period)?;
        stages.push(PipelineStage::Folded);

        let binned = folded.bin(config.bins, config.split)?;
        stages.push(PipelineStage::Binned);

        Ok(PipelineResult {
            raw_samples: lightcurve.len(),
            cleaned,
            search,
            refinement,
            period,
            folded,
            binned,
            stages,
        })
    }

    /// Load `path` and run every stage.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<PipelineResult> {
        let lightcurve = read_lightcurve(path, self.config.skip_rows)?;
        self.run(&lightcurve)
    }

    /// Output path for a result: the lightcurve id inside `output_dir`.
    pub fn output_path(output_dir: &Path, result: &PipelineResult) -> PathBuf {
        output_dir.join(result.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::simulation::sinusoid;

    #[test]
    fn test_known_period_skips_search() {
        let lc = sinusoid("known", 2.5, 0.01, 20.0, 30.0);
        let config = PipelineConfig {
            period: Some(2.5),
            bins: 40,
            ..PipelineConfig::new(RefineMode::DispersionMin)
        };
        let result = Pipeline::new(config).unwrap().run(&lc).unwrap();

        assert!(result.search.is_none());
        assert!(result.refinement.is_none());
        assert_eq!(result.period, 2.5);
        assert_eq!(result.binned.len(), 40);
        assert_eq!(
            result.stages,
            vec![
                PipelineStage::Cleaned,
                PipelineStage::Folded,
                PipelineStage::Binned
            ]
        );
    }

    #[test]
    fn test_full_run_records_all_stages() {
        let lc = sinusoid("full", 2.5, 0.01, 20.0, 30.0);
        let config = PipelineConfig::new(RefineMode::PowerMax);
        let result = Pipeline::new(config).unwrap().run(&lc).unwrap();

        assert_eq!(result.stage(), Some(PipelineStage::Binned));
        assert_eq!(result.stages.len(), 7);
        assert!(result.stages.windows(2).all(|w| w[0] < w[1]));
        assert!(result.raw_samples > result.cleaned.len());

        let summary = result.summary();
        assert_eq!(summary.id, "full");
        assert_eq!(summary.refine_mode, Some(RefineMode::PowerMax));
        assert!(!summary.candidates.is_empty());
        assert!((summary.period - 2.5).abs() / 2.5 < 0.01);
    }

    #[test]
    fn test_flat_lightcurve_has_no_period() {
        let time: Vec<f64> = (0..480).map(|i| i as f64 / 48.0).collect();
        let lc = Lightcurve::new("flat", time, vec![1.0; 480]).unwrap();
        let err = Pipeline::new(PipelineConfig::new(RefineMode::BinnedStdMin))
            .unwrap()
            .run(&lc)
            .unwrap_err();
        assert!(matches!(err, Error::NoPeriodFound(_)));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = PipelineConfig {
            bins: 0,
            ..PipelineConfig::new(RefineMode::PowerMax)
        };
        assert!(Pipeline::new(config).is_err());
    }
}
