//! # lcfold
//!
//! Period search and phase folding for irregularly sampled lightcurves.
//!
//! This crate provides:
//! - Lightcurve cleaning (start trimming, trimming around observing gaps)
//! - Generalized Lomb-Scargle periodograms on arbitrary frequency grids
//! - Peak detection with height, distance, prominence and width constraints
//! - Harmonic-aware selection of the fundamental frequency
//! - Period refinement by power maximum, phase dispersion or binned scatter
//! - Phase folding, binning and folded-lightcurve text output
//! - Batch processing of lightcurve directories
//!
//! ## Units
//!
//! Times are in days, frequencies in cycles per day, flux is normalized to a
//! nominal level of 1.0.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lcfold::{Pipeline, PipelineConfig, RefineMode};
//!
//! let config = PipelineConfig::new(RefineMode::PowerMax);
//! let pipeline = Pipeline::new(config)?;
//! let result = pipeline.run_file("lightcurves/KIC_0042.txt")?;
//! println!("{}: P = {:.6} d", result.id(), result.period);
//! result.write("folded/KIC_0042")?;
//! # Ok::<(), lcfold::Error>(())
//! ```

#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

pub mod parallel;

pub mod batch;
pub mod config;
pub mod error;
pub mod fold;
pub mod harmonics;
pub mod io;
pub mod lightcurve;
pub mod peaks;
pub mod pipeline;
pub mod refine;
pub mod simulation;
pub mod spectrum;

pub use error::{Error, Result};

// Re-export the pipeline surface
pub use batch::{run_batch, BatchConfig, BatchReport};
pub use config::{load_config, load_config_with_refine, PeakStrategy, PipelineConfig};
pub use pipeline::{Pipeline, PipelineResult, PipelineStage, PipelineSummary};

// Re-export stage types
pub use fold::{phase_fold, BinnedFold, FoldedLightcurve, SplitPolicy};
pub use harmonics::{select_fundamental, HarmonicConfig, HarmonicSelection};
pub use lightcurve::{CleanConfig, Lightcurve};
pub use peaks::{find_peaks, Peak, PeakConfig, PeakSet};
pub use refine::{refine_period, RefineConfig, RefineMode, Refinement};
pub use spectrum::{lomb_scargle, FrequencyGrid, Normalization, PowerSpectrum, SpectrumConfig};
