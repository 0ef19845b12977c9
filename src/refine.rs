//! Period refinement around a coarse estimate.
//!
//! Each mode scans a narrow frequency grid `[(1 - w)/P, (1 + w)/P]` and
//! scores every trial frequency with one objective:
//!
//! - [`RefineMode::PowerMax`]: Lomb-Scargle power, maximized.
//! - [`RefineMode::DispersionMin`]: total absolute variation of the flux
//!   folded at the trial frequency, minimized.
//! - [`RefineMode::BinnedStdMin`]: sum of flux standard deviations over
//!   fixed-size chunks of the folded flux, minimized.
//!
//! Grid evaluation runs through [`iter_maybe_parallel!`](crate::iter_maybe_parallel)
//! and keeps grid order, so ties resolve to the lowest frequency either way.

use crate::error::{Error, Result};
use crate::fold::{flux_in_phase_order, nan_std};
use crate::iter_maybe_parallel;
use crate::lightcurve::Lightcurve;
use crate::spectrum::{argmax, argmin, lomb_scargle, FrequencyGrid, Normalization};
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;
use serde::{Deserialize, Serialize};

/// Objective used to refine a coarse period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineMode {
    /// Maximum Lomb-Scargle power
    PowerMax,
    /// Minimum phase-folded dispersion
    DispersionMin,
    /// Minimum summed standard deviation of phase-folded chunks
    BinnedStdMin,
}

impl RefineMode {
    /// All modes, in declaration order.
    pub const ALL: [RefineMode; 3] = [
        RefineMode::PowerMax,
        RefineMode::DispersionMin,
        RefineMode::BinnedStdMin,
    ];

    /// Short name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            RefineMode::PowerMax => "power_max",
            RefineMode::DispersionMin => "dispersion_min",
            RefineMode::BinnedStdMin => "binned_std_min",
        }
    }

    fn minimizes(&self) -> bool {
        !matches!(self, RefineMode::PowerMax)
    }
}

/// Settings for [`refine_period`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Fractional half width of the search window around `1/P`
    pub half_width: f64,
    /// Number of trial frequencies
    pub n_points: usize,
    /// Chunk size for [`RefineMode::BinnedStdMin`]
    pub bin_size: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            half_width: 0.05,
            n_points: 2000,
            bin_size: 10,
        }
    }
}

/// Result of a refinement scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    /// Mode that produced this result
    pub mode: RefineMode,
    /// Refined period (days)
    pub period: f64,
    /// Refined frequency (cycles/day), `1 / period`
    pub frequency: f64,
    /// Trial frequencies
    pub grid: FrequencyGrid,
    /// Objective value at each trial frequency
    pub objective: Vec<f64>,
    /// Index of the selected trial frequency
    pub best_index: usize,
}

/// Refine a coarse period estimate.
///
/// # Arguments
/// * `lightcurve` - Cleaned lightcurve
/// * `coarse_period` - Starting period in days
/// * `mode` - Objective to optimize
/// * `config` - Search window settings
///
/// # Errors
/// * [`Error::InvalidInput`] for a non-positive or non-finite period, an
///   invalid window, or `bin_size == 0`
/// * [`Error::InsufficientData`] for fewer than 2 samples, or fewer than
///   `bin_size` samples in [`RefineMode::BinnedStdMin`]
pub fn refine_period(
    lightcurve: &Lightcurve,
    coarse_period: f64,
    mode: RefineMode,
    config: &RefineConfig,
) -> Result<Refinement> {
    let needed = match mode {
        RefineMode::BinnedStdMin => {
            if config.bin_size == 0 {
                return Err(Error::invalid("refinement bin size must be at least 1"));
            }
            config.bin_size.max(2)
        }
        _ => 2,
    };
    if lightcurve.len() < needed {
        return Err(Error::InsufficientData {
            needed,
            got: lightcurve.len(),
        });
    }

    let grid = FrequencyGrid::around_period(coarse_period, config.half_width, config.n_points)?;
    let time = lightcurve.time();
    let flux = lightcurve.flux();

    let objective = match mode {
        RefineMode::PowerMax => {
            lomb_scargle(time, flux, grid.as_slice(), Normalization::Standard)?
        }
        RefineMode::DispersionMin => {
            let freqs = grid.as_slice();
            iter_maybe_parallel!(0..freqs.len())
                .map(|k| dispersion(&flux_in_phase_order(time, flux, freqs[k])))
                .collect()
        }
        RefineMode::BinnedStdMin => {
            let freqs = grid.as_slice();
            let bin_size = config.bin_size;
            iter_maybe_parallel!(0..freqs.len())
                .map(|k| binned_std(&flux_in_phase_order(time, flux, freqs[k]), bin_size))
                .collect()
        }
    };

    let best = if mode.minimizes() {
        argmin(&objective)
    } else {
        argmax(&objective)
    };
    let best_index = best.ok_or_else(|| {
        Error::NoPeriodFound(format!(
            "{} objective is undefined across the refinement window",
            mode.name()
        ))
    })?;
    let frequency = grid.as_slice()[best_index];
    let period = 1.0 / frequency;

    log::info!(
        "refined period for '{}' ({}): {:.6} -> {:.6} d",
        lightcurve.id(),
        mode.name(),
        coarse_period,
        period
    );

    Ok(Refinement {
        mode,
        period,
        frequency,
        grid,
        objective,
        best_index,
    })
}

/// Sum of absolute differences between consecutive values.
pub fn dispersion(sorted_flux: &[f64]) -> f64 {
    sorted_flux.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
}

/// Sum of NaN-ignoring standard deviations over consecutive full chunks of
/// `bin_size` values; a trailing partial chunk is ignored.
pub fn binned_std(sorted_flux: &[f64], bin_size: usize) -> f64 {
    // every full chunk is scored, not only those starting below len / bin_size
    sorted_flux
        .chunks_exact(bin_size)
        .map(nan_std)
        .filter(|s| !s.is_nan())
        .sum()
}
