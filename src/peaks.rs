//! Peak detection in 1D signals (power spectra).
//!
//! Local maxima are filtered in a fixed order, each stage seeing only the
//! survivors of the previous one:
//! 1. local maxima (a flat plateau is reported at its midpoint)
//! 2. minimum height
//! 3. minimum index distance, keeping the higher of two close peaks
//! 4. minimum prominence
//! 5. minimum width, measured at `rel_height` of the prominence

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Width of a peak, measured on the line `height - rel_height * prominence`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakWidth {
    /// Width in samples
    pub width: f64,
    /// Evaluation height of the width line
    pub width_height: f64,
    /// Interpolated left crossing (fractional index)
    pub left_ip: f64,
    /// Interpolated right crossing (fractional index)
    pub right_ip: f64,
}

/// A detected local maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    /// Index into the signal
    pub index: usize,
    /// Signal value at the peak
    pub height: f64,
    /// Vertical drop to the higher of the two surrounding bases
    pub prominence: f64,
    /// Index of the lowest point on the left before a higher sample
    pub left_base: usize,
    /// Index of the lowest point on the right before a higher sample
    pub right_base: usize,
    /// Width data, present when a width constraint was requested
    pub width: Option<PeakWidth>,
}

/// Peaks ordered by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakSet {
    pub peaks: Vec<Peak>,
}

impl PeakSet {
    /// Peak indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.peaks.iter().map(|p| p.index)
    }

    /// Number of peaks.
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    /// Whether no peak survived the constraints.
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Peaks sorted by height, highest first.
    pub fn by_height(&self) -> Vec<&Peak> {
        let mut sorted: Vec<&Peak> = self.peaks.iter().collect();
        sorted.sort_by(|a, b| b.height.total_cmp(&a.height));
        sorted
    }
}

/// Constraints for [`find_peaks`]. `None` disables a constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Minimum index distance between accepted peaks (>= 1)
    pub distance: Option<f64>,
    /// Minimum peak height
    pub height: Option<f64>,
    /// Minimum peak prominence
    pub prominence: Option<f64>,
    /// Minimum peak width in samples
    pub width: Option<f64>,
    /// Relative height at which widths are measured
    pub rel_height: f64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            distance: None,
            height: None,
            prominence: None,
            width: None,
            rel_height: 0.5,
        }
    }
}

impl PeakConfig {
    /// Constraints for coarse period guessing on a default grid.
    ///
    /// `distance = 5 * floor(grid_len / n_samples)`, `height = max / 20`,
    /// `prominence = max / 5`, minimum width 0.2 samples. Grids with fewer
    /// points than samples get no distance constraint: a distance of 0 would
    /// make [`find_peaks`] reject the spectrum and fail the whole file.
    pub fn coarse(grid_len: usize, n_samples: usize, max_power: f64) -> Self {
        let per_sample = if n_samples == 0 { 0 } else { grid_len / n_samples };
        Self {
            distance: (per_sample > 0).then(|| (5 * per_sample) as f64),
            height: Some(max_power / 20.0),
            prominence: Some(max_power / 5.0),
            width: Some(0.2),
            rel_height: 0.5,
        }
    }

    /// Constraints for a quick look at the strongest features only:
    /// `distance = oversample`, `height = max / 2`, `prominence = max / 3`.
    pub fn survey(oversample: usize, max_power: f64) -> Self {
        Self {
            distance: Some(oversample as f64),
            height: Some(max_power / 2.0),
            prominence: Some(max_power / 3.0),
            width: None,
            rel_height: 0.5,
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(d) = self.distance {
            if !(d >= 1.0) {
                return Err(Error::invalid(format!(
                    "peak distance must be >= 1, got {d}"
                )));
            }
        }
        if !(self.rel_height >= 0.0) {
            return Err(Error::invalid(format!(
                "rel_height must be >= 0, got {}",
                self.rel_height
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Detection stages
// ============================================================================

/// Find local maxima: samples strictly greater than the left neighbour and
/// the first different sample to the right. Plateaus report their midpoint.
fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }
    let i_max = n - 1;
    let mut i = 1;
    while i < i_max {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < i_max && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Keep peaks at least `distance` samples apart, higher peaks first.
fn select_by_distance(peaks: &[usize], signal: &[f64], distance: f64) -> Vec<usize> {
    let distance = distance.ceil() as usize;
    let n = peaks.len();
    let mut keep = vec![true; n];

    let mut priority: Vec<usize> = (0..n).collect();
    priority.sort_by(|&a, &b| signal[peaks[a]].total_cmp(&signal[peaks[b]]));

    for &j in priority.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep.iter())
        .filter(|(_, &kept)| kept)
        .map(|(&p, _)| p)
        .collect()
}

/// Prominence and bases of one peak.
///
/// Walks outward until a strictly higher sample or the signal edge; the base
/// on each side is the lowest sample seen.
fn prominence(signal: &[f64], peak: usize) -> (f64, usize, usize) {
    let peak_val = signal[peak];

    let mut left_base = peak;
    let mut left_min = peak_val;
    for i in (0..=peak).rev() {
        if signal[i] > peak_val {
            break;
        }
        if signal[i] < left_min {
            left_min = signal[i];
            left_base = i;
        }
    }

    let mut right_base = peak;
    let mut right_min = peak_val;
    for i in peak..signal.len() {
        if signal[i] > peak_val {
            break;
        }
        if signal[i] < right_min {
            right_min = signal[i];
            right_base = i;
        }
    }

    (peak_val - left_min.max(right_min), left_base, right_base)
}

/// Width of one peak between its bases at `rel_height` of its prominence.
fn width(signal: &[f64], peak: &Peak, rel_height: f64) -> PeakWidth {
    let height = signal[peak.index] - peak.prominence * rel_height;

    let mut i = peak.index;
    while peak.left_base < i && height < signal[i] {
        i -= 1;
    }
    let mut left_ip = i as f64;
    if signal[i] < height {
        left_ip += (height - signal[i]) / (signal[i + 1] - signal[i]);
    }

    let mut i = peak.index;
    while i < peak.right_base && height < signal[i] {
        i += 1;
    }
    let mut right_ip = i as f64;
    if signal[i] < height {
        right_ip -= (height - signal[i]) / (signal[i - 1] - signal[i]);
    }

    PeakWidth {
        width: right_ip - left_ip,
        width_height: height,
        left_ip,
        right_ip,
    }
}

/// Find peaks in `signal` satisfying every constraint in `config`.
///
/// # Returns
/// Peaks ordered by index. An empty set is a valid result.
///
/// # Errors
/// [`Error::InvalidInput`] if `distance < 1`, `rel_height < 0`, or the
/// signal contains NaN.
pub fn find_peaks(signal: &[f64], config: &PeakConfig) -> Result<PeakSet> {
    config.validate()?;
    if signal.iter().any(|v| v.is_nan()) {
        return Err(Error::invalid("signal contains NaN"));
    }

    let mut candidates = local_maxima(signal);

    if let Some(min_height) = config.height {
        candidates.retain(|&p| signal[p] >= min_height);
    }

    if let Some(distance) = config.distance {
        candidates = select_by_distance(&candidates, signal, distance);
    }

    let mut peaks: Vec<Peak> = candidates
        .into_iter()
        .map(|index| {
            let (prominence, left_base, right_base) = prominence(signal, index);
            Peak {
                index,
                height: signal[index],
                prominence,
                left_base,
                right_base,
                width: None,
            }
        })
        .collect();

    if let Some(min_prominence) = config.prominence {
        peaks.retain(|p| p.prominence >= min_prominence);
    }

    if let Some(min_width) = config.width {
        for peak in peaks.iter_mut() {
            peak.width = Some(width(signal, peak, config.rel_height));
        }
        peaks.retain(|p| p.width.map_or(false, |w| w.width >= min_width));
    }

    Ok(PeakSet { peaks })
}
