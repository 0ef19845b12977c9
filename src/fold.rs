//! Phase folding and binning.
//!
//! Folding maps each time onto `phase = (t mod P) / P` in `[0, 1)` and
//! reorders the samples by phase with a stable sort, so equal phases keep
//! their original order. Binning splits the phase-ordered samples into N
//! contiguous chunks and summarizes each chunk by its mean phase, mean flux
//! and flux standard deviation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How `len` samples are divided into `n` contiguous chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Every chunk holds `len / n` samples; the last one also takes the
    /// `len % n` remainder.
    #[default]
    RemainderLast,
    /// The first `len % n` chunks hold one extra sample (numpy
    /// `array_split`).
    Balanced,
}

/// Index ranges of `n` contiguous chunks covering `0..len`.
///
/// The ranges are in order, non-overlapping, and their union is `0..len`.
/// Chunks may be empty when `len < n`.
pub fn split_ranges(len: usize, n: usize, policy: SplitPolicy) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let base = len / n;
    let extra = len % n;

    let mut ranges = Vec::with_capacity(n);
    let mut start = 0;
    for k in 0..n {
        let size = match policy {
            SplitPolicy::RemainderLast if k == n - 1 => base + extra,
            SplitPolicy::RemainderLast => base,
            SplitPolicy::Balanced if k < extra => base + 1,
            SplitPolicy::Balanced => base,
        };
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// Phase of `t` for period `period`, in `[0, 1)`.
#[inline]
pub fn phase_of(t: f64, period: f64) -> f64 {
    wrap_unit(t.rem_euclid(period) / period)
}

/// Phase of `t` for frequency `frequency`, computed as `(t mod (1/f)) * f`.
#[inline]
pub(crate) fn phase_at_frequency(t: f64, frequency: f64) -> f64 {
    wrap_unit(t.rem_euclid(1.0 / frequency) * frequency)
}

#[inline]
fn wrap_unit(phase: f64) -> f64 {
    if phase >= 1.0 {
        0.0
    } else {
        phase
    }
}

/// Stable argsort of phases.
pub(crate) fn phase_order(phase: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..phase.len()).collect();
    order.sort_by(|&a, &b| phase[a].total_cmp(&phase[b]));
    order
}

/// Flux values reordered by ascending phase at `frequency`.
pub(crate) fn flux_in_phase_order(time: &[f64], flux: &[f64], frequency: f64) -> Vec<f64> {
    let phase: Vec<f64> = time
        .iter()
        .map(|&t| phase_at_frequency(t, frequency))
        .collect();
    phase_order(&phase).into_iter().map(|i| flux[i]).collect()
}

/// Arithmetic mean (NaN propagates, NaN for an empty slice).
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation ignoring NaN values.
///
/// Returns NaN when no finite-or-infinite value remains.
pub fn nan_std(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
    if count == 0 {
        return f64::NAN;
    }
    let mu = sum / count as f64;
    let ss: f64 = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|&v| (v - mu) * (v - mu))
        .sum();
    (ss / count as f64).sqrt()
}

// ============================================================================
// Folded lightcurve
// ============================================================================

/// Samples reordered by phase for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedLightcurve {
    period: f64,
    time: Vec<f64>,
    phase: Vec<f64>,
    flux: Vec<f64>,
}

/// Fold `flux(time)` on `period`.
///
/// # Errors
/// [`Error::InvalidInput`] for empty or mismatched arrays or a period that is
/// not positive and finite.
pub fn phase_fold(time: &[f64], flux: &[f64], period: f64) -> Result<FoldedLightcurve> {
    if time.is_empty() || time.len() != flux.len() {
        return Err(Error::invalid(format!(
            "cannot fold {} times against {} flux values",
            time.len(),
            flux.len()
        )));
    }
    if !(period > 0.0) || !period.is_finite() {
        return Err(Error::invalid(format!(
            "period must be positive and finite, got {period}"
        )));
    }

    let raw_phase: Vec<f64> = time.iter().map(|&t| phase_of(t, period)).collect();
    let order = phase_order(&raw_phase);

    Ok(FoldedLightcurve {
        period,
        time: order.iter().map(|&i| time[i]).collect(),
        phase: order.iter().map(|&i| raw_phase[i]).collect(),
        flux: order.iter().map(|&i| flux[i]).collect(),
    })
}

impl FoldedLightcurve {
    /// Folding period.
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Original times in phase order.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Ascending phases in `[0, 1)`.
    pub fn phase(&self) -> &[f64] {
        &self.phase
    }

    /// Flux in phase order.
    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.flux.len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    /// Bin into `n` contiguous chunks of the phase-ordered samples.
    ///
    /// # Errors
    /// [`Error::InvalidInput`] for `n == 0`; [`Error::InsufficientData`] when
    /// there are fewer samples than bins.
    pub fn bin(&self, n: usize, policy: SplitPolicy) -> Result<BinnedFold> {
        if n == 0 {
            return Err(Error::invalid("bin count must be at least 1"));
        }
        if self.len() < n {
            return Err(Error::InsufficientData {
                needed: n,
                got: self.len(),
            });
        }

        let ranges = split_ranges(self.len(), n, policy);
        let mut binned = BinnedFold {
            phase: Vec::with_capacity(n),
            flux: Vec::with_capacity(n),
            flux_err: Vec::with_capacity(n),
            counts: Vec::with_capacity(n),
        };
        for range in ranges {
            binned.phase.push(mean(&self.phase[range.clone()]));
            binned.flux.push(mean(&self.flux[range.clone()]));
            binned.flux_err.push(nan_std(&self.flux[range.clone()]));
            binned.counts.push(range.len());
        }
        Ok(binned)
    }
}

// ============================================================================
// Binned fold
// ============================================================================

/// Per-bin summary of a folded lightcurve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedFold {
    /// Mean phase of each bin
    pub phase: Vec<f64>,
    /// Mean flux of each bin
    pub flux: Vec<f64>,
    /// Flux standard deviation of each bin
    pub flux_err: Vec<f64>,
    /// Number of samples in each bin
    pub counts: Vec<usize>,
}

impl BinnedFold {
    /// Number of bins.
    pub fn len(&self) -> usize {
        self.flux.len()
    }

    /// Whether there are no bins.
    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    /// Rows `(time, flux, flux_err)` for `cycles` consecutive periods, the
    /// bin phases of cycle `k` (1-based) mapped to `k * phase * period`.
    pub fn cycles(&self, period: f64, cycles: usize) -> Vec<(f64, f64, f64)> {
        (1..=cycles)
            .flat_map(|k| {
                (0..self.len()).map(move |b| {
                    (
                        k as f64 * self.phase[b] * period,
                        self.flux[b],
                        self.flux_err[b],
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn irregular_times(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| i as f64 * 0.0213 + 0.004 * (i as f64 * 1.7).sin())
            .collect()
    }

    #[test]
    fn test_split_ranges_remainder_last() {
        let ranges = split_ranges(10, 3, SplitPolicy::RemainderLast);
        assert_eq!(ranges, vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn test_split_ranges_balanced() {
        let ranges = split_ranges(10, 3, SplitPolicy::Balanced);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn test_split_ranges_partition() {
        for policy in [SplitPolicy::RemainderLast, SplitPolicy::Balanced] {
            for len in [100, 101, 157, 999, 1000] {
                let ranges = split_ranges(len, 100, policy);
                assert_eq!(ranges.len(), 100);
                assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), len);
                assert_eq!(ranges[0].start, 0);
                assert_eq!(ranges[99].end, len);
                assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));
            }
        }
    }

    #[test]
    fn test_phases_in_unit_interval() {
        let mut time = irregular_times(500);
        // negative times fold into [0, 1) as well
        time.extend([-3.7, -0.0001, -2.5]);
        for period in [0.37, 1.0, 2.5, 13.1] {
            let flux = vec![1.0; time.len()];
            let folded = phase_fold(&time, &flux, period).unwrap();
            assert!(folded.phase().iter().all(|&p| (0.0..1.0).contains(&p)));
            assert!(folded.phase().windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_fold_carries_flux_and_is_stable() {
        // t = 0, 1, 2 all have phase 0 for period 1; order must be kept
        let time = [0.0, 0.5, 1.0, 1.25, 2.0];
        let flux = [10.0, 20.0, 30.0, 40.0, 50.0];
        let folded = phase_fold(&time, &flux, 1.0).unwrap();
        assert_eq!(folded.phase(), &[0.0, 0.0, 0.0, 0.25, 0.5]);
        assert_eq!(folded.flux(), &[10.0, 30.0, 50.0, 40.0, 20.0]);
        assert_eq!(folded.time(), &[0.0, 1.0, 2.0, 1.25, 0.5]);
    }

    #[test]
    fn test_fold_is_idempotent() {
        let time = irregular_times(300);
        let flux: Vec<f64> = time.iter().map(|&t| (2.0 * PI * t / 0.8).sin()).collect();
        let once = phase_fold(&time, &flux, 0.8).unwrap();
        let twice = phase_fold(once.time(), once.flux(), 0.8).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fold_rejects_bad_input() {
        assert!(phase_fold(&[], &[], 1.0).is_err());
        assert!(phase_fold(&[0.0], &[1.0, 2.0], 1.0).is_err());
        assert!(phase_fold(&[0.0], &[1.0], 0.0).is_err());
        assert!(phase_fold(&[0.0], &[1.0], f64::INFINITY).is_err());
    }

    #[test]
    fn test_bin_counts_and_reconstruction() {
        let time = irregular_times(1037);
        let flux: Vec<f64> = time.iter().map(|&t| 1.0 + 0.01 * (t * 3.0).cos()).collect();
        let folded = phase_fold(&time, &flux, 1.3).unwrap();
        let binned = folded.bin(100, SplitPolicy::RemainderLast).unwrap();

        assert_eq!(binned.len(), 100);
        assert_eq!(binned.counts.iter().sum::<usize>(), 1037);
        assert_eq!(binned.counts[0], 10);
        assert_eq!(binned.counts[99], 47);

        let rebuilt: Vec<f64> = split_ranges(folded.len(), 100, SplitPolicy::RemainderLast)
            .into_iter()
            .flat_map(|r| folded.flux()[r].to_vec())
            .collect();
        assert_eq!(rebuilt, folded.flux());
    }

    #[test]
    fn test_bin_statistics() {
        let time = [0.1, 0.2, 0.3, 0.6, 0.7, 0.8];
        let flux = [1.0, 2.0, 3.0, 5.0, 5.0, 5.0];
        let folded = phase_fold(&time, &flux, 1.0).unwrap();
        let binned = folded.bin(2, SplitPolicy::RemainderLast).unwrap();

        assert!((binned.phase[0] - 0.2).abs() < 1e-12);
        assert!((binned.phase[1] - 0.7).abs() < 1e-12);
        assert_eq!(binned.flux, vec![2.0, 5.0]);
        assert!((binned.flux_err[0] - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(binned.flux_err[1], 0.0);
    }

    #[test]
    fn test_bin_needs_enough_samples() {
        let folded = phase_fold(&[0.1, 0.2], &[1.0, 1.0], 1.0).unwrap();
        assert!(matches!(
            folded.bin(3, SplitPolicy::Balanced),
            Err(Error::InsufficientData { needed: 3, got: 2 })
        ));
        assert!(matches!(
            folded.bin(0, SplitPolicy::Balanced),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_nan_std_ignores_nan() {
        assert!((nan_std(&[1.0, f64::NAN, 3.0]) - 1.0).abs() < 1e-12);
        assert!(nan_std(&[f64::NAN]).is_nan());
        assert_eq!(nan_std(&[4.0]), 0.0);
    }

    #[test]
    fn test_cycles_rows() {
        let binned = BinnedFold {
            phase: vec![0.25, 0.75],
            flux: vec![1.0, 0.9],
            flux_err: vec![0.01, 0.02],
            counts: vec![5, 5],
        };
        let rows = binned.cycles(2.0, 2);
        assert_eq!(
            rows,
            vec![
                (0.5, 1.0, 0.01),
                (1.5, 0.9, 0.02),
                (1.0, 1.0, 0.01),
                (3.0, 0.9, 0.02),
            ]
        );
    }
}
