//! Harmonic-aware choice of the fundamental frequency.
//!
//! Periodogram peaks of non-sinusoidal signals (eclipses, pulsations) come in
//! families at integer multiples of the true frequency, and the strongest
//! member is often a harmonic. The selector prefers the lowest candidate
//! with the largest number of larger candidates sitting near its multiples.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings for harmonic selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonicConfig {
    /// Maximum fractional remainder `(b mod a) / a` counted as a multiple
    pub tolerance: f64,
    /// Candidates must lie strictly above this frequency (cycles/day)
    pub f_min: f64,
    /// Candidates must lie strictly below this frequency (cycles/day)
    pub f_max: f64,
}

impl Default for HarmonicConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.07,
            // 10 day period
            f_min: 0.1,
            // 4 hour period
            f_max: 6.0,
        }
    }
}

/// Outcome of [`select_fundamental`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HarmonicSelection {
    /// Candidate with the most harmonics among the larger candidates
    Fundamental { frequency: f64, harmonics: usize },
    /// No candidate has a single harmonic
    NoHarmonics,
}

/// Count, for each candidate except the largest, the larger candidates that
/// fall within `tolerance` above an integer multiple of it.
///
/// Candidates are sorted ascending first; the returned counts follow that
/// order. The remainder test is one-sided: a candidate just below a multiple
/// (remainder close to `a`) is not counted.
pub fn harmonic_counts(frequencies: &[f64], tolerance: f64) -> (Vec<f64>, Vec<usize>) {
    let mut sorted = frequencies.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let counts = sorted
        .iter()
        .enumerate()
        .take(sorted.len().saturating_sub(1))
        .map(|(i, &a)| {
            sorted[i + 1..]
                .iter()
                .filter(|&&b| (b % a) / a < tolerance)
                .count()
        })
        .collect();

    (sorted, counts)
}

/// Pick the candidate frequency with the most harmonics.
///
/// Ties go to the lowest frequency. Fewer than two candidates, or no
/// harmonic at all, gives [`HarmonicSelection::NoHarmonics`].
///
/// # Example
/// ```rust
/// use lcfold::harmonics::{select_fundamental, HarmonicSelection};
///
/// let selection = select_fundamental(&[9.5, 3.01, 1.0, 2.003], 0.07);
/// assert_eq!(
///     selection,
///     HarmonicSelection::Fundamental { frequency: 1.0, harmonics: 2 }
/// );
/// ```
pub fn select_fundamental(frequencies: &[f64], tolerance: f64) -> HarmonicSelection {
    let (sorted, counts) = harmonic_counts(frequencies, tolerance);

    let mut best: Option<(usize, usize)> = None;
    for (i, &count) in counts.iter().enumerate() {
        match best {
            Some((_, c)) if count <= c => {}
            _ => best = Some((i, count)),
        }
    }

    match best {
        Some((i, harmonics)) if harmonics > 0 => HarmonicSelection::Fundamental {
            frequency: sorted[i],
            harmonics,
        },
        _ => HarmonicSelection::NoHarmonics,
    }
}

/// Candidates strictly inside `(f_min, f_max)`, order preserved.
pub fn band_filter(frequencies: &[f64], config: &HarmonicConfig) -> Vec<f64> {
    frequencies
        .iter()
        .copied()
        .filter(|&f| f > config.f_min && f < config.f_max)
        .collect()
}

/// Coarse frequency guess from peak frequencies (ascending, as returned by
/// the peak detector).
///
/// Band-filters the candidates and runs [`select_fundamental`]; without
/// harmonics the highest remaining candidate is used.
///
/// # Errors
/// [`Error::NoPeriodFound`] when no candidate lies inside the band.
pub fn guess_frequency(candidates: &[f64], config: &HarmonicConfig) -> Result<f64> {
    let in_band = band_filter(candidates, config);
    let Some(&last) = in_band.last() else {
        return Err(Error::NoPeriodFound(format!(
            "none of {} peak frequencies lies in ({}, {}) cycles/day",
            candidates.len(),
            config.f_min,
            config.f_max
        )));
    };

    match select_fundamental(&in_band, config.tolerance) {
        HarmonicSelection::Fundamental {
            frequency,
            harmonics,
        } => {
            log::debug!("found {harmonics} harmonics of {frequency:.6} c/d");
            Ok(frequency)
        }
        HarmonicSelection::NoHarmonics => {
            log::debug!(
                "no harmonics among {} candidates, using {last:.6} c/d",
                in_band.len()
            );
            Ok(last)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_fundamental_with_most_harmonics() {
        let selection = select_fundamental(&[1.0, 2.003, 3.01, 9.5], 0.07);
        assert_eq!(
            selection,
            HarmonicSelection::Fundamental {
                frequency: 1.0,
                harmonics: 2
            }
        );
    }

    #[test]
    fn test_counts_follow_sorted_order() {
        let (sorted, counts) = harmonic_counts(&[9.5, 3.01, 1.0, 2.003], 0.07);
        assert_eq!(sorted, vec![1.0, 2.003, 3.01, 9.5]);
        assert_eq!(counts, vec![2, 0, 0]);
    }

    #[test]
    fn test_wider_tolerance_counts_more() {
        let (_, counts) = harmonic_counts(&[1.0, 1.41, 2.0], 0.5);
        assert_eq!(counts[0], 2);
        assert_eq!(
            select_fundamental(&[1.0, 1.41, 2.0], 0.5),
            HarmonicSelection::Fundamental {
                frequency: 1.0,
                harmonics: 2
            }
        );
    }

    #[test]
    fn test_remainder_check_is_one_sided() {
        // 1.98 is just below 2 * 1.0: remainder 0.98 is not counted
        let selection = select_fundamental(&[1.0, 1.98], 0.07);
        assert_eq!(selection, HarmonicSelection::NoHarmonics);
    }

    #[test]
    fn test_ties_prefer_lowest_frequency() {
        // 0.7 (-> 1.4) and 2.3 (-> 4.6) both have one harmonic
        let selection = select_fundamental(&[0.7, 1.4, 2.3, 4.6], 0.07);
        assert_eq!(
            selection,
            HarmonicSelection::Fundamental {
                frequency: 0.7,
                harmonics: 1
            }
        );
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(select_fundamental(&[], 0.07), HarmonicSelection::NoHarmonics);
        assert_eq!(
            select_fundamental(&[2.0], 0.07),
            HarmonicSelection::NoHarmonics
        );
        assert_eq!(
            select_fundamental(&[1.0, 1.5], 0.07),
            HarmonicSelection::NoHarmonics
        );
    }

    #[test]
    fn test_band_filter_is_strict() {
        let config = HarmonicConfig::default();
        let kept = band_filter(&[0.05, 0.1, 0.3, 5.9, 6.0, 7.0], &config);
        assert_eq!(kept, vec![0.3, 5.9]);
    }

    #[test]
    fn test_guess_frequency_uses_harmonics() {
        let config = HarmonicConfig::default();
        let f = guess_frequency(&[0.05, 0.4, 0.8, 1.2, 10.0], &config).unwrap();
        assert_eq!(f, 0.4);
    }

    #[test]
    fn test_guess_frequency_falls_back_to_highest_candidate() {
        let config = HarmonicConfig::default();
        let f = guess_frequency(&[0.3, 0.45, 1.1], &config).unwrap();
        assert_eq!(f, 1.1);

        let single = guess_frequency(&[0.4], &config).unwrap();
        assert_eq!(single, 0.4);
    }

    #[test]
    fn test_guess_frequency_without_candidates() {
        let config = HarmonicConfig::default();
        assert!(matches!(
            guess_frequency(&[], &config),
            Err(Error::NoPeriodFound(_))
        ));
        assert!(matches!(
            guess_frequency(&[0.01, 12.0], &config),
            Err(Error::NoPeriodFound(_))
        ));
    }
}
