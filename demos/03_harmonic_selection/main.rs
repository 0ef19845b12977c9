//! Demo 03: Harmonic Selection
//!
//! Shows how peak families at integer multiples of the orbital frequency are
//! reduced to a single fundamental, and what happens without harmonics.

use lcfold::harmonics::{guess_frequency, harmonic_counts};
use lcfold::simulation::{eclipsing_binary, EclipseShape};
use lcfold::{
    select_fundamental, CleanConfig, HarmonicConfig, HarmonicSelection, PeakConfig,
    PowerSpectrum, SpectrumConfig,
};

fn print_selection(candidates: &[f64], tolerance: f64) {
    let (sorted, counts) = harmonic_counts(candidates, tolerance);
    for (f, count) in sorted.iter().zip(counts.iter()) {
        println!("  {f:>8.4} c/d  harmonics={count}");
    }
    match select_fundamental(candidates, tolerance) {
        HarmonicSelection::Fundamental {
            frequency,
            harmonics,
        } => println!("  -> fundamental {frequency:.4} c/d ({harmonics} harmonics)"),
        HarmonicSelection::NoHarmonics => println!("  -> no harmonics"),
    }
}

fn main() {
    println!("=== Demo 03: Harmonic Selection ===\n");

    println!("--- Hand-picked candidates, tolerance 0.07 ---");
    print_selection(&[1.0, 2.003, 3.01, 9.5], 0.07);

    println!("\n--- Same candidates without a harmonic family ---");
    print_selection(&[1.0, 1.98, 2.7], 0.07);
    let guess = guess_frequency(&[0.3, 1.0, 1.98, 2.7], &HarmonicConfig::default()).unwrap();
    println!("  fallback guess (highest in band): {guess:.4} c/d");

    println!("\n--- Eclipsing binary periodogram ---");
    let shape = EclipseShape::default();
    let lc = eclipsing_binary("eb", &shape, 25.0, 30.0)
        .clean(&CleanConfig::default())
        .unwrap();
    let spectrum = PowerSpectrum::compute(&lc, &SpectrumConfig::default()).unwrap();
    let peaks = spectrum
        .find_peaks(&PeakConfig::coarse(
            spectrum.len(),
            lc.len(),
            spectrum.max_power(),
        ))
        .unwrap();
    let candidates = spectrum.peak_frequencies(&peaks);
    println!(
        "  orbital frequency {:.4} c/d, strongest peak {:.4} c/d",
        1.0 / shape.period,
        spectrum.peak_frequency().unwrap_or(f64::NAN)
    );
    print_selection(&candidates, 0.07);

    match guess_frequency(&candidates, &HarmonicConfig::default()) {
        Ok(f) => println!("  guessed period: {:.4} d (true {:.4} d)", 1.0 / f, shape.period),
        Err(e) => println!("  no guess: {e}"),
    }
}
