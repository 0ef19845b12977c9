//! Demo 01: Period Search
//!
//! Runs the full pipeline on a noisy synthetic sinusoid and prints each
//! stage: cleaning, the coarse spectrum, detected peaks, the harmonic-aware
//! guess and the refined period.

use lcfold::simulation::{add_noise, insert_gap, sinusoid};
use lcfold::{Pipeline, PipelineConfig, RefineMode};

fn main() {
    println!("=== Demo 01: Period Search ===\n");

    let true_period = 2.5;
    let lc = sinusoid("demo", true_period, 0.01, 20.0, 30.0);
    let lc = insert_gap(&lc, 9.0, 11.0);
    let lc = add_noise(&lc, 0.003, Some(42)).unwrap();
    println!(
        "Synthetic lightcurve: {} samples over {:.2} days, true period {true_period} d",
        lc.len(),
        lc.span()
    );

    let config = PipelineConfig::new(RefineMode::PowerMax);
    let pipeline = Pipeline::new(config).unwrap();
    let result = pipeline.run(&lc).unwrap();

    println!("\n--- Cleaning ---");
    println!(
        "  {} -> {} samples (first 0.25 d and the last sample before the gap dropped)",
        result.raw_samples,
        result.cleaned.len()
    );

    if let Some(search) = &result.search {
        println!("\n--- Coarse spectrum ---");
        let freqs = search.spectrum.frequencies();
        println!(
            "  {} frequencies in [{:.4}, {:.4}] c/d, max power {:.4}",
            freqs.len(),
            freqs[0],
            freqs[freqs.len() - 1],
            search.spectrum.max_power()
        );

        println!("\n--- Peaks ---");
        for peak in &search.peaks.peaks {
            println!(
                "  f={:.4} c/d  P={:.4} d  power={:.4}  prominence={:.4}",
                freqs[peak.index],
                1.0 / freqs[peak.index],
                peak.height,
                peak.prominence
            );
        }

        println!("\n--- Guess ---");
        println!("  coarse period: {:.6} d", search.period());
    }

    if let Some(refinement) = &result.refinement {
        println!("\n--- Refinement ({}) ---", refinement.mode.name());
        println!(
            "  period: {:.6} d (error {:.4}%)",
            refinement.period,
            100.0 * (refinement.period - true_period).abs() / true_period
        );
    }

    println!("\n--- Binned fold ---");
    for k in (0..result.binned.len()).step_by(10) {
        println!(
            "  phase={:.3}  flux={:.5} ± {:.5}",
            result.binned.phase[k], result.binned.flux[k], result.binned.flux_err[k]
        );
    }
}
