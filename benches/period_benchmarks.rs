//! Benchmarks for period search and folding
//!
//! Covers:
//! - Lomb-Scargle on the default coarse grid
//! - The three refinement objectives
//! - Peak detection on a coarse spectrum
//! - Phase folding and binning

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lcfold::simulation::{add_noise, sinusoid};
use lcfold::spectrum::{lomb_scargle, FrequencyGrid};
use lcfold::{
    phase_fold, refine_period, Lightcurve, Normalization, PeakConfig, PowerSpectrum,
    RefineConfig, RefineMode, SpectrumConfig, SplitPolicy,
};

/// Noisy sinusoid observed for `days` at 30-minute cadence
fn generate_lightcurve(days: f64, period: f64) -> Lightcurve {
    let lc = sinusoid("bench", period, 0.01, days, 30.0);
    add_noise(&lc, 0.002, Some(1)).unwrap()
}

/// Benchmark Lomb-Scargle on the default grid for different spans
fn bench_lomb_scargle(c: &mut Criterion) {
    let mut group = c.benchmark_group("LombScargle");
    group.sample_size(10);

    for days in [5.0, 10.0, 20.0].iter() {
        let lc = generate_lightcurve(*days, 2.5);
        let grid = FrequencyGrid::for_lightcurve(lc.time(), &SpectrumConfig::default()).unwrap();

        group.bench_with_input(BenchmarkId::new("default_grid", days), days, |b, _| {
            b.iter(|| {
                lomb_scargle(
                    black_box(lc.time()),
                    black_box(lc.flux()),
                    black_box(grid.as_slice()),
                    Normalization::Standard,
                )
            })
        });
    }

    group.finish();
}

/// Compare the refinement objectives on the same lightcurve
fn bench_refinement(c: &mut Criterion) {
    let mut group = c.benchmark_group("Refinement");
    group.sample_size(10);

    let lc = generate_lightcurve(20.0, 2.5);
    let config = RefineConfig::default();

    for mode in RefineMode::ALL {
        group.bench_function(mode.name(), |b| {
            b.iter(|| refine_period(black_box(&lc), 2.45, mode, &config))
        });
    }

    group.finish();
}

/// Benchmark peak detection on a coarse spectrum
fn bench_peaks(c: &mut Criterion) {
    let mut group = c.benchmark_group("Peaks");

    let lc = generate_lightcurve(20.0, 2.5);
    let spectrum = PowerSpectrum::compute(&lc, &SpectrumConfig::default()).unwrap();
    let config = PeakConfig::coarse(spectrum.len(), lc.len(), spectrum.max_power());

    group.bench_function("coarse", |b| {
        b.iter(|| spectrum.find_peaks(black_box(&config)))
    });
    group.bench_function("unconstrained", |b| {
        b.iter(|| spectrum.find_peaks(black_box(&PeakConfig::default())))
    });

    group.finish();
}

/// Benchmark folding and binning
fn bench_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fold");

    for days in [20.0, 80.0].iter() {
        let lc = generate_lightcurve(*days, 2.5);

        group.bench_with_input(BenchmarkId::new("fold_and_bin", days), days, |b, _| {
            b.iter(|| {
                phase_fold(black_box(lc.time()), black_box(lc.flux()), 2.5)
                    .and_then(|f| f.bin(100, SplitPolicy::RemainderLast))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lomb_scargle,
    bench_refinement,
    bench_peaks,
    bench_fold
);
criterion_main!(benches);
