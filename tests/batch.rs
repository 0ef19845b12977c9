//! Batch processing of lightcurve directories.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use lcfold::io::read_folded;
use lcfold::simulation::sinusoid;
use lcfold::{run_batch, BatchConfig, Lightcurve, Pipeline, PipelineConfig, RefineMode};

/// Write `lightcurve` in the input format, with every 7th row flagged bad.
fn write_input(dir: &Path, lightcurve: &Lightcurve) {
    let mut text = String::from("# time flux flux_err quality\n");
    for (i, (t, f)) in lightcurve.samples().enumerate() {
        let quality = if i % 7 == 3 { 1024 } else { 0 };
        writeln!(text, "{:.8} {:.8} 0.0001 {}", 1325.0 + t, f, quality).unwrap();
    }
    fs::write(dir.join(format!("{}.txt", lightcurve.id())), text).unwrap();
}

fn setup() -> (tempfile::TempDir, tempfile::TempDir) {
    let _ = env_logger::builder().is_test(true).try_init();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    write_input(input.path(), &sinusoid("KIC_001", 2.5, 0.01, 20.0, 30.0));
    write_input(input.path(), &sinusoid("KIC_002", 1.3, 0.01, 20.0, 30.0));
    // header only: no samples survive loading
    fs::write(input.path().join("KIC_003.txt"), "# time flux flux_err quality\n").unwrap();
    // malformed row
    fs::write(
        input.path().join("KIC_004.txt"),
        "# header\n1325.0 1.0 0.0001 0\n1325.1 oops 0.0001 0\n",
    )
    .unwrap();
    // not a lightcurve file
    fs::write(input.path().join("README.md"), "ignored").unwrap();

    (input, output)
}

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::new(RefineMode::PowerMax)).unwrap()
}

#[test]
fn test_batch_continues_after_failures() {
    let (input, output) = setup();
    let report = run_batch(&pipeline(), input.path(), output.path(), &BatchConfig::default())
        .unwrap();

    assert_eq!(report.total(), 4);
    assert!(!report.all_succeeded());

    let ids: Vec<&str> = report.succeeded.iter().map(|s| s.summary.id.as_str()).collect();
    assert_eq!(ids, vec!["KIC_001", "KIC_002"]);
    let periods: Vec<f64> = report.succeeded.iter().map(|s| s.summary.period).collect();
    assert!((periods[0] - 2.5).abs() / 2.5 < 0.01);
    assert!((periods[1] - 1.3).abs() / 1.3 < 0.01);

    let failed: Vec<String> = report
        .failed
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(failed, vec!["KIC_003.txt", "KIC_004.txt"]);
    assert!(report.failed[1].error.contains("line 3"));

    // one artifact per successful file, named by id
    let mut written: Vec<String> = fs::read_dir(output.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["KIC_001", "KIC_002"]);

    let folded = read_folded(output.path().join("KIC_001")).unwrap();
    assert_eq!(folded.n_bins, 100);
    assert_eq!(folded.rows.len(), 200);
}

#[test]
fn test_parallel_batch_matches_sequential() {
    let (input, output) = setup();
    let sequential =
        run_batch(&pipeline(), input.path(), output.path(), &BatchConfig::default()).unwrap();

    let parallel_out = tempfile::tempdir().unwrap();
    let config = BatchConfig {
        parallel: true,
        ..BatchConfig::default()
    };
    let parallel = run_batch(&pipeline(), input.path(), parallel_out.path(), &config).unwrap();

    let summaries = |r: &lcfold::BatchReport| {
        r.succeeded
            .iter()
            .map(|s| s.summary.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(summaries(&sequential), summaries(&parallel));
    assert_eq!(sequential.failed.len(), parallel.failed.len());

    let a = fs::read_to_string(output.path().join("KIC_002")).unwrap();
    let b = fs::read_to_string(parallel_out.path().join("KIC_002")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_report_serializes_to_json() {
    let (input, output) = setup();
    let report = run_batch(&pipeline(), input.path(), output.path(), &BatchConfig::default())
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["succeeded"].as_array().unwrap().len(), 2);
    assert_eq!(json["failed"].as_array().unwrap().len(), 2);
    assert_eq!(json["succeeded"][0]["summary"]["refine_mode"], "power_max");
    assert_eq!(json["succeeded"][0]["summary"]["stages"][6], "binned");
}
